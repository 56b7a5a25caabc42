use serde::{Deserialize, Serialize};

use crate::utils::error::{GrabError, Result};

pub const NOT_AVAILABLE: &str = "N/A";

/// Supported extraction platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Platform {
    Talkwalker,
    Newswhip,
    GoogleNews,
}

impl Platform {
    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Talkwalker => "Talkwalker",
            Platform::Newswhip => "Newswhip",
            Platform::GoogleNews => "Google News",
        }
    }

    /// Parses the display name used in combined exports.
    pub fn from_display_name(name: &str) -> Option<Platform> {
        match name {
            "Talkwalker" => Some(Platform::Talkwalker),
            "Newswhip" => Some(Platform::Newswhip),
            "Google News" => Some(Platform::GoogleNews),
            _ => None,
        }
    }

    /// Detects the source platform from an export filename.
    ///
    /// Talkwalker exports are named either `talkwalker_*` (renamed by this
    /// tool) or `export*` (raw platform download); Google News exports start
    /// with `googlenews`. Everything else is treated as a Newswhip export.
    pub fn from_filename(name: &str) -> Platform {
        let lower = name.to_lowercase();
        if lower.starts_with("talkwalker") || lower.starts_with("export") {
            Platform::Talkwalker
        } else if lower.starts_with("googlenews") {
            Platform::GoogleNews
        } else {
            Platform::Newswhip
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A raw Google News search result row, before normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawArticle {
    pub link: String,
    pub title: String,
    pub snippet: String,
    pub date: String,
    pub source: String,
    #[serde(default)]
    pub search_keyword: String,
}

/// The normalized article schema shared by aggregation and search.
///
/// Fields a platform does not provide are filled with `"N/A"`, matching the
/// combined-export column contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub url: String,
    pub platform: Platform,
    pub source: String,
    pub sentiment: String,
    pub language: String,
    pub country: String,
    pub source_type: String,
    pub published_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_keyword: Option<String>,
    /// Snippet text, kept when present for semantic scoring.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

impl Article {
    pub fn new(title: impl Into<String>, url: impl Into<String>, platform: Platform) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            platform,
            source: NOT_AVAILABLE.to_string(),
            sentiment: NOT_AVAILABLE.to_string(),
            language: NOT_AVAILABLE.to_string(),
            country: NOT_AVAILABLE.to_string(),
            source_type: NOT_AVAILABLE.to_string(),
            published_date: NOT_AVAILABLE.to_string(),
            search_keyword: None,
            snippet: None,
        }
    }
}

/// An article annotated with relevance scores (0-100 scale).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredArticle {
    #[serde(flatten)]
    pub article: Article,
    pub keyword_score: f64,
    pub semantic_score: f64,
    pub relevance_score: f64,
}

/// A Talkwalker project, category or topic entry (1-based UI index).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub id: usize,
    pub name: String,
}

/// Talkwalker time filter periods with their widget data ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TalkwalkerPeriod {
    OneDay,
    SevenDays,
    ThirtyDays,
    ThreeMonths,
    SixMonths,
    OneYear,
}

impl TalkwalkerPeriod {
    /// Parses the "1".."6" menu choice used by the extraction workflow.
    pub fn from_choice(choice: &str) -> Result<Self> {
        match choice {
            "1" => Ok(TalkwalkerPeriod::OneDay),
            "2" => Ok(TalkwalkerPeriod::SevenDays),
            "3" => Ok(TalkwalkerPeriod::ThirtyDays),
            "4" => Ok(TalkwalkerPeriod::ThreeMonths),
            "5" => Ok(TalkwalkerPeriod::SixMonths),
            "6" => Ok(TalkwalkerPeriod::OneYear),
            other => Err(GrabError::InvalidConfigValueError {
                field: "time_choice".to_string(),
                value: other.to_string(),
                reason: "Expected a choice between 1 and 6".to_string(),
            }),
        }
    }

    pub fn data_id(&self) -> &'static str {
        match self {
            TalkwalkerPeriod::OneDay => "d1",
            TalkwalkerPeriod::SevenDays => "d7",
            TalkwalkerPeriod::ThirtyDays => "d30",
            TalkwalkerPeriod::ThreeMonths => "m3",
            TalkwalkerPeriod::SixMonths => "m6",
            TalkwalkerPeriod::OneYear => "y1",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TalkwalkerPeriod::OneDay => "1D",
            TalkwalkerPeriod::SevenDays => "7D",
            TalkwalkerPeriod::ThirtyDays => "30D",
            TalkwalkerPeriod::ThreeMonths => "3M",
            TalkwalkerPeriod::SixMonths => "6M",
            TalkwalkerPeriod::OneYear => "1Y",
        }
    }

    /// Periods that may be directly visible outside the "More" dropdown.
    pub fn usually_visible(&self) -> bool {
        matches!(self, TalkwalkerPeriod::OneDay | TalkwalkerPeriod::SevenDays)
    }
}

/// Newswhip relative date-range choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NewswhipPeriod {
    Last24Hours,
    Last7Days,
    Last1Month,
    FullYear,
}

impl NewswhipPeriod {
    pub fn from_choice(choice: &str) -> Result<Self> {
        match choice {
            "1" => Ok(NewswhipPeriod::Last24Hours),
            "2" => Ok(NewswhipPeriod::Last7Days),
            "3" => Ok(NewswhipPeriod::Last1Month),
            "4" => Ok(NewswhipPeriod::FullYear),
            other => Err(GrabError::InvalidConfigValueError {
                field: "time_choice".to_string(),
                value: other.to_string(),
                reason: "Expected a choice between 1 and 4".to_string(),
            }),
        }
    }

    /// Prefix of the radio label's `for` attribute in the date picker.
    pub fn label_prefix(&self) -> &'static str {
        match self {
            NewswhipPeriod::Last24Hours => "relative-time-hours-",
            NewswhipPeriod::Last7Days => "relative-time-days-",
            NewswhipPeriod::Last1Month => "relative-time-months-",
            NewswhipPeriod::FullYear => "full-year-",
        }
    }

    pub fn filename_token(&self) -> &'static str {
        match self {
            NewswhipPeriod::Last24Hours => "24hours",
            NewswhipPeriod::Last7Days => "7days",
            NewswhipPeriod::Last1Month => "1month",
            NewswhipPeriod::FullYear => "fullyear",
        }
    }
}

/// Google News `qdr:` time filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GooglePeriod {
    #[serde(rename = "h")]
    PastHour,
    #[serde(rename = "d")]
    PastDay,
    #[serde(rename = "w")]
    PastWeek,
    #[serde(rename = "m")]
    PastMonth,
    #[serde(rename = "y")]
    PastYear,
}

impl GooglePeriod {
    pub fn code(&self) -> &'static str {
        match self {
            GooglePeriod::PastHour => "h",
            GooglePeriod::PastDay => "d",
            GooglePeriod::PastWeek => "w",
            GooglePeriod::PastMonth => "m",
            GooglePeriod::PastYear => "y",
        }
    }

    pub fn filename_token(&self) -> &'static str {
        match self {
            GooglePeriod::PastHour => "past_hour",
            GooglePeriod::PastDay => "past_day",
            GooglePeriod::PastWeek => "past_week",
            GooglePeriod::PastMonth => "past_month",
            GooglePeriod::PastYear => "past_year",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "h" => Some(GooglePeriod::PastHour),
            "d" => Some(GooglePeriod::PastDay),
            "w" => Some(GooglePeriod::PastWeek),
            "m" => Some(GooglePeriod::PastMonth),
            "y" => Some(GooglePeriod::PastYear),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Relevance,
    Recency,
}

impl SortBy {
    pub fn filename_suffix(&self) -> &'static str {
        match self {
            SortBy::Relevance => "_relevance",
            SortBy::Recency => "_recency",
        }
    }
}

/// How many of the top scored results to keep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "value", rename_all = "lowercase")]
pub enum Selection {
    Number(usize),
    Percentage(f64),
}

/// Parameters of a Google News extraction run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsQuery {
    pub keywords: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub geos: Vec<String>,
    #[serde(default)]
    pub time_period: Option<GooglePeriod>,
    #[serde(default)]
    pub sort_by: SortBy,
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
}

fn default_max_pages() -> usize {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_detection_from_filename() {
        assert_eq!(
            Platform::from_filename("talkwalker_Proj_Cat_Topic_d7_20250101_120000.csv"),
            Platform::Talkwalker
        );
        assert_eq!(
            Platform::from_filename("Export-2025-05-07.csv"),
            Platform::Talkwalker
        );
        assert_eq!(
            Platform::from_filename("googlenews_anonymous_past_day_rust_20250101.xlsx"),
            Platform::GoogleNews
        );
        assert_eq!(
            Platform::from_filename("spike_download.csv"),
            Platform::Newswhip
        );
    }

    #[test]
    fn test_talkwalker_period_mapping() {
        let period = TalkwalkerPeriod::from_choice("2").unwrap();
        assert_eq!(period.data_id(), "d7");
        assert_eq!(period.label(), "7D");
        assert!(period.usually_visible());

        let period = TalkwalkerPeriod::from_choice("6").unwrap();
        assert_eq!(period.data_id(), "y1");
        assert!(!period.usually_visible());

        assert!(TalkwalkerPeriod::from_choice("7").is_err());
        assert!(TalkwalkerPeriod::from_choice("0").is_err());
    }

    #[test]
    fn test_newswhip_period_mapping() {
        let period = NewswhipPeriod::from_choice("4").unwrap();
        assert_eq!(period.label_prefix(), "full-year-");
        assert_eq!(period.filename_token(), "fullyear");
        assert!(NewswhipPeriod::from_choice("5").is_err());
    }

    #[test]
    fn test_google_period_codes() {
        assert_eq!(GooglePeriod::PastWeek.code(), "w");
        assert_eq!(GooglePeriod::from_code("m"), Some(GooglePeriod::PastMonth));
        assert_eq!(GooglePeriod::from_code("x"), None);
        assert_eq!(GooglePeriod::PastHour.filename_token(), "past_hour");
    }

    #[test]
    fn test_article_defaults_to_not_available() {
        let article = Article::new("Title", "https://example.com", Platform::Newswhip);
        assert_eq!(article.sentiment, NOT_AVAILABLE);
        assert_eq!(article.country, NOT_AVAILABLE);
        assert_eq!(article.published_date, NOT_AVAILABLE);
    }
}
