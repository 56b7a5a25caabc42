use std::path::{Path, PathBuf};

use chrono::Local;
use rust_xlsxwriter::Workbook;
use serde::{Deserialize, Serialize};

use crate::domain::model::{
    Article, GooglePeriod, RawArticle, ScoredArticle, SortBy, NOT_AVAILABLE,
};
use crate::utils::error::{GrabError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Xlsx,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Xlsx => "xlsx",
        }
    }
}

/// Columns of the combined (aggregated) export.
const ARTICLE_COLUMNS: &[&str] = &[
    "Title",
    "URL",
    "Platform",
    "Source",
    "Sentiment",
    "Language",
    "Country",
    "Source_Type",
    "Published_Date",
    "Search_Keyword",
];

/// Columns of the scored search export; score first so spreadsheets sort
/// naturally, breakdown columns last.
const SCORED_COLUMNS: &[&str] = &[
    "Relevance_Score",
    "Title",
    "Platform",
    "Source",
    "Published_Date",
    "URL",
    "Country",
    "Language",
    "Sentiment",
    "Source_Type",
    "Search_Keyword",
    "Keyword_Score",
    "Semantic_Score",
];

/// Columns of the raw Google News export.
const RAW_COLUMNS: &[&str] = &["search_keyword", "title", "link", "source", "date", "snippet"];

pub fn timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Replaces spaces and path separators so platform names survive as
/// filename components.
pub fn sanitize_component(value: &str) -> String {
    value.replace([' ', '/', '\\'], "_")
}

/// Reduces a free-text query to a filename-safe token of at most 50 chars.
pub fn sanitize_query(query: &str) -> String {
    let cleaned: String = query
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    let joined = cleaned.split_whitespace().collect::<Vec<_>>().join("_");
    joined.chars().take(50).collect()
}

pub fn google_news_filename(
    user: &str,
    period: Option<GooglePeriod>,
    keywords: &[String],
    sort_by: SortBy,
) -> String {
    let period_token = period.map(|p| p.filename_token()).unwrap_or("custom_time");

    let mut keyword_token = keywords
        .iter()
        .take(2)
        .map(|kw| sanitize_component(kw))
        .collect::<Vec<_>>()
        .join("_");
    if keywords.len() > 2 {
        keyword_token.push_str("_etc");
    }

    format!(
        "googlenews_{}_{}_{}{}_{}.xlsx",
        user,
        period_token,
        keyword_token,
        sort_by.filename_suffix(),
        timestamp()
    )
}

pub fn combined_filename(format: OutputFormat) -> String {
    format!("combined_news_data_{}.{}", timestamp(), format.extension())
}

pub fn search_filename(query: &str, format: OutputFormat) -> String {
    format!(
        "intelligent_search_{}_{}.{}",
        sanitize_query(query),
        timestamp(),
        format.extension()
    )
}

fn article_row(article: &Article) -> Vec<String> {
    vec![
        article.title.clone(),
        article.url.clone(),
        article.platform.display_name().to_string(),
        article.source.clone(),
        article.sentiment.clone(),
        article.language.clone(),
        article.country.clone(),
        article.source_type.clone(),
        article.published_date.clone(),
        article
            .search_keyword
            .clone()
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
    ]
}

fn scored_row(scored: &ScoredArticle) -> Vec<String> {
    let a = &scored.article;
    vec![
        format!("{:.2}", scored.relevance_score),
        a.title.clone(),
        a.platform.display_name().to_string(),
        a.source.clone(),
        a.published_date.clone(),
        a.url.clone(),
        a.country.clone(),
        a.language.clone(),
        a.sentiment.clone(),
        a.source_type.clone(),
        a.search_keyword
            .clone()
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        format!("{:.2}", scored.keyword_score),
        format!("{:.2}", scored.semantic_score),
    ]
}

fn raw_row(raw: &RawArticle) -> Vec<String> {
    vec![
        raw.search_keyword.clone(),
        raw.title.clone(),
        raw.link.clone(),
        raw.source.clone(),
        raw.date.clone(),
        raw.snippet.clone(),
    ]
}

fn csv_bytes(columns: &[&str], rows: Vec<Vec<String>>) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(columns)?;
    for row in rows {
        writer.write_record(&row)?;
    }
    writer
        .into_inner()
        .map_err(|e| GrabError::export(format!("CSV buffer flush failed: {}", e)))
}

fn xlsx_bytes(columns: &[&str], rows: Vec<Vec<String>>) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (col, name) in columns.iter().enumerate() {
        worksheet.write_string(0, col as u16, *name)?;
    }
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet.write_string(row_idx as u32 + 1, col_idx as u16, value)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

fn format_bytes(
    columns: &[&str],
    rows: Vec<Vec<String>>,
    format: OutputFormat,
) -> Result<Vec<u8>> {
    match format {
        OutputFormat::Csv => csv_bytes(columns, rows),
        OutputFormat::Xlsx => xlsx_bytes(columns, rows),
    }
}

pub fn articles_bytes(articles: &[Article], format: OutputFormat) -> Result<Vec<u8>> {
    format_bytes(ARTICLE_COLUMNS, articles.iter().map(article_row).collect(), format)
}

pub fn scored_bytes(scored: &[ScoredArticle], format: OutputFormat) -> Result<Vec<u8>> {
    format_bytes(SCORED_COLUMNS, scored.iter().map(scored_row).collect(), format)
}

pub fn raw_articles_bytes(articles: &[RawArticle]) -> Result<Vec<u8>> {
    xlsx_bytes(RAW_COLUMNS, articles.iter().map(raw_row).collect())
}

pub fn write_articles(path: &Path, articles: &[Article], format: OutputFormat) -> Result<()> {
    Ok(std::fs::write(path, articles_bytes(articles, format)?)?)
}

pub fn write_scored(path: &Path, scored: &[ScoredArticle], format: OutputFormat) -> Result<()> {
    Ok(std::fs::write(path, scored_bytes(scored, format)?)?)
}

pub fn write_raw_articles(path: &Path, articles: &[RawArticle]) -> Result<()> {
    Ok(std::fs::write(path, raw_articles_bytes(articles)?)?)
}

/// Finds the most recently modified CSV in a directory. The WebDriver
/// platforms download under a generated name, so exports are located by
/// recency and then renamed.
pub fn latest_csv_in(dir: &Path) -> Result<PathBuf> {
    let mut newest: Option<(std::time::SystemTime, PathBuf)> = None;

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("csv") {
            continue;
        }
        let modified = entry.metadata()?.modified()?;
        match &newest {
            Some((ts, _)) if *ts >= modified => {}
            _ => newest = Some((modified, path)),
        }
    }

    newest
        .map(|(_, path)| path)
        .ok_or_else(|| GrabError::export("No CSV file was downloaded"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Platform;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_component() {
        assert_eq!(sanitize_component("My Project/Name"), "My_Project_Name");
        assert_eq!(sanitize_component("plain"), "plain");
    }

    #[test]
    fn test_sanitize_query() {
        assert_eq!(sanitize_query("climate change: 2025!"), "climate_change_2025");
        let long = "word ".repeat(30);
        assert!(sanitize_query(&long).len() <= 50);
    }

    #[test]
    fn test_google_news_filename_shape() {
        let name = google_news_filename(
            "anonymous",
            Some(GooglePeriod::PastDay),
            &["rust lang".to_string(), "tokio".to_string(), "actix".to_string()],
            SortBy::Recency,
        );
        assert!(name.starts_with("googlenews_anonymous_past_day_rust_lang_tokio_etc_recency_"));
        assert!(name.ends_with(".xlsx"));
    }

    #[test]
    fn test_google_news_filename_without_period() {
        let name =
            google_news_filename("anonymous", None, &["rust".to_string()], SortBy::Relevance);
        assert!(name.contains("_custom_time_"));
        assert!(name.contains("_relevance_"));
    }

    #[test]
    fn test_write_articles_csv_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("combined.csv");

        let mut article = Article::new("A Title", "https://example.com", Platform::GoogleNews);
        article.search_keyword = Some("rust".to_string());
        write_articles(&path, &[article], OutputFormat::Csv).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Title,URL,Platform,Source,Sentiment,Language,Country,Source_Type,Published_Date,Search_Keyword"
        );
        let row = lines.next().unwrap();
        assert!(row.contains("A Title"));
        assert!(row.contains("Google News"));
        assert!(row.contains("rust"));
    }

    #[test]
    fn test_latest_csv_in_picks_newest() {
        let dir = TempDir::new().unwrap();

        let old = dir.path().join("old.csv");
        std::fs::File::create(&old).unwrap().write_all(b"a").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(20));
        let new = dir.path().join("new.csv");
        std::fs::File::create(&new).unwrap().write_all(b"b").unwrap();
        // Non-CSV files are ignored even when newer.
        std::thread::sleep(std::time::Duration::from_millis(20));
        let txt = dir.path().join("ignored.txt");
        std::fs::File::create(&txt).unwrap().write_all(b"c").unwrap();

        let latest = latest_csv_in(dir.path()).unwrap();
        assert_eq!(latest, new);
    }

    #[test]
    fn test_latest_csv_in_empty_dir_errors() {
        let dir = TempDir::new().unwrap();
        assert!(latest_csv_in(dir.path()).is_err());
    }
}
