use std::collections::HashMap;
use std::path::Path;

use calamine::{open_workbook, Reader, Xlsx};
use serde::Serialize;

use crate::core::dates::standardize_date;
use crate::domain::model::{Article, Platform, NOT_AVAILABLE};
use crate::utils::error::{GrabError, Result};

/// One row of a platform export, keyed by header name.
pub type Row = HashMap<String, String>;

/// Reads an export file into rows; the format is decided by extension.
pub fn read_rows(path: &Path) -> Result<Vec<Row>> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("csv") => read_csv_rows(path),
        Some("xlsx") => read_xlsx_rows(path),
        other => Err(GrabError::InvalidConfigValueError {
            field: "input_file".to_string(),
            value: path.display().to_string(),
            reason: format!(
                "Unsupported file extension: {}. Allowed extensions: csv, xlsx",
                other.unwrap_or("none")
            ),
        }),
    }
}

fn read_csv_rows(path: &Path) -> Result<Vec<Row>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.clone(), v.to_string()))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

fn read_xlsx_rows(path: &Path) -> Result<Vec<Row>> {
    let mut workbook: Xlsx<_> = open_workbook(path).map_err(GrabError::SpreadsheetReadError)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| GrabError::export(format!("{} has no worksheets", path.display())))??;

    let mut iter = range.rows();
    let headers: Vec<String> = match iter.next() {
        Some(header_row) => header_row.iter().map(|c| c.to_string()).collect(),
        None => return Ok(Vec::new()),
    };

    let rows = iter
        .map(|cells| {
            headers
                .iter()
                .zip(cells.iter())
                .map(|(h, c)| (h.clone(), c.to_string()))
                .collect()
        })
        .collect();
    Ok(rows)
}

fn first_of(row: &Row, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| row.get(*key))
        .map(|v| v.trim())
        .find(|v| !v.is_empty())
        .map(|v| v.to_string())
}

fn or_na(value: Option<String>) -> String {
    value.unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Maps one export row into the normalized article schema, using each
/// platform's column names and fallback chains.
pub fn normalize_row(platform: Platform, row: &Row) -> Article {
    match platform {
        Platform::Talkwalker => {
            let mut article = Article::new(
                or_na(first_of(row, &["title", "title_snippet"])),
                or_na(first_of(row, &["url"])),
                platform,
            );
            article.source =
                first_of(row, &["domain_url"]).unwrap_or_else(|| "Talkwalker".to_string());
            article.sentiment = or_na(first_of(row, &["sentiment"]));
            article.language = or_na(first_of(row, &["lang"]));
            article.country = or_na(first_of(
                row,
                &[
                    "extra_source_attributes.world_data.country",
                    "extra_author_attributes.world_data.country",
                    "extra_article_attributes.world_data.country",
                ],
            ));
            article.source_type = or_na(first_of(row, &["source_type"]));
            article.published_date = first_of(row, &["published", "indexed"])
                .map(|d| standardize_date(&d))
                .unwrap_or_else(|| NOT_AVAILABLE.to_string());
            article
        }
        Platform::Newswhip => {
            let mut article = Article::new(
                or_na(first_of(row, &["Headline"])),
                or_na(first_of(row, &["Link"])),
                platform,
            );
            article.source =
                first_of(row, &["Domain"]).unwrap_or_else(|| "Newswhip".to_string());
            article.country = or_na(first_of(row, &["Country"]));
            article.source_type = "News".to_string();
            article.published_date = first_of(row, &["Published"])
                .map(|d| standardize_date(&d))
                .unwrap_or_else(|| NOT_AVAILABLE.to_string());
            article
        }
        Platform::GoogleNews => {
            let mut article = Article::new(
                or_na(first_of(row, &["title"])),
                or_na(first_of(row, &["link"])),
                platform,
            );
            article.source =
                first_of(row, &["source"]).unwrap_or_else(|| "Google News".to_string());
            article.source_type = "News".to_string();
            article.published_date = first_of(row, &["date"])
                .map(|d| standardize_date(&d))
                .unwrap_or_else(|| NOT_AVAILABLE.to_string());
            article.search_keyword = first_of(row, &["search_keyword"]);
            article.snippet = first_of(row, &["snippet"]);
            article
        }
    }
}

pub fn normalize(platform: Platform, rows: &[Row]) -> Vec<Article> {
    rows.iter().map(|row| normalize_row(platform, row)).collect()
}

/// Reads a previously combined export back into articles, for scoring runs
/// that start from a file instead of an in-memory aggregate.
pub fn read_articles(path: &Path) -> Result<Vec<Article>> {
    let rows = read_rows(path)?;
    let articles = rows
        .iter()
        .map(|row| {
            let platform = first_of(row, &["Platform"])
                .and_then(|name| Platform::from_display_name(&name))
                .unwrap_or(Platform::GoogleNews);
            let mut article = Article::new(
                or_na(first_of(row, &["Title"])),
                or_na(first_of(row, &["URL"])),
                platform,
            );
            article.source = or_na(first_of(row, &["Source"]));
            article.sentiment = or_na(first_of(row, &["Sentiment"]));
            article.language = or_na(first_of(row, &["Language"]));
            article.country = or_na(first_of(row, &["Country"]));
            article.source_type = or_na(first_of(row, &["Source_Type"]));
            article.published_date = or_na(first_of(row, &["Published_Date"]));
            article.search_keyword =
                first_of(row, &["Search_Keyword"]).filter(|v| v != NOT_AVAILABLE);
            article
        })
        .collect();
    Ok(articles)
}

/// Per-file result of an aggregation run.
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub file: String,
    pub platform: String,
    pub rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Normalizes and merges a set of export files. Files that fail to parse
/// are reported in their outcome and skipped; the rest still aggregate.
pub fn aggregate_files(paths: &[std::path::PathBuf]) -> (Vec<Article>, Vec<FileOutcome>) {
    let mut combined = Vec::new();
    let mut outcomes = Vec::new();

    for path in paths {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let platform = Platform::from_filename(&name);

        match read_rows(path) {
            Ok(rows) => {
                let articles = normalize(platform, &rows);
                tracing::info!(
                    "Processed {}: {} rows as {}",
                    name,
                    articles.len(),
                    platform
                );
                outcomes.push(FileOutcome {
                    file: name,
                    platform: platform.display_name().to_string(),
                    rows: articles.len(),
                    error: None,
                });
                combined.extend(articles);
            }
            Err(e) => {
                tracing::error!("Error processing {}: {}", name, e);
                outcomes.push(FileOutcome {
                    file: name,
                    platform: platform.display_name().to_string(),
                    rows: 0,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    (combined, outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_normalize_talkwalker_row() {
        let row = row(&[
            ("title", "Big story"),
            ("url", "https://example.com/story"),
            ("domain_url", "example.com"),
            ("sentiment", "positive"),
            ("lang", "en"),
            ("extra_author_attributes.world_data.country", "Germany"),
            ("source_type", "BLOG"),
            ("published", "2025-05-07T23:35:35"),
        ]);

        let article = normalize_row(Platform::Talkwalker, &row);
        assert_eq!(article.title, "Big story");
        assert_eq!(article.source, "example.com");
        assert_eq!(article.sentiment, "positive");
        assert_eq!(article.country, "Germany");
        assert_eq!(article.published_date, "2025/05/07");
    }

    #[test]
    fn test_normalize_talkwalker_title_fallback() {
        let row = row(&[("title_snippet", "Fallback title")]);
        let article = normalize_row(Platform::Talkwalker, &row);
        assert_eq!(article.title, "Fallback title");
        assert_eq!(article.url, NOT_AVAILABLE);
        // No domain_url column falls back to the platform name.
        assert_eq!(article.source, "Talkwalker");
    }

    #[test]
    fn test_normalize_newswhip_row() {
        let row = row(&[
            ("Headline", "Breaking news"),
            ("Link", "https://news.example.com/1"),
            ("Domain", "news.example.com"),
            ("Country", "US"),
            ("Published", "04/24/2025"),
        ]);

        let article = normalize_row(Platform::Newswhip, &row);
        assert_eq!(article.title, "Breaking news");
        assert_eq!(article.source_type, "News");
        assert_eq!(article.sentiment, NOT_AVAILABLE);
        assert_eq!(article.published_date, "2025/04/24");
    }

    #[test]
    fn test_normalize_google_news_row_keeps_keyword_and_snippet() {
        let row = row(&[
            ("title", "Rust 1.80 released"),
            ("link", "https://blog.example.com/rust"),
            ("source", "Example Blog"),
            ("date", "2 days ago"),
            ("search_keyword", "rust"),
            ("snippet", "The release brings..."),
        ]);

        let article = normalize_row(Platform::GoogleNews, &row);
        assert_eq!(article.search_keyword.as_deref(), Some("rust"));
        assert_eq!(article.snippet.as_deref(), Some("The release brings..."));
        assert_ne!(article.published_date, "2 days ago");
    }

    #[test]
    fn test_read_csv_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("newswhip_export.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "Headline,Link,Domain").unwrap();
        writeln!(f, "Story A,https://a.example.com,a.example.com").unwrap();
        writeln!(f, "Story B,https://b.example.com,b.example.com").unwrap();

        let rows = read_rows(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["Headline"], "Story A");
    }

    #[test]
    fn test_read_rows_rejects_unknown_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.txt");
        std::fs::write(&path, "hello").unwrap();
        assert!(read_rows(&path).is_err());
    }

    #[test]
    fn test_read_articles_from_combined_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("combined_news_data.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(
            f,
            "Title,URL,Platform,Source,Sentiment,Language,Country,Source_Type,Published_Date,Search_Keyword"
        )
        .unwrap();
        writeln!(
            f,
            "Story,https://example.com,Google News,Example,N/A,en,US,News,2025/05/07,rust"
        )
        .unwrap();
        writeln!(f, "Other,https://b.example.com,Talkwalker,B,N/A,de,DE,BLOG,2025/05/08,N/A")
            .unwrap();

        let articles = read_articles(&path).unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].platform, Platform::GoogleNews);
        assert_eq!(articles[0].search_keyword.as_deref(), Some("rust"));
        assert_eq!(articles[1].platform, Platform::Talkwalker);
        assert!(articles[1].search_keyword.is_none());
    }

    #[test]
    fn test_aggregate_files_skips_broken_file() {
        let dir = TempDir::new().unwrap();

        let good = dir.path().join("newswhip_ok.csv");
        let mut f = std::fs::File::create(&good).unwrap();
        writeln!(f, "Headline,Link").unwrap();
        writeln!(f, "Story,https://example.com").unwrap();

        let bad = dir.path().join("googlenews_bad.xlsx");
        std::fs::write(&bad, b"not a real xlsx").unwrap();

        let (articles, outcomes) = aggregate_files(&[good, bad]);
        assert_eq!(articles.len(), 1);
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].error.is_none());
        assert!(outcomes[1].error.is_some());
    }
}
