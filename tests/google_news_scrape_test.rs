use anyhow::Result;
use httpmock::prelude::*;
use newsgrab::adapters::GoogleNewsScraper;
use newsgrab::domain::model::{NewsQuery, SortBy};
use newsgrab::domain::ports::NewsSource;
use tempfile::TempDir;

fn results_page(server: &MockServer) -> String {
    format!(
        r#"<html><body>
        <div class="SoaBEf">
          <a href="{base}/articles/1"><h3>Truncated...</h3></a>
          <div class="GI74Re">Rust 1.80 ships with new features</div>
          <div class="LfVVr">3 hours ago</div>
          <div class="NUnG9d"><span>Example Wire</span></div>
        </div>
        <div class="SoaBEf">
          <a href="{base}/articles/2"><div role="heading">Second Story</div></a>
          <div class="GI74Re">Another snippet</div>
        </div>
        <div class="SoaBEf">
          <a href="{base}/articles/1"><h3>Duplicate Link</h3></a>
        </div>
        </body></html>"#,
        base = server.base_url()
    )
}

fn query(keyword: &str) -> NewsQuery {
    NewsQuery {
        keywords: vec![keyword.to_string()],
        languages: vec!["lang_en".to_string()],
        geos: vec!["US".to_string()],
        time_period: None,
        sort_by: SortBy::Relevance,
        max_pages: 1,
    }
}

#[tokio::test]
async fn test_scrape_extracts_and_deduplicates_results() -> Result<()> {
    let server = MockServer::start();
    let downloads = TempDir::new()?;

    let search_mock = server.mock(|when, then| {
        when.method(GET).path("/search");
        then.status(200)
            .header("content-type", "text/html")
            .body(results_page(&server));
    });
    server.mock(|when, then| {
        when.method(GET).path("/articles/1");
        then.status(200)
            .body("<html><head><title>Rust 1.80 Released With New Features</title></head></html>");
    });
    server.mock(|when, then| {
        when.method(GET).path("/articles/2");
        then.status(200)
            .body("<html><head><title>Second Story In Full</title></head></html>");
    });

    let scraper = GoogleNewsScraper::new(server.url("/search"), downloads.path())?;
    let articles = scraper.fetch(&query("rust")).await?;

    search_mock.assert();
    // Three result blocks, one a duplicate link.
    assert_eq!(articles.len(), 2);

    let first = articles
        .iter()
        .find(|a| a.link.ends_with("/articles/1"))
        .expect("first article present");
    // The truncated heading is replaced by the linked page's <title>.
    assert_eq!(first.title, "Rust 1.80 Released With New Features");
    assert_eq!(first.snippet, "Rust 1.80 ships with new features");
    assert_eq!(first.date, "3 hours ago");
    assert_eq!(first.source, "Example Wire");
    assert_eq!(first.search_keyword, "rust");

    Ok(())
}

#[tokio::test]
async fn test_empty_page_dumps_debug_html() -> Result<()> {
    let server = MockServer::start();
    let downloads = TempDir::new()?;

    server.mock(|when, then| {
        when.method(GET).path("/search");
        then.status(200)
            .header("content-type", "text/html")
            .body("<html><body><p>no results markup here</p></body></html>");
    });

    let scraper = GoogleNewsScraper::new(server.url("/search"), downloads.path())?;
    let articles = scraper.fetch(&query("nothing")).await?;
    assert!(articles.is_empty());

    let debug_dir = downloads.path().join("html_debug");
    let dumps: Vec<_> = std::fs::read_dir(&debug_dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(dumps.len(), 1);
    assert!(dumps[0].starts_with("debug_nothing_page1_"));
    assert!(dumps[0].ends_with(".html"));

    Ok(())
}

#[tokio::test]
async fn test_failing_page_yields_empty_not_error() -> Result<()> {
    let server = MockServer::start();
    let downloads = TempDir::new()?;

    server.mock(|when, then| {
        when.method(GET).path("/search");
        then.status(503);
    });

    let scraper = GoogleNewsScraper::new(server.url("/search"), downloads.path())?;
    let articles = scraper.fetch(&query("rust")).await?;
    assert!(articles.is_empty());

    Ok(())
}
