use anyhow::Result;
use newsgrab::core::export::{self, OutputFormat};
use newsgrab::core::{aggregate, search};
use newsgrab::domain::model::{Platform, RawArticle, Selection};
use std::io::Write;
use tempfile::TempDir;

fn raw(link: &str, title: &str, snippet: &str, keyword: &str) -> RawArticle {
    RawArticle {
        link: link.to_string(),
        title: title.to_string(),
        snippet: snippet.to_string(),
        date: "2 days ago".to_string(),
        source: "Example Wire".to_string(),
        search_keyword: keyword.to_string(),
    }
}

/// Full pipeline: a raw Google News spreadsheet plus platform CSVs are
/// aggregated, scored against a query and exported.
#[test]
fn test_aggregate_score_and_export_pipeline() -> Result<()> {
    let dir = TempDir::new()?;

    // Raw Google News export, written as xlsx the way an extraction run does.
    let gn_path = dir.path().join("googlenews_anonymous_past_day_rust_relevance_x.xlsx");
    export::write_raw_articles(
        &gn_path,
        &[
            raw(
                "https://a.example.com",
                "Rust adoption grows in embedded systems",
                "The Rust language is gaining ground",
                "rust",
            ),
            raw(
                "https://b.example.com",
                "Gardening tips for spring",
                "Plant tomatoes in May",
                "rust",
            ),
        ],
    )?;

    // A Newswhip CSV export.
    let nw_path = dir.path().join("spike_export.csv");
    let mut f = std::fs::File::create(&nw_path)?;
    writeln!(f, "Headline,Link,Domain,Country,Published")?;
    writeln!(
        f,
        "Rust language reaches new milestone,https://c.example.com,c.example.com,US,04/24/2025"
    )?;

    let (articles, outcomes) = aggregate::aggregate_files(&[gn_path, nw_path]);
    assert_eq!(articles.len(), 3);
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| o.error.is_none()));
    assert_eq!(outcomes[0].platform, "Google News");
    assert_eq!(outcomes[1].platform, "Newswhip");

    // Google News dates are standardized during normalization.
    let gn_article = articles
        .iter()
        .find(|a| a.platform == Platform::GoogleNews && a.title.contains("embedded"))
        .expect("google news article present");
    assert_ne!(gn_article.published_date, "2 days ago");

    // Score against a query; the gardening article should rank last.
    let scored = search::score_articles("rust language", articles);
    assert!(scored[0].relevance_score >= scored[2].relevance_score);
    assert!(scored[0].article.title.to_lowercase().contains("rust"));

    let top = search::filter_top(scored, Selection::Number(2));
    assert_eq!(top.len(), 2);
    let summary = search::summarize(3, &top);
    assert_eq!(summary.total_articles, 3);
    assert_eq!(summary.returned, 2);
    assert!(summary.top_relevance >= summary.avg_relevance);

    // Export the scored set and read it back.
    let out_path = dir.path().join("scored.csv");
    export::write_scored(&out_path, &top, OutputFormat::Csv)?;
    let content = std::fs::read_to_string(&out_path)?;
    let header = content.lines().next().unwrap();
    assert!(header.starts_with("Relevance_Score,Title,"));
    assert!(header.ends_with("Keyword_Score,Semantic_Score"));
    assert_eq!(content.lines().count(), 3);

    Ok(())
}

/// A combined export can be re-read and searched, the file-based handoff
/// between an aggregation run and a later search run.
#[test]
fn test_combined_export_roundtrip_for_search() -> Result<()> {
    let dir = TempDir::new()?;

    let nw_path = dir.path().join("spike_export.csv");
    let mut f = std::fs::File::create(&nw_path)?;
    writeln!(f, "Headline,Link,Domain")?;
    writeln!(f, "Story about Rust,https://a.example.com,a.example.com")?;

    let (articles, _) = aggregate::aggregate_files(&[nw_path]);
    let combined = dir.path().join("combined_news_data.csv");
    export::write_articles(&combined, &articles, OutputFormat::Csv)?;

    let reread = aggregate::read_articles(&combined)?;
    assert_eq!(reread.len(), 1);
    assert_eq!(reread[0].platform, Platform::Newswhip);
    assert_eq!(reread[0].title, "Story about Rust");
    assert!(reread[0].search_keyword.is_none());

    let scored = search::score_articles("rust", reread);
    assert!(scored[0].relevance_score > 0.0);

    Ok(())
}
