use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::adapters::storage::LocalStorage;
use crate::core::export;
use crate::domain::model::{NewsQuery, RawArticle};
use crate::domain::ports::{NewsSource, Storage};
use crate::utils::error::{GrabError, Result};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/101.0.4951.54 Safari/537.36";

const PAGE_TIMEOUT: Duration = Duration::from_secs(10);
const TITLE_TIMEOUT: Duration = Duration::from_secs(5);
const RESULTS_PER_PAGE: usize = 10;
const MAX_PAGE_WORKERS: usize = 5;
const MAX_KEYWORD_WORKERS: usize = 3;

/// Google News search scraper. Selectors track the current results markup
/// and are the part most likely to rot; pages that match nothing are dumped
/// under html_debug for inspection.
#[derive(Clone)]
pub struct GoogleNewsScraper {
    client: reqwest::Client,
    base_url: String,
    debug_dir: PathBuf,
}

/// Fields pulled out of one result block before title enrichment.
#[derive(Debug)]
struct Candidate {
    link: String,
    truncated_title: String,
    snippet: String,
    date: String,
    source: String,
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

impl GoogleNewsScraper {
    pub fn new(base_url: impl Into<String>, downloads_dir: impl Into<PathBuf>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(GrabError::HttpError)?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            debug_dir: downloads_dir.into().join("html_debug"),
        })
    }

    /// Builds one results-page URL. The `lr` languages are pipe-joined and
    /// the pipe is deliberately left unencoded, matching what the search
    /// endpoint expects.
    pub fn build_search_url(&self, query: &NewsQuery, keyword: &str, start: usize) -> String {
        let mut tbs_params: Vec<String> = Vec::new();
        if let Some(period) = query.time_period {
            tbs_params.push(format!("qdr:{}", period.code()));
        }
        if query.sort_by == crate::domain::model::SortBy::Recency {
            tbs_params.push("sbd:1".to_string());
        }

        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        serializer
            .append_pair("q", keyword)
            .append_pair("tbm", "nws")
            .append_pair("start", &start.to_string())
            .append_pair("hl", "en");
        if !tbs_params.is_empty() {
            serializer.append_pair("tbs", &tbs_params.join(","));
        }
        if !query.languages.is_empty() {
            serializer.append_pair("lr", &query.languages.join("|"));
        }
        if let Some(geo) = query.geos.first() {
            serializer.append_pair("gl", geo);
        }

        let query_string = serializer.finish().replace("%7C", "|");
        format!("{}?{}", self.base_url, query_string)
    }

    async fn fetch_full_title(&self, url: &str) -> Option<String> {
        let response = self
            .client
            .get(url)
            .timeout(TITLE_TIMEOUT)
            .send()
            .await
            .and_then(|r| r.error_for_status());

        let body = match response {
            Ok(r) => match r.text().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::error!("Error reading article body for {}: {}", url, e);
                    return None;
                }
            },
            Err(e) => {
                tracing::error!("Request error fetching full title for {}: {}", url, e);
                return None;
            }
        };

        let title = {
            let document = Html::parse_document(&body);
            document
                .select(&selector("title"))
                .next()
                .map(|t| t.text().collect::<String>().trim().to_string())
        };
        title.filter(|t| !t.is_empty())
    }

    /// Extracts result candidates from a page body. Kept synchronous so the
    /// parsed document never lives across an await point.
    fn parse_page(body: &str) -> Vec<Candidate> {
        let article_sel = selector("div.SoaBEf");
        let link_sel = selector("a[href]");
        let title_sel = selector("h3, div[role='heading'], div.MBeuO, div.n0jPhd");
        let snippet_sel = selector(".GI74Re, .st, .dbsr");
        let date_sel = selector(".LfVVr, .slp span");
        let source_sel = selector(".NUnG9d span, .MgUUmf span");

        let document = Html::parse_document(body);
        let mut candidates = Vec::new();

        for element in document.select(&article_sel) {
            let Some(link) = element
                .select(&link_sel)
                .next()
                .and_then(|a| a.value().attr("href"))
            else {
                continue;
            };

            let text_of = |sel: &Selector| {
                element
                    .select(sel)
                    .next()
                    .map(|e| e.text().collect::<String>().trim().to_string())
                    .unwrap_or_default()
            };

            candidates.push(Candidate {
                link: link.to_string(),
                truncated_title: text_of(&title_sel),
                snippet: text_of(&snippet_sel),
                date: text_of(&date_sel),
                source: text_of(&source_sel),
            });
        }

        candidates
    }

    fn save_debug_html(&self, keyword: &str, page_num: usize, body: &str) {
        let safe_keyword: String = keyword
            .chars()
            .take(30)
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect();
        let filename = self.debug_dir.join(format!(
            "debug_{}_page{}_{}.html",
            safe_keyword,
            page_num,
            export::timestamp()
        ));

        if let Err(e) = std::fs::create_dir_all(&self.debug_dir)
            .and_then(|_| std::fs::write(&filename, body))
        {
            tracing::error!("Could not save debug HTML: {}", e);
        } else {
            tracing::info!(
                "Saved HTML for '{}' page {} to {}",
                keyword,
                page_num,
                filename.display()
            );
        }
    }

    /// Scrapes one results page. Page-level failures log and return an empty
    /// page so a single bad page never aborts the whole run.
    async fn scrape_page(&self, url: &str, keyword: &str, page_num: usize) -> Vec<RawArticle> {
        tracing::info!("Scraping URL for '{}' page {}: {}", keyword, page_num, url);

        let body = match self
            .client
            .get(url)
            .timeout(PAGE_TIMEOUT)
            .send()
            .await
            .and_then(|r| r.error_for_status())
        {
            Ok(response) => match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::error!(
                        "Error reading page {} for '{}' ({}): {}",
                        page_num,
                        keyword,
                        url,
                        e
                    );
                    return Vec::new();
                }
            },
            Err(e) => {
                tracing::error!(
                    "Request error scraping page {} for '{}' ({}): {}",
                    page_num,
                    keyword,
                    url,
                    e
                );
                return Vec::new();
            }
        };

        let candidates = Self::parse_page(&body);
        if candidates.is_empty() {
            tracing::warn!(
                "No article elements found on page {} for '{}' using current selectors",
                page_num,
                keyword
            );
            self.save_debug_html(keyword, page_num, &body);
            return Vec::new();
        }

        let mut results = Vec::new();
        for candidate in candidates {
            let full_title = if candidate.link.starts_with("http") {
                self.fetch_full_title(&candidate.link).await
            } else {
                None
            };
            let title = full_title.unwrap_or(candidate.truncated_title);

            if !title.is_empty() && !candidate.link.is_empty() {
                results.push(RawArticle {
                    link: candidate.link,
                    title,
                    snippet: candidate.snippet,
                    date: candidate.date,
                    source: candidate.source,
                    search_keyword: String::new(),
                });
            }
        }

        tracing::info!(
            "Page {} for '{}': Found {} results",
            page_num,
            keyword,
            results.len()
        );
        results
    }

    async fn process_keyword(&self, query: &NewsQuery, keyword: &str) -> Vec<RawArticle> {
        tracing::info!(
            "Processing keyword: '{}' with {} pages, sorted by {:?}",
            keyword,
            query.max_pages,
            query.sort_by
        );

        let permits = MAX_PAGE_WORKERS.min(query.max_pages.max(1));
        let semaphore = Arc::new(Semaphore::new(permits));
        let mut set = JoinSet::new();

        for page in 0..query.max_pages {
            let url = self.build_search_url(query, keyword, page * RESULTS_PER_PAGE);
            let this = self.clone();
            let keyword = keyword.to_string();
            let semaphore = semaphore.clone();
            set.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                this.scrape_page(&url, &keyword, page + 1).await
            });
        }

        let mut results = Vec::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(page_results) => results.extend(page_results),
                Err(e) => tracing::error!("Page task for '{}' panicked: {}", keyword, e),
            }
        }

        for result in &mut results {
            result.search_keyword = keyword.to_string();
        }

        tracing::info!(
            "Completed keyword '{}': Found {} results",
            keyword,
            results.len()
        );
        results
    }

    fn deduplicate(articles: Vec<RawArticle>) -> Vec<RawArticle> {
        let mut seen: HashSet<String> = HashSet::new();
        articles
            .into_iter()
            .filter(|a| !a.link.is_empty() && seen.insert(a.link.clone()))
            .collect()
    }

    /// Runs a full extraction and writes the spreadsheet into storage.
    /// Returns the articles plus the written filename, or `None` for the
    /// filename when there was nothing to write.
    pub async fn export_to_spreadsheet(
        &self,
        storage: &LocalStorage,
        query: &NewsQuery,
    ) -> Result<(Vec<RawArticle>, Option<String>)> {
        let articles = self.fetch(query).await?;
        if articles.is_empty() {
            tracing::info!(
                "No results found for keywords: {:?}. No file will be generated.",
                query.keywords
            );
            return Ok((articles, None));
        }

        let filename = export::google_news_filename(
            "anonymous",
            query.time_period,
            &query.keywords,
            query.sort_by,
        );
        let bytes = export::raw_articles_bytes(&articles)?;
        storage.write_file(&filename, &bytes).await?;

        tracing::info!("{} unique results exported to {}", articles.len(), filename);
        Ok((articles, Some(filename)))
    }
}

#[async_trait]
impl NewsSource for GoogleNewsScraper {
    async fn fetch(&self, query: &NewsQuery) -> Result<Vec<RawArticle>> {
        let keywords: Vec<String> = query
            .keywords
            .iter()
            .map(|kw| kw.trim().to_string())
            .filter(|kw| !kw.is_empty())
            .collect();
        if keywords.is_empty() {
            return Err(GrabError::ValidationError {
                message: "No valid keywords provided".to_string(),
            });
        }

        tracing::info!(
            "Searching for news about {} keyword(s): {:?}, sorted by {:?}",
            keywords.len(),
            keywords,
            query.sort_by
        );

        let semaphore = Arc::new(Semaphore::new(MAX_KEYWORD_WORKERS.min(keywords.len())));
        let mut set = JoinSet::new();

        for keyword in keywords {
            let this = self.clone();
            let query = query.clone();
            let semaphore = semaphore.clone();
            set.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                this.process_keyword(&query, &keyword).await
            });
        }

        let mut all_results = Vec::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(keyword_results) => all_results.extend(keyword_results),
                Err(e) => tracing::error!("Keyword task panicked: {}", e),
            }
        }

        let unique = Self::deduplicate(all_results);
        tracing::info!("Total unique results after deduplication: {}", unique.len());
        Ok(unique)
    }
}
