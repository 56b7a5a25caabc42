use actix_web::{get, post, web, HttpResponse, Responder, Scope};
use serde::{Deserialize, Serialize};

use crate::adapters::{GoogleNewsScraper, LocalStorage};
use crate::core::export::{self, OutputFormat};
use crate::core::{aggregate, search};
use crate::domain::model::{
    Article, NewsQuery, Platform, RawArticle, ScoredArticle, Selection,
};
use crate::domain::ports::Storage;
use crate::server::state::AppState;
use crate::utils::error::{GrabError, Result};
use crate::utils::validation::validate_range;

/// Request file paths must stay inside the downloads dir; absolute paths
/// and parent traversal are rejected before resolution.
fn resolve_in_downloads(storage: &LocalStorage, name: &str) -> Result<std::path::PathBuf> {
    let path = std::path::Path::new(name);
    let escapes = path.is_absolute()
        || path
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir));
    if escapes {
        return Err(GrabError::ValidationError {
            message: format!("File path must be relative to the downloads directory: {}", name),
        });
    }
    Ok(storage.resolve(name))
}

const PLATFORMS: &[Platform] = &[
    Platform::Talkwalker,
    Platform::Newswhip,
    Platform::GoogleNews,
];

#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().body("OK")
}

#[derive(Debug, Serialize)]
struct PlatformEntry {
    id: Platform,
    name: &'static str,
}

#[get("/platforms")]
pub async fn platforms() -> impl Responder {
    let entries: Vec<PlatformEntry> = PLATFORMS
        .iter()
        .map(|p| PlatformEntry {
            id: *p,
            name: p.display_name(),
        })
        .collect();
    HttpResponse::Ok().json(entries)
}

#[derive(Debug, Serialize)]
struct GoogleNewsResponse {
    count: usize,
    file: Option<String>,
    articles: Vec<RawArticle>,
}

#[post("/google-news/search")]
pub async fn google_news_search(
    state: web::Data<AppState>,
    body: web::Json<NewsQuery>,
) -> Result<HttpResponse> {
    let query = body.into_inner();
    validate_range("max_pages", query.max_pages, 1, 10)?;

    let scraper = GoogleNewsScraper::new(
        state.config.google_search_url.clone(),
        state.config.downloads_dir.clone(),
    )?;
    let storage = LocalStorage::new(state.config.downloads_dir.clone());
    let (articles, file) = scraper.export_to_spreadsheet(&storage, &query).await?;

    Ok(HttpResponse::Ok().json(GoogleNewsResponse {
        count: articles.len(),
        file,
        articles,
    }))
}

#[derive(Debug, Deserialize)]
pub struct AggregateRequest {
    files: Vec<String>,
    #[serde(default)]
    format: OutputFormat,
}

#[derive(Debug, Serialize)]
struct AggregateResponse {
    outcomes: Vec<aggregate::FileOutcome>,
    total_rows: usize,
    output_file: String,
}

#[post("/aggregate")]
pub async fn aggregate_exports(
    state: web::Data<AppState>,
    body: web::Json<AggregateRequest>,
) -> Result<HttpResponse> {
    let request = body.into_inner();
    if request.files.is_empty() {
        return Err(GrabError::ValidationError {
            message: "No files provided for aggregation".to_string(),
        });
    }

    let storage = LocalStorage::new(state.config.downloads_dir.clone());
    let paths = request
        .files
        .iter()
        .map(|f| resolve_in_downloads(&storage, f))
        .collect::<Result<Vec<_>>>()?;
    let (articles, outcomes) = aggregate::aggregate_files(&paths);

    // An all-failures run produces no export and leaves any earlier
    // aggregate in place.
    if articles.is_empty() {
        return Err(GrabError::export("No rows were aggregated from the given files"));
    }

    let output_file = export::combined_filename(request.format);
    let bytes = export::articles_bytes(&articles, request.format)?;
    storage.write_file(&output_file, &bytes).await?;

    let total_rows = articles.len();
    state.store_aggregate(articles);

    Ok(HttpResponse::Ok().json(AggregateResponse {
        outcomes,
        total_rows,
        output_file,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    query: String,
    #[serde(default)]
    selection: Option<Selection>,
    #[serde(default)]
    input: Option<String>,
    #[serde(default)]
    format: OutputFormat,
}

#[derive(Debug, Serialize)]
struct SearchResponse {
    summary: search::SearchSummary,
    output_file: String,
    articles: Vec<ScoredArticle>,
}

#[post("/search")]
pub async fn relevance_search(
    state: web::Data<AppState>,
    body: web::Json<SearchRequest>,
) -> Result<HttpResponse> {
    let request = body.into_inner();
    if request.query.trim().is_empty() {
        return Err(GrabError::ValidationError {
            message: "Search query cannot be empty".to_string(),
        });
    }

    let storage = LocalStorage::new(state.config.downloads_dir.clone());
    let articles: Vec<Article> = match &request.input {
        Some(input) => aggregate::read_articles(&resolve_in_downloads(&storage, input)?)?,
        None => state.stored_aggregate().ok_or_else(|| GrabError::ValidationError {
            message: "No aggregated data available. Aggregate export files first or pass an input file".to_string(),
        })?,
    };

    let total = articles.len();
    let scored = search::score_articles(&request.query, articles);
    let selection = request.selection.unwrap_or(Selection::Number(10));
    let top = search::filter_top(scored, selection);
    let summary = search::summarize(total, &top);

    let output_file = export::search_filename(&request.query, request.format);
    let bytes = export::scored_bytes(&top, request.format)?;
    storage.write_file(&output_file, &bytes).await?;

    Ok(HttpResponse::Ok().json(SearchResponse {
        summary,
        output_file,
        articles: top,
    }))
}

pub fn routers() -> Scope {
    web::scope("/api")
        .service(platforms)
        .service(google_news_search)
        .service(aggregate_exports)
        .service(relevance_search)
}
