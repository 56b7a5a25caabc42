use std::path::PathBuf;

use clap::Parser;

use newsgrab::adapters::{
    DriverSettings, GoogleNewsScraper, LocalStorage, NewswhipScraper, TalkwalkerScraper,
};
use newsgrab::config::{AppConfig, Cli, Command, NewswhipAction, TalkwalkerAction};
use newsgrab::core::export::{self, OutputFormat};
use newsgrab::core::{aggregate, search};
use newsgrab::domain::model::{
    GooglePeriod, NewsQuery, NewswhipPeriod, Selection, SortBy, TalkwalkerPeriod,
};
use newsgrab::domain::ports::Storage;
use newsgrab::utils::error::{ErrorSeverity, GrabError, Result};
use newsgrab::utils::logger;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve { .. } => logger::init_server_logger(),
        _ => logger::init_cli_logger(cli.verbose),
    }

    tracing::info!("Starting newsgrab");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = match AppConfig::resolve(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    if let Err(e) = config.ensure_directories() {
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(3);
    }

    if let Err(e) = run(cli.command, config).await {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

async fn run(command: Command, config: AppConfig) -> Result<()> {
    match command {
        Command::Serve { .. } => {
            newsgrab::server::run(config).await?;
            Ok(())
        }
        Command::GoogleNews {
            keywords,
            keywords_file,
            languages,
            geos,
            period,
            sort_by,
            max_pages,
        } => {
            let query = NewsQuery {
                keywords: collect_keywords(keywords, keywords_file)?,
                languages,
                geos,
                time_period: parse_period(period.as_deref())?,
                sort_by: parse_sort_by(&sort_by)?,
                max_pages,
            };

            let scraper = GoogleNewsScraper::new(
                config.google_search_url.clone(),
                config.downloads_dir.clone(),
            )?;
            let storage = LocalStorage::new(config.downloads_dir.clone());
            let (articles, file) = scraper.export_to_spreadsheet(&storage, &query).await?;

            match file {
                Some(file) => {
                    println!("✅ Found {} unique results", articles.len());
                    println!("📁 Saved to: {}", storage.resolve(&file).display());
                }
                None => println!("No results found for the given keywords."),
            }
            Ok(())
        }
        Command::Aggregate { files, format } => {
            let format = parse_format(&format)?;
            let (articles, outcomes) = aggregate::aggregate_files(&files);

            for outcome in &outcomes {
                match &outcome.error {
                    Some(error) => println!("❌ {} ({}): {}", outcome.file, outcome.platform, error),
                    None => println!("✅ {} ({}): {} rows", outcome.file, outcome.platform, outcome.rows),
                }
            }

            if articles.is_empty() {
                return Err(GrabError::export("No rows were aggregated from the given files"));
            }

            let storage = LocalStorage::new(config.downloads_dir.clone());
            let output_file = export::combined_filename(format);
            storage
                .write_file(&output_file, &export::articles_bytes(&articles, format)?)
                .await?;

            println!("✅ Aggregated {} rows", articles.len());
            println!("📁 Saved to: {}", storage.resolve(&output_file).display());
            Ok(())
        }
        Command::Search {
            query,
            input,
            top,
            percentage,
            format,
        } => {
            let format = parse_format(&format)?;
            let selection = match (top, percentage) {
                (Some(n), _) => Selection::Number(n),
                (None, Some(pct)) => Selection::Percentage(pct),
                (None, None) => Selection::Number(10),
            };

            let articles = aggregate::read_articles(&input)?;
            let total = articles.len();
            let scored = search::score_articles(&query, articles);
            let results = search::filter_top(scored, selection);
            let summary = search::summarize(total, &results);

            let storage = LocalStorage::new(config.downloads_dir.clone());
            let output_file = export::search_filename(&query, format);
            storage
                .write_file(&output_file, &export::scored_bytes(&results, format)?)
                .await?;

            println!(
                "✅ Scored {} articles, kept {} (avg relevance {:.2}, top {:.2})",
                summary.total_articles,
                summary.returned,
                summary.avg_relevance,
                summary.top_relevance
            );
            println!("📁 Saved to: {}", storage.resolve(&output_file).display());
            Ok(())
        }
        Command::Talkwalker {
            email,
            password,
            action,
        } => {
            let settings = DriverSettings::from_config(&config);
            let mut scraper =
                TalkwalkerScraper::new(email, password, config.talkwalker_login_url.clone(), settings);
            let result = run_talkwalker(&mut scraper, action).await;
            scraper.close().await;
            result
        }
        Command::Newswhip {
            email,
            password,
            action,
        } => {
            let settings = DriverSettings::from_config(&config);
            let scraper =
                NewswhipScraper::new(email, password, config.newswhip_login_url.clone(), settings);
            run_newswhip(&scraper, action).await
        }
    }
}

async fn run_talkwalker(scraper: &mut TalkwalkerScraper, action: TalkwalkerAction) -> Result<()> {
    match action {
        TalkwalkerAction::Projects => {
            for project in scraper.get_projects().await? {
                println!("{}. {}", project.id, project.name);
            }
        }
        TalkwalkerAction::Categories { project } => {
            scraper
                .select_project_and_navigate_to_topic_analytics(project)
                .await?;
            for category in scraper.get_categories().await? {
                println!("{}. {}", category.id, category.name);
            }
        }
        TalkwalkerAction::Topics { project, category } => {
            scraper
                .select_project_and_navigate_to_topic_analytics(project)
                .await?;
            for topic in scraper.get_topics_for_category(category).await? {
                println!("{}. {}", topic.id, topic.name);
            }
        }
        TalkwalkerAction::Export {
            project,
            category,
            topic,
            period,
        } => {
            let period = TalkwalkerPeriod::from_choice(&period)?;
            let path = scraper.export_data(project, category, topic, period).await?;
            println!("📁 Saved to: {}", path.display());
        }
    }
    Ok(())
}

async fn run_newswhip(scraper: &NewswhipScraper, action: NewswhipAction) -> Result<()> {
    match action {
        NewswhipAction::Folders => {
            for (idx, folder) in scraper.get_folders().await?.iter().enumerate() {
                println!("{}. {}", idx + 1, folder);
            }
        }
        NewswhipAction::Export { folder, period } => {
            let period = NewswhipPeriod::from_choice(&period)?;
            let path = scraper.export_data(&folder, period).await?;
            println!("📁 Saved to: {}", path.display());
        }
    }
    Ok(())
}

fn collect_keywords(keywords: Vec<String>, keywords_file: Option<PathBuf>) -> Result<Vec<String>> {
    let mut all = keywords;

    if let Some(path) = keywords_file {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&path)?;
        for record in reader.records() {
            if let Some(first) = record?.get(0) {
                let keyword = first.trim();
                if !keyword.is_empty() {
                    all.push(keyword.to_string());
                }
            }
        }
    }

    all.retain(|kw| !kw.trim().is_empty());
    if all.is_empty() {
        return Err(GrabError::ValidationError {
            message: "No keywords provided. Use --keywords or --keywords-file".to_string(),
        });
    }
    Ok(all)
}

fn parse_period(code: Option<&str>) -> Result<Option<GooglePeriod>> {
    match code {
        None => Ok(None),
        Some(code) => GooglePeriod::from_code(code).map(Some).ok_or_else(|| {
            GrabError::InvalidConfigValueError {
                field: "period".to_string(),
                value: code.to_string(),
                reason: "Expected one of: h, d, w, m, y".to_string(),
            }
        }),
    }
}

fn parse_sort_by(value: &str) -> Result<SortBy> {
    match value.to_lowercase().as_str() {
        "relevance" => Ok(SortBy::Relevance),
        "recency" => Ok(SortBy::Recency),
        other => Err(GrabError::InvalidConfigValueError {
            field: "sort_by".to_string(),
            value: other.to_string(),
            reason: "Expected relevance or recency".to_string(),
        }),
    }
}

fn parse_format(value: &str) -> Result<OutputFormat> {
    match value.to_lowercase().as_str() {
        "csv" => Ok(OutputFormat::Csv),
        "xlsx" => Ok(OutputFormat::Xlsx),
        other => Err(GrabError::InvalidConfigValueError {
            field: "format".to_string(),
            value: other.to_string(),
            reason: "Expected csv or xlsx".to_string(),
        }),
    }
}
