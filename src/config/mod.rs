pub mod file;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::utils::error::Result;
use crate::utils::validation::Validate;
use file::FileConfig;

/// Environment flags recognized by the runtime (set by the container image).
pub const ENV_GATHER_USAGE_STATS: &str = "NEWSGRAB_GATHER_USAGE_STATS";
pub const ENV_HEADLESS: &str = "NEWSGRAB_HEADLESS";
pub const ENV_CHROME_BIN: &str = "CHROME_BIN";
pub const ENV_CHROMEDRIVER_PATH: &str = "CHROMEDRIVER_PATH";

#[derive(Debug, Parser)]
#[command(name = "newsgrab")]
#[command(about = "News extraction, aggregation and relevance-search automation tool")]
pub struct Cli {
    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Path to a TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Directory for downloaded and generated files")]
    pub downloads_dir: Option<PathBuf>,

    #[arg(long, global = true, help = "chromedriver endpoint for browser automation")]
    pub webdriver_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP server.
    Serve {
        #[arg(long)]
        port: Option<u16>,
        #[arg(long)]
        address: Option<String>,
    },
    /// One-shot Google News extraction to a spreadsheet.
    GoogleNews {
        #[arg(long, value_delimiter = ',', help = "Comma-separated search keywords")]
        keywords: Vec<String>,
        #[arg(long, help = "CSV file with keywords in the first column")]
        keywords_file: Option<PathBuf>,
        #[arg(long, value_delimiter = ',', help = "Language codes, e.g. lang_en")]
        languages: Vec<String>,
        #[arg(long, value_delimiter = ',', help = "Region codes, e.g. IN,US")]
        geos: Vec<String>,
        #[arg(long, help = "Time period code: h, d, w, m or y")]
        period: Option<String>,
        #[arg(long, default_value = "relevance", help = "relevance or recency")]
        sort_by: String,
        #[arg(long, default_value = "5")]
        max_pages: usize,
    },
    /// Normalize and merge platform export files.
    Aggregate {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long, default_value = "csv", help = "Output format: csv or xlsx")]
        format: String,
    },
    /// Score an aggregated file against a query and keep the top results.
    Search {
        #[arg(long)]
        query: String,
        #[arg(long, help = "Aggregated CSV/XLSX input file")]
        input: PathBuf,
        #[arg(long, conflicts_with = "percentage", help = "Keep the top N articles")]
        top: Option<usize>,
        #[arg(long, help = "Keep the top X percent of articles")]
        percentage: Option<f64>,
        #[arg(long, default_value = "csv", help = "Output format: csv or xlsx")]
        format: String,
    },
    /// Talkwalker browser-automation workflows.
    Talkwalker {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[command(subcommand)]
        action: TalkwalkerAction,
    },
    /// Newswhip browser-automation workflows.
    Newswhip {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[command(subcommand)]
        action: NewswhipAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum TalkwalkerAction {
    /// List available projects.
    Projects,
    /// List categories of a project.
    Categories {
        #[arg(long)]
        project: usize,
    },
    /// List topics of a category.
    Topics {
        #[arg(long)]
        project: usize,
        #[arg(long)]
        category: usize,
    },
    /// Export a topic's results to CSV.
    Export {
        #[arg(long)]
        project: usize,
        #[arg(long)]
        category: usize,
        #[arg(long)]
        topic: usize,
        #[arg(long, default_value = "2", help = "Time period choice 1-6")]
        period: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum NewswhipAction {
    /// List available folders.
    Folders,
    /// Export a folder's articles to CSV.
    Export {
        #[arg(long)]
        folder: String,
        #[arg(long, default_value = "2", help = "Time period choice 1-4")]
        period: String,
    },
}

/// Runtime flags read from the environment.
#[derive(Debug, Clone)]
pub struct EnvSettings {
    pub gather_usage_stats: bool,
    pub headless: bool,
    pub chrome_bin: Option<String>,
    pub chromedriver_path: Option<String>,
}

impl EnvSettings {
    pub fn from_env() -> Self {
        Self {
            gather_usage_stats: std::env::var(ENV_GATHER_USAGE_STATS)
                .map(|v| v.to_lowercase() != "false")
                .unwrap_or(true),
            headless: std::env::var(ENV_HEADLESS)
                .map(|v| v.to_lowercase() == "true")
                .unwrap_or(false),
            chrome_bin: std::env::var(ENV_CHROME_BIN).ok(),
            chromedriver_path: std::env::var(ENV_CHROMEDRIVER_PATH).ok(),
        }
    }
}

/// Fully resolved runtime configuration: file config overridden by CLI
/// flags, plus the environment settings.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub address: String,
    pub downloads_dir: PathBuf,
    pub webdriver_url: String,
    pub talkwalker_login_url: String,
    pub newswhip_login_url: String,
    pub google_search_url: String,
    pub env: EnvSettings,
}

impl AppConfig {
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => {
                let config = FileConfig::from_file(path)?;
                config.validate()?;
                config
            }
            None => FileConfig::default(),
        };

        let (port, address) = match &cli.command {
            Command::Serve { port, address } => (
                port.unwrap_or(file.server.port),
                address.clone().unwrap_or(file.server.address.clone()),
            ),
            _ => (file.server.port, file.server.address.clone()),
        };

        Ok(Self {
            port,
            address,
            downloads_dir: cli
                .downloads_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(&file.paths.downloads_dir)),
            webdriver_url: cli
                .webdriver_url
                .clone()
                .unwrap_or_else(|| file.webdriver.url.clone()),
            talkwalker_login_url: file.platforms.talkwalker_login_url,
            newswhip_login_url: file.platforms.newswhip_login_url,
            google_search_url: file.platforms.google_search_url,
            env: EnvSettings::from_env(),
        })
    }

    /// Creates the downloads dir (and the HTML debug subdir) if missing.
    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(self.downloads_dir.join("html_debug"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_serve_defaults_to_8501_on_all_interfaces() {
        let cli = Cli::parse_from(["newsgrab", "serve"]);
        let config = AppConfig::resolve(&cli).unwrap();
        assert_eq!(config.port, 8501);
        assert_eq!(config.address, "0.0.0.0");
        assert_eq!(config.downloads_dir, PathBuf::from("./downloads"));
    }

    #[test]
    fn test_serve_flags_override_defaults() {
        let cli = Cli::parse_from([
            "newsgrab",
            "serve",
            "--port",
            "9000",
            "--address",
            "127.0.0.1",
            "--downloads-dir",
            "/tmp/dl",
        ]);
        let config = AppConfig::resolve(&cli).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.address, "127.0.0.1");
        assert_eq!(config.downloads_dir, PathBuf::from("/tmp/dl"));
    }

    #[test]
    fn test_google_news_keyword_delimiter() {
        let cli = Cli::parse_from([
            "newsgrab",
            "google-news",
            "--keywords",
            "rust,tokio",
            "--period",
            "d",
        ]);
        match cli.command {
            Command::GoogleNews { keywords, period, .. } => {
                assert_eq!(keywords, vec!["rust", "tokio"]);
                assert_eq!(period.as_deref(), Some("d"));
            }
            _ => panic!("expected google-news subcommand"),
        }
    }
}
