pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod server;
pub mod utils;

pub use adapters::{
    DriverSettings, GoogleNewsScraper, LocalStorage, NewswhipScraper, TalkwalkerScraper,
};
pub use config::{AppConfig, Cli, Command};
pub use utils::error::{GrabError, Result};
