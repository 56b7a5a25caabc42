use std::path::PathBuf;

use serde_json::json;
use thirtyfour::{ChromeCapabilities, ChromiumLikeCapabilities, WebDriver};

use crate::config::{AppConfig, EnvSettings};
use crate::utils::error::Result;

/// Chrome session settings shared by the browser-automation scrapers.
#[derive(Debug, Clone)]
pub struct DriverSettings {
    pub webdriver_url: String,
    pub downloads_dir: PathBuf,
    pub headless: bool,
    pub chrome_bin: Option<String>,
    pub chromedriver_path: Option<String>,
}

impl DriverSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        let EnvSettings {
            headless,
            ref chrome_bin,
            ref chromedriver_path,
            ..
        } = config.env;

        Self {
            webdriver_url: config.webdriver_url.clone(),
            downloads_dir: config.downloads_dir.clone(),
            headless,
            chrome_bin: chrome_bin.clone(),
            chromedriver_path: chromedriver_path.clone(),
        }
    }

    fn capabilities(&self, download_path: &str) -> Result<ChromeCapabilities> {
        let mut caps = ChromeCapabilities::new();
        caps.add_arg("--start-maximized")?;
        caps.add_arg("--no-sandbox")?;
        caps.add_arg("--disable-dev-shm-usage")?;
        if self.headless {
            caps.add_arg("--headless=new")?;
        }
        if let Some(chrome_bin) = &self.chrome_bin {
            caps.set_binary(chrome_bin)?;
        }

        caps.add_experimental_option(
            "prefs",
            json!({
                "download.default_directory": download_path,
                "download.prompt_for_download": false,
                "download.directory_upgrade": true,
                "safebrowsing.enabled": false,
            }),
        )?;

        Ok(caps)
    }

    /// Starts a Chrome session with downloads routed into the downloads dir.
    pub async fn new_session(&self) -> Result<WebDriver> {
        std::fs::create_dir_all(&self.downloads_dir)?;
        let download_path = std::fs::canonicalize(&self.downloads_dir)
            .unwrap_or_else(|_| self.downloads_dir.clone())
            .to_string_lossy()
            .into_owned();

        let caps = self.capabilities(&download_path)?;
        if let Some(chromedriver_path) = &self.chromedriver_path {
            tracing::debug!(
                "Expecting chromedriver at {} behind {}",
                chromedriver_path,
                self.webdriver_url
            );
        }
        let driver = WebDriver::new(&self.webdriver_url, caps).await?;
        tracing::info!("Chrome driver has been set up");
        Ok(driver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities_include_download_prefs() {
        let settings = DriverSettings {
            webdriver_url: "http://localhost:9515".to_string(),
            downloads_dir: PathBuf::from("/tmp/downloads"),
            headless: true,
            chrome_bin: Some("/usr/bin/chromium".to_string()),
            chromedriver_path: Some("/usr/bin/chromedriver".to_string()),
        };

        // Should build without error; a malformed option would fail here.
        assert!(settings.capabilities("/tmp/downloads").is_ok());
    }
}
