use crate::utils::error::{GrabError, Result};
use crate::utils::validation::{validate_path, validate_range, validate_url, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Optional TOML configuration file. Every field has a default so a partial
/// file (or none at all) is valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub paths: PathsSection,
    #[serde(default)]
    pub webdriver: WebDriverSection,
    #[serde(default)]
    pub platforms: PlatformsSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_address")]
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsSection {
    #[serde(default = "default_downloads_dir")]
    pub downloads_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebDriverSection {
    #[serde(default = "default_webdriver_url")]
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformsSection {
    #[serde(default = "default_talkwalker_login_url")]
    pub talkwalker_login_url: String,
    #[serde(default = "default_newswhip_login_url")]
    pub newswhip_login_url: String,
    #[serde(default = "default_google_search_url")]
    pub google_search_url: String,
}

fn default_port() -> u16 {
    8501
}

fn default_address() -> String {
    "0.0.0.0".to_string()
}

fn default_downloads_dir() -> String {
    "./downloads".to_string()
}

fn default_webdriver_url() -> String {
    "http://localhost:9515".to_string()
}

fn default_talkwalker_login_url() -> String {
    "https://app.talkwalker.com/app/login".to_string()
}

fn default_newswhip_login_url() -> String {
    "https://spike.newswhip.com/login".to_string()
}

fn default_google_search_url() -> String {
    "https://www.google.com/search".to_string()
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            port: default_port(),
            address: default_address(),
        }
    }
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            downloads_dir: default_downloads_dir(),
        }
    }
}

impl Default for WebDriverSection {
    fn default() -> Self {
        Self {
            url: default_webdriver_url(),
        }
    }
}

impl Default for PlatformsSection {
    fn default() -> Self {
        Self {
            talkwalker_login_url: default_talkwalker_login_url(),
            newswhip_login_url: default_newswhip_login_url(),
            google_search_url: default_google_search_url(),
        }
    }
}

impl FileConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(GrabError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| GrabError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR_NAME}` placeholders with environment values, leaving
    /// unset placeholders intact.
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }
}

impl Validate for FileConfig {
    fn validate(&self) -> Result<()> {
        validate_range("server.port", self.server.port, 1u16, u16::MAX)?;
        validate_path("paths.downloads_dir", &self.paths.downloads_dir)?;
        validate_url("webdriver.url", &self.webdriver.url)?;
        validate_url(
            "platforms.talkwalker_login_url",
            &self.platforms.talkwalker_login_url,
        )?;
        validate_url(
            "platforms.newswhip_login_url",
            &self.platforms.newswhip_login_url,
        )?;
        validate_url(
            "platforms.google_search_url",
            &self.platforms.google_search_url,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_partial_toml_uses_defaults() {
        let config = FileConfig::from_toml_str(
            r#"
[server]
port = 9000
"#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.address, "0.0.0.0");
        assert_eq!(config.webdriver.url, "http://localhost:9515");
    }

    #[test]
    fn test_empty_toml_is_all_defaults() {
        let config = FileConfig::from_toml_str("").unwrap();
        assert_eq!(config.server.port, 8501);
        assert_eq!(config.paths.downloads_dir, "./downloads");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("NEWSGRAB_TEST_WD", "http://driver:4444");

        let config = FileConfig::from_toml_str(
            r#"
[webdriver]
url = "${NEWSGRAB_TEST_WD}"
"#,
        )
        .unwrap();
        assert_eq!(config.webdriver.url, "http://driver:4444");

        std::env::remove_var("NEWSGRAB_TEST_WD");
    }

    #[test]
    fn test_invalid_webdriver_url_fails_validation() {
        let config = FileConfig::from_toml_str(
            r#"
[webdriver]
url = "not-a-url"
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(
                br#"
[server]
port = 8501
address = "127.0.0.1"
"#,
            )
            .unwrap();

        let config = FileConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.server.address, "127.0.0.1");
    }
}
