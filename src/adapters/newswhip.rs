use std::path::PathBuf;
use std::time::Duration;

use thirtyfour::prelude::*;

use crate::adapters::browser::DriverSettings;
use crate::core::export;
use crate::domain::model::NewswhipPeriod;
use crate::utils::error::{GrabError, Result};

const DASHBOARD_NAMES: &str = "//div[contains(@class, 'dashboard-list-item-container')]\
//span[contains(@class, 'single-search-dashboard-name')]";

/// Newswhip browser automation. Unlike Talkwalker the session is short
/// lived: every operation starts a fresh browser and quits it on all paths.
pub struct NewswhipScraper {
    email: String,
    password: String,
    login_url: String,
    settings: DriverSettings,
}

impl NewswhipScraper {
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        login_url: impl Into<String>,
        settings: DriverSettings,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            login_url: login_url.into(),
            settings,
        }
    }

    async fn login(&self, driver: &WebDriver) -> Result<()> {
        tracing::info!("Logging into Newswhip");
        driver.goto(&self.login_url).await?;

        driver
            .query(By::Id("email"))
            .first()
            .await?
            .send_keys(&self.email)
            .await?;
        driver
            .query(By::Id("password"))
            .first()
            .await?
            .send_keys(&self.password)
            .await?;
        driver
            .query(By::Id("loginFormSubmit"))
            .first()
            .await?
            .click()
            .await?;

        // Login completes when the dashboard folder list renders.
        driver.query(By::XPath(DASHBOARD_NAMES)).first().await?;
        tracing::info!("Successfully logged into Newswhip");
        Ok(())
    }

    pub async fn get_folders(&self) -> Result<Vec<String>> {
        let driver = self.settings.new_session().await?;
        let result = self.folders_inner(&driver).await;
        if let Err(e) = driver.quit().await {
            tracing::error!("Error closing driver: {}", e);
        }
        result
    }

    async fn folders_inner(&self, driver: &WebDriver) -> Result<Vec<String>> {
        self.login(driver).await?;

        let elements = driver.find_all(By::XPath(DASHBOARD_NAMES)).await?;
        let mut folders = Vec::new();
        for element in &elements {
            folders.push(element.text().await?.trim().to_string());
        }

        tracing::info!("Found {} folders", folders.len());
        Ok(folders)
    }

    pub async fn export_data(&self, folder_name: &str, period: NewswhipPeriod) -> Result<PathBuf> {
        let driver = self.settings.new_session().await?;
        let result = self.export_inner(&driver, folder_name, period).await;
        if let Err(e) = driver.quit().await {
            tracing::error!("Error closing driver: {}", e);
        }
        result
    }

    async fn select_time_period(&self, driver: &WebDriver, period: NewswhipPeriod) -> Result<()> {
        let label = driver
            .query(By::XPath(format!(
                "//label[starts-with(@for, '{}')]",
                period.label_prefix()
            )))
            .first()
            .await?;
        label.click().await?;

        // The full-year option has no number input to reset.
        if period != NewswhipPeriod::FullYear {
            let container = label
                .find(By::XPath("./ancestor::div[contains(@class, 'radio')][1]"))
                .await?;
            container
                .find(By::XPath(".//input[@type='number']"))
                .await?
                .clear()
                .await?;
        }

        tracing::info!("Selected time period: {}", period.filename_token());
        Ok(())
    }

    async fn export_inner(
        &self,
        driver: &WebDriver,
        folder_name: &str,
        period: NewswhipPeriod,
    ) -> Result<PathBuf> {
        self.login(driver).await?;

        let folder_button = driver
            .query(By::XPath(format!(
                "//span[contains(text(), '{}')]/ancestor::button",
                folder_name
            )))
            .first()
            .await?;
        folder_button.click().await?;
        tracing::info!("Folder '{}' selected successfully.", folder_name);

        // A "Top Themes Highlight" tooltip sometimes covers the header.
        let tooltip_close = driver
            .find_all(By::XPath(
                "//div[contains(@class, 'cdk-overlay-pane')]\
//button[contains(@class, 'btn-close') and contains(@class, 'close-button')]",
            ))
            .await?;
        if let Some(close_button) = tooltip_close.first() {
            if close_button.click().await.is_ok() {
                tracing::info!("Closed the 'Top Themes Highlight' tooltip.");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }

        driver
            .query(By::XPath(
                "//div[contains(@class, 'header-bottom')]\
//button[contains(@class, 'date-picker-dropdown-toggle')]",
            ))
            .first()
            .await?
            .click()
            .await?;
        tracing::info!("Date selection dropdown opened.");

        driver
            .query(By::XPath(
                "//div[contains(@class, 'custom-datetime-container')]",
            ))
            .first()
            .await?;

        self.select_time_period(driver, period).await?;

        driver
            .query(By::XPath(
                "//button[contains(@class, 'btn-primary') and text()='Apply']",
            ))
            .first()
            .await?
            .click()
            .await?;
        tracing::info!("Date range applied successfully.");
        tokio::time::sleep(Duration::from_secs(2)).await;

        driver
            .query(By::XPath(
                "//span[contains(text(), 'All Articles')]\
/ancestor::div[contains(@class, 'header-top')]\
//button[contains(@class, 'widget-action') and .//i[contains(@class, 'fa-ellipsis-v')]]",
            ))
            .first()
            .await?
            .click()
            .await?;

        let export_button = driver
            .query(By::XPath("//span[text()='Export']/parent::a"))
            .first()
            .await?;
        driver
            .action_chain()
            .move_to_element_center(&export_button)
            .perform()
            .await?;
        tokio::time::sleep(Duration::from_secs(2)).await;

        let csv_button = driver
            .query(By::XPath(
                "//spike-export-panel-dropdown-menu//span[text()='CSV']",
            ))
            .first()
            .await?;
        driver
            .execute("arguments[0].click();", vec![csv_button.to_json()?])
            .await?;
        tracing::info!("CSV Export triggered successfully.");

        tokio::time::sleep(Duration::from_secs(3)).await;

        let latest = export::latest_csv_in(&self.settings.downloads_dir)?;
        let username = self
            .email
            .split('@')
            .next()
            .ok_or_else(|| GrabError::scrape("Could not derive username from email"))?;
        let new_filename = format!(
            "newswhip_{}_{}_{}_{}.csv",
            username,
            period.filename_token(),
            export::sanitize_component(folder_name),
            export::timestamp()
        );
        let new_path = self.settings.downloads_dir.join(new_filename);
        std::fs::rename(&latest, &new_path)?;
        tracing::info!("CSV file renamed and saved to: {}", new_path.display());

        Ok(new_path)
    }
}
