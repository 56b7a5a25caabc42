use std::path::PathBuf;
use std::time::Duration;

use thirtyfour::prelude::*;

use crate::adapters::browser::DriverSettings;
use crate::core::export;
use crate::domain::model::{Listing, TalkwalkerPeriod};
use crate::utils::error::{GrabError, Result};
use crate::utils::validation::validate_index_in_range;

const PROJECT_BUTTON: &str = "//button[contains(@class,'p-navbar-project-selection')]";
const PROJECT_LABELS: &str = "//div[contains(@class,'nav-menu-body-content')]\
//div[contains(@class,'navbar-project') and contains(@class,'p-menu-item')]\
//div[contains(@class,'menu-label')]";
const CATEGORY_CONTAINERS: &str =
    "//div[contains(@class,'p-sbtm-item') and contains(@class, 'group')]";
const CATEGORY_TOPICS: &str = "following-sibling::div[contains(@class, 'child')]";
const ITEM_LABEL: &str = ".//span[contains(@class, 'item-label')]";
const MORE_DROPDOWN: &str =
    "//div[contains(@class,'p-time-filter-header-event-more-label-wrapper')]";

/// How the time filter widget is laid out on the current project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimeSelectionPattern {
    /// All periods rendered as buttons.
    Direct,
    /// Some periods hidden behind the "More" dropdown.
    Dropdown,
    Unknown,
}

/// Talkwalker browser automation. The session is created lazily and reused
/// across calls; `close` must run before the scraper is dropped.
pub struct TalkwalkerScraper {
    email: String,
    password: String,
    login_url: String,
    settings: DriverSettings,
    driver: Option<WebDriver>,
    logged_in: bool,
    current_project: Option<Listing>,
}

impl TalkwalkerScraper {
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
            driver: None,
            logged_in: false,
            current_project: None,
        }
    }

    async fn session(&mut self) -> Result<&WebDriver> {
        if self.driver.is_none() {
            self.driver = Some(self.settings.new_session().await?);
        }
        self.driver()
    }

    fn driver(&self) -> Result<&WebDriver> {
        self.driver
            .as_ref()
            .ok_or_else(|| GrabError::scrape("Browser session is not running"))
    }

    /// Quits the browser. Errors are logged rather than propagated so close
    /// is safe on every exit path.
    pub async fn close(&mut self) {
        if let Some(driver) = self.driver.take() {
            tracing::info!("Closing browser session");
            if let Err(e) = driver.quit().await {
                tracing::error!("Error closing driver: {}", e);
            }
        }
        self.logged_in = false;
        self.current_project = None;
    }

    async fn login(&mut self) -> Result<()> {
        self.session().await?;

        if self.logged_in {
            let still_there = !self
                .driver()?
                .find_all(By::XPath(PROJECT_BUTTON))
                .await?
                .is_empty();
            if still_there {
                tracing::info!("Already logged in to Talkwalker.");
                return Ok(());
            }
            tracing::info!("Session expired, logging in again.");
            self.logged_in = false;
        }

        let driver = self.driver()?;
        tracing::info!("Navigating to Talkwalker login page...");
        driver.goto(&self.login_url).await?;

        tracing::info!("Entering email...");
        let email_field = driver.query(By::Name("email")).first().await?;
        email_field.send_keys(&self.email).await?;
        driver.query(By::Id("next-button")).first().await?.click().await?;

        tracing::info!("Entering password...");
        let password_field = driver.query(By::Name("password")).first().await?;
        password_field.send_keys(&self.password).await?;
        driver.query(By::Id("login-button")).first().await?.click().await?;

        // Success is the project-selection button appearing.
        driver.query(By::XPath(PROJECT_BUTTON)).first().await?;

        self.logged_in = true;
        tracing::info!("Successfully logged into Talkwalker.");
        Ok(())
    }

    pub async fn get_projects(&mut self) -> Result<Vec<Listing>> {
        self.login().await?;
        let driver = self.driver()?;

        tracing::info!("Opening project dropdown...");
        let dropdown_button = driver.query(By::XPath(PROJECT_BUTTON)).first().await?;
        dropdown_button.click().await?;

        tracing::info!("Fetching project elements...");
        driver.query(By::XPath(PROJECT_LABELS)).first().await?;
        let elements = driver.find_all(By::XPath(PROJECT_LABELS)).await?;

        let mut projects = Vec::new();
        for (idx, element) in elements.iter().enumerate() {
            projects.push(Listing {
                id: idx + 1,
                name: element.text().await?.trim().to_string(),
            });
        }

        tracing::info!("Found {} projects.", projects.len());
        dropdown_button.click().await?;
        Ok(projects)
    }

    pub async fn select_project_and_navigate_to_topic_analytics(
        &mut self,
        project_id: usize,
    ) -> Result<()> {
        self.login().await?;

        let projects = self.get_projects().await?;
        validate_index_in_range("project", project_id, projects.len())?;
        let project = projects[project_id - 1].clone();

        let driver = self.driver()?;
        driver
            .query(By::XPath(PROJECT_BUTTON))
            .first()
            .await?
            .click()
            .await?;

        tracing::info!("Selecting project: {}", project.name);
        driver.query(By::XPath(PROJECT_LABELS)).first().await?;
        let elements = driver.find_all(By::XPath(PROJECT_LABELS)).await?;
        validate_index_in_range("project", project_id, elements.len())?;

        let selected = &elements[project_id - 1];
        driver
            .execute("arguments[0].click();", vec![selected.to_json()?])
            .await?;

        // Project switching re-renders the navbar.
        tokio::time::sleep(Duration::from_secs(3)).await;

        tracing::info!("Navigating to Topic Analytics...");
        let card = driver
            .query(By::XPath(
                "//div[contains(@class, 'descriptive-card-title')]\
//span[contains(text(), 'Topic Analytics')]\
/ancestor::div[contains(@class, 'descriptive-card')]",
            ))
            .first()
            .await?;
        card.click().await?;

        driver.query(By::ClassName("view-container")).first().await?;
        tokio::time::sleep(Duration::from_secs(2)).await;

        self.current_project = Some(project.clone());
        tracing::info!(
            "Successfully navigated to project {} and Topic Analytics",
            project.name
        );
        Ok(())
    }

    pub async fn get_categories(&mut self) -> Result<Vec<Listing>> {
        self.login().await?;
        let driver = self.driver()?;

        tracing::info!("Fetching available categories...");
        driver.query(By::XPath(CATEGORY_CONTAINERS)).first().await?;
        let containers = driver.find_all(By::XPath(CATEGORY_CONTAINERS)).await?;

        let mut categories = Vec::new();
        for (idx, container) in containers.iter().enumerate() {
            match container.find(By::XPath(ITEM_LABEL)).await {
                Ok(label) => categories.push(Listing {
                    id: idx + 1,
                    name: label.text().await?.trim().to_string(),
                }),
                Err(e) => {
                    tracing::warn!("Skipping category due to error: {}", e);
                }
            }
        }

        tracing::info!("Found {} categories", categories.len());
        Ok(categories)
    }

    pub async fn get_topics_for_category(&mut self, category_id: usize) -> Result<Vec<Listing>> {
        self.login().await?;

        let categories = self.get_categories().await?;
        validate_index_in_range("category", category_id, categories.len())?;
        let category = categories[category_id - 1].clone();
        tracing::info!("Getting topics for category: {}", category.name);

        let driver = self.driver()?;
        let containers = driver.find_all(By::XPath(CATEGORY_CONTAINERS)).await?;
        validate_index_in_range("category", category_id, containers.len())?;
        let container = &containers[category_id - 1];

        // Expand the category when its topic list is collapsed.
        if container.find_all(By::XPath(CATEGORY_TOPICS)).await?.is_empty() {
            match container
                .find(By::XPath(".//button[contains(@class,'action-icon')]"))
                .await
            {
                Ok(toggle) => {
                    toggle.click().await?;
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    tracing::info!("Expanded category '{}' to show topics", category.name);
                }
                Err(e) => tracing::warn!("Error while expanding category: {}", e),
            }
        }

        let topic_elements = container.find_all(By::XPath(CATEGORY_TOPICS)).await?;
        let mut topics = Vec::new();
        for (idx, topic) in topic_elements.iter().enumerate() {
            if let Ok(label) = topic.find(By::XPath(ITEM_LABEL)).await {
                topics.push(Listing {
                    id: idx + 1,
                    name: label.text().await?.trim().to_string(),
                });
            }
        }

        tracing::info!("Found {} topics in category '{}'", topics.len(), category.name);
        Ok(topics)
    }

    async fn detect_time_selection_pattern(&self) -> TimeSelectionPattern {
        let Ok(driver) = self.driver() else {
            return TimeSelectionPattern::Unknown;
        };

        let more = driver.find_all(By::XPath(MORE_DROPDOWN)).await;
        match more {
            Ok(elements) if !elements.is_empty() => {
                let d1_visible = self.time_period_visible("d1").await;
                let d7_visible = self.time_period_visible("d7").await;
                if d1_visible || d7_visible {
                    TimeSelectionPattern::Dropdown
                } else {
                    TimeSelectionPattern::Direct
                }
            }
            Ok(_) => {
                let buttons = driver
                    .find_all(By::XPath(
                        "//div[contains(@class, 'p-time-filter-header-event-button')]",
                    ))
                    .await;
                match buttons {
                    Ok(buttons) if !buttons.is_empty() => TimeSelectionPattern::Direct,
                    _ => TimeSelectionPattern::Unknown,
                }
            }
            Err(e) => {
                tracing::warn!("Error detecting time selection pattern: {}", e);
                TimeSelectionPattern::Unknown
            }
        }
    }

    async fn time_period_visible(&self, data_id: &str) -> bool {
        let Ok(driver) = self.driver() else {
            return false;
        };
        driver
            .find_all(By::XPath(format!("//div[@data-id='{}']", data_id)))
            .await
            .map(|elements| !elements.is_empty())
            .unwrap_or(false)
    }

    async fn click_time_period(&self, period: TalkwalkerPeriod) -> Result<()> {
        let element = self
            .driver()?
            .query(By::XPath(format!("//div[@data-id='{}']", period.data_id())))
            .first()
            .await?;
        element.click().await?;
        tracing::info!(
            "Selected time period using direct selection: {}",
            period.label()
        );
        Ok(())
    }

    async fn select_time_period_from_dropdown(&self, period: TalkwalkerPeriod) -> Result<()> {
        let driver = self.driver()?;
        driver.query(By::XPath(MORE_DROPDOWN)).first().await?.click().await?;
        tokio::time::sleep(Duration::from_secs(1)).await;

        driver
            .query(By::XPath(format!("//div[@data-id='{}']", period.data_id())))
            .first()
            .await?
            .click()
            .await?;

        tracing::info!("Selected time period from dropdown: {}", period.label());
        Ok(())
    }

    async fn select_time_period(&self, period: TalkwalkerPeriod) -> Result<()> {
        let pattern = self.detect_time_selection_pattern().await;
        tracing::info!("Detected time selection UI pattern: {:?}", pattern);

        match pattern {
            TimeSelectionPattern::Direct => {
                if let Err(e) = self.click_time_period(period).await {
                    tracing::warn!(
                        "Direct time period selection failed: {}, trying dropdown method...",
                        e
                    );
                    self.select_time_period_from_dropdown(period).await?;
                }
            }
            TimeSelectionPattern::Dropdown => {
                if period.usually_visible() && self.time_period_visible(period.data_id()).await {
                    self.click_time_period(period).await?;
                } else {
                    self.select_time_period_from_dropdown(period).await?;
                }
            }
            TimeSelectionPattern::Unknown => {
                tracing::info!("Using fallback method for time period selection");
                if let Err(e) = self.click_time_period(period).await {
                    tracing::warn!(
                        "Direct time period selection failed: {}, trying dropdown method...",
                        e
                    );
                    self.select_time_period_from_dropdown(period).await?;
                }
            }
        }
        Ok(())
    }

    /// Full export workflow. Selects the project, time period, category and
    /// topic, exports the results widget as CSV and renames the download.
    pub async fn export_data(
        &mut self,
        project_id: usize,
        category_id: usize,
        topic_id: usize,
        period: TalkwalkerPeriod,
    ) -> Result<PathBuf> {
        self.login().await?;

        if self.current_project.as_ref().map(|p| p.id) != Some(project_id) {
            self.select_project_and_navigate_to_topic_analytics(project_id)
                .await?;
        }

        let projects = self.get_projects().await?;
        validate_index_in_range("project", project_id, projects.len())?;
        let project = projects[project_id - 1].clone();

        tracing::info!("Selecting time period: {}", period.label());
        self.select_time_period(period).await?;
        tokio::time::sleep(Duration::from_secs(2)).await;

        let categories = self.get_categories().await?;
        validate_index_in_range("category", category_id, categories.len())?;
        let category = categories[category_id - 1].clone();

        let topics = self.get_topics_for_category(category_id).await?;
        validate_index_in_range("topic", topic_id, topics.len())?;
        let topic = topics[topic_id - 1].clone();

        let driver = self.driver()?;
        let containers = driver.find_all(By::XPath(CATEGORY_CONTAINERS)).await?;
        validate_index_in_range("category", category_id, containers.len())?;
        let topics_in_category = containers[category_id - 1]
            .find_all(By::XPath(CATEGORY_TOPICS))
            .await?;
        validate_index_in_range("topic", topic_id, topics_in_category.len())?;

        tracing::info!("Clicking on topic: {}", topic.name);
        let clickable = topics_in_category[topic_id - 1]
            .find(By::XPath(".//a[contains(@class, 'item-container')]"))
            .await?;
        driver
            .execute("arguments[0].click();", vec![clickable.to_json()?])
            .await?;
        tokio::time::sleep(Duration::from_secs(2)).await;

        tracing::info!("Navigating to Results tab...");
        driver
            .query(By::XPath("//i[contains(@class,'tw3-icon-results-list')]"))
            .first()
            .await?
            .click()
            .await?;
        tokio::time::sleep(Duration::from_secs(5)).await;

        tracing::info!("Finding results widget...");
        let results_widget = driver
            .query(By::XPath(
                "//div[contains(@class,'widget-card-section') and \
.//div[contains(text(),'Group') and contains(@class,'bar-dd-menu-header')] and \
.//div[contains(text(),'Sort by') and contains(@class,'bar-dd-menu-header')]]",
            ))
            .first()
            .await?;
        driver
            .action_chain()
            .move_to_element_center(&results_widget)
            .perform()
            .await?;

        tracing::info!("Opening export menu...");
        results_widget
            .find(By::XPath(
                ".//div[contains(@class,'item-header-action-icon')]\
//button[i[contains(@class,'tw3-icon-three-dots')]]",
            ))
            .await?
            .click()
            .await?;

        driver
            .query(By::XPath(
                "//div[@id='EXPORT_ALL' and contains(@class,'clickable')]",
            ))
            .first()
            .await?
            .click()
            .await?;

        tracing::info!("Selecting CSV export format...");
        let export_modal = driver
            .query(By::XPath(
                "//div[@role='dialog' and contains(@class,'modal-bubble')]",
            ))
            .first()
            .await?;
        export_modal
            .find(By::XPath(
                ".//div[contains(@class,'custom-button-tab-label') and text()='CSV']\
/parent::div[@tabindex='0']",
            ))
            .await?
            .click()
            .await?;

        driver
            .query(By::Id("model-confirm-button"))
            .first()
            .await?
            .click()
            .await?;
        tracing::info!("Export initiated...");

        tracing::info!("Waiting for download link...");
        let download_link = driver
            .query(By::XPath(
                "//div[contains(@class,'notification-renderer-item')]\
//div[contains(@class,'info-title')]\
//a[contains(@href,'.csv') and contains(text(),'here')]",
            ))
            .first()
            .await?;
        let download_url = download_link
            .attr("href")
            .await?
            .ok_or_else(|| GrabError::scrape("Download link has no href"))?;
        tracing::info!("Download URL obtained: {}", download_url);

        driver.goto(&download_url).await?;
        tracing::info!("Downloading CSV file...");
        tokio::time::sleep(Duration::from_secs(10)).await;

        let latest = export::latest_csv_in(&self.settings.downloads_dir)?;
        let new_filename = format!(
            "talkwalker_{}_{}_{}_{}_{}.csv",
            export::sanitize_component(&project.name),
            export::sanitize_component(&category.name),
            export::sanitize_component(&topic.name),
            period.data_id(),
            export::timestamp()
        );
        let new_path = self.settings.downloads_dir.join(new_filename);
        std::fs::rename(&latest, &new_path)?;
        tracing::info!("CSV file saved as: {}", new_path.display());

        Ok(new_path)
    }
}
