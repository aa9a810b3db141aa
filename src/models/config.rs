//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Page to poll and how to request it
    #[serde(default)]
    pub target: TargetConfig,

    /// Selectors used to pull chapters out of the page
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Telegram delivery settings
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Loop timing and ordering
    #[serde(default)]
    pub poll: PollConfig,

    /// Where the notified record lives
    #[serde(default)]
    pub storage: StorageConfig,

    /// Outgoing message layout
    #[serde(default)]
    pub message: MessageConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        let target = self.target.url.trim();
        if target.is_empty() {
            return Err(AppError::validation("target.url is empty"));
        }
        let parsed = url::Url::parse(target)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AppError::validation(format!(
                "target.url must be http(s), got '{}'",
                parsed.scheme()
            )));
        }
        if self.target.user_agent.trim().is_empty() {
            return Err(AppError::validation("target.user_agent is empty"));
        }
        if self.target.timeout_secs == 0 {
            return Err(AppError::validation("target.timeout_secs must be > 0"));
        }
        if self.telegram.bot_token.trim().is_empty() {
            return Err(AppError::validation("telegram.bot_token is empty"));
        }
        if self.telegram.chat_id.trim().is_empty() {
            return Err(AppError::validation("telegram.chat_id is empty"));
        }
        if self.poll.interval_secs == 0 {
            return Err(AppError::validation("poll.interval_secs must be > 0"));
        }
        if self.extractor.max_items == 0 {
            return Err(AppError::validation("extractor.max_items must be > 0"));
        }
        if self.storage.file.trim().is_empty() {
            return Err(AppError::validation("storage.file is empty"));
        }
        self.extractor.compile()?;
        Ok(())
    }

    /// Full path of the state file.
    pub fn state_path(&self) -> PathBuf {
        self.storage.dir.join(&self.storage.file)
    }
}

/// The page being watched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Chapter listing URL
    #[serde(default)]
    pub url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// CSS selectors for chapter entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Selector matching one element per chapter (carries the link)
    #[serde(default = "defaults::item_selector")]
    pub item_selector: String,

    /// Selector for the title, relative to the item
    #[serde(default = "defaults::title_selector")]
    pub title_selector: String,

    /// Selector for the chapter number, relative to the item
    #[serde(default = "defaults::number_selector")]
    pub number_selector: Option<String>,

    /// Attribute on the item holding the chapter link
    #[serde(default = "defaults::link_attr")]
    pub link_attr: String,

    /// Only the first N entries on the page are considered
    #[serde(default = "defaults::max_items")]
    pub max_items: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            item_selector: defaults::item_selector(),
            title_selector: defaults::title_selector(),
            number_selector: defaults::number_selector(),
            link_attr: defaults::link_attr(),
            max_items: defaults::max_items(),
        }
    }
}

/// Parsed selectors, ready to run against a document.
#[derive(Debug, Clone)]
pub struct CompiledSelectors {
    pub item: Selector,
    pub title: Selector,
    pub number: Option<Selector>,
}

impl ExtractorConfig {
    /// Parse the configured selectors.
    pub fn compile(&self) -> Result<CompiledSelectors> {
        let number = match self.number_selector.as_deref() {
            Some(s) if !s.trim().is_empty() => Some(parse_selector(s)?),
            _ => None,
        };
        Ok(CompiledSelectors {
            item: parse_selector(&self.item_selector)?,
            title: parse_selector(&self.title_selector)?,
            number,
        })
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| AppError::selector(selector, format!("{e:?}")))
}

/// Telegram bot credentials and destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,

    #[serde(default)]
    pub chat_id: String,

    /// Bot API root, without trailing slash
    #[serde(default = "defaults::api_base")]
    pub api_base: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_id: String::new(),
            api_base: defaults::api_base(),
        }
    }
}

/// Order in which new chapters are announced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyOrder {
    /// As listed on the page
    #[default]
    Page,
    /// Ascending by identifier
    Identifier,
}

/// Poll loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Delay between cycles in seconds
    #[serde(default = "defaults::interval")]
    pub interval_secs: u64,

    /// Exit after the first cycle that gets past fetching
    #[serde(default)]
    pub run_once: bool,

    #[serde(default)]
    pub order: NotifyOrder,
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: defaults::interval(),
            run_once: false,
            order: NotifyOrder::default(),
        }
    }
}

/// State file location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "defaults::storage_dir")]
    pub dir: PathBuf,

    #[serde(default = "defaults::storage_file")]
    pub file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: defaults::storage_dir(),
            file: defaults::storage_file(),
        }
    }
}

/// Message layout settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageConfig {
    /// Placeholders: `{title}`, `{number}`, `{heading}`, `{url}`
    #[serde(default = "defaults::template")]
    pub template: String,

    /// Titles longer than this (in graphemes) are cut with an ellipsis
    #[serde(default = "defaults::max_title_chars")]
    pub max_title_chars: usize,
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            template: defaults::template(),
            max_title_chars: defaults::max_title_chars(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/115.0.0.0 Safari/537.36"
            .into()
    }
    pub fn timeout() -> u64 {
        60
    }

    pub fn item_selector() -> String {
        "div.chapter-card-desktop > a.chapter-link-desktop".into()
    }
    pub fn title_selector() -> String {
        ".chapter-title".into()
    }
    pub fn number_selector() -> Option<String> {
        Some(".chapter-number".into())
    }
    pub fn link_attr() -> String {
        "href".into()
    }
    pub fn max_items() -> usize {
        15
    }

    pub fn api_base() -> String {
        "https://api.telegram.org".into()
    }

    pub fn interval() -> u64 {
        300
    }

    pub fn storage_dir() -> PathBuf {
        PathBuf::from("data")
    }
    pub fn storage_file() -> String {
        "notified.json".into()
    }

    pub fn template() -> String {
        "⭐️ New chapter!\n📚 {heading}\n🔗 {url}".into()
    }
    pub fn max_title_chars() -> usize {
        200
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.target.url = "https://example.com/manga/one".to_string();
        config.telegram.bot_token = "123:abc".to_string();
        config.telegram.chat_id = "-100200".to_string();
        config
    }

    #[test]
    fn validate_filled_config_ok() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_default_config() {
        assert!(Config::default().validate().is_err());
    }

    #[test]
    fn validate_rejects_non_http_target() {
        let mut config = valid_config();
        config.target.url = "ftp://example.com/list".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_interval() {
        let mut config = valid_config();
        config.poll.interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_selector() {
        let mut config = valid_config();
        config.extractor.item_selector = "div[".to_string();
        assert!(matches!(
            config.validate(),
            Err(AppError::Selector { .. })
        ));
    }

    #[test]
    fn parses_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [target]
            url = "https://example.com/title/42"

            [poll]
            interval_secs = 60
            order = "identifier"
            "#,
        )
        .unwrap();

        assert_eq!(config.target.url, "https://example.com/title/42");
        assert_eq!(config.target.timeout_secs, 60);
        assert_eq!(config.poll.interval(), Duration::from_secs(60));
        assert_eq!(config.poll.order, NotifyOrder::Identifier);
        assert_eq!(config.extractor.max_items, 15);
        assert_eq!(config.state_path(), PathBuf::from("data/notified.json"));
    }
}
