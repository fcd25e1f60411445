use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub news: NewsConfig,
    #[serde(default)]
    pub translation: TranslationConfig,
    #[serde(default)]
    pub newsletter: NewsletterConfig,
    #[serde(default)]
    pub smtp: SmtpConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Data directory path
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsConfig {
    /// NewsAPI key
    #[serde(default)]
    pub api_key: Option<String>,
    /// NewsAPI base URL (without trailing endpoint)
    #[serde(default = "default_news_base_url")]
    pub base_url: String,
    /// Topic query passed to the `everything` endpoint
    #[serde(default = "default_news_query")]
    pub query: String,
    /// Article language filter (ISO 639-1)
    #[serde(default = "default_news_language")]
    pub language: String,
    /// Sort order: "relevancy", "popularity" or "publishedAt"
    #[serde(default = "default_sort_by")]
    pub sort_by: String,
    /// Maximum number of articles per newsletter
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    /// HTTP proxy URL (e.g., "http://127.0.0.1:7890" or "socks5://127.0.0.1:1080")
    #[serde(default)]
    pub proxy_url: Option<String>,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_news_base_url(),
            query: default_news_query(),
            language: default_news_language(),
            sort_by: default_sort_by(),
            page_size: default_page_size(),
            request_timeout_secs: default_timeout(),
            proxy_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// Translate article titles and descriptions before rendering
    #[serde(default)]
    pub enabled: bool,
    /// Language the articles are written in
    #[serde(default = "default_source_language")]
    pub source_language: String,
    /// Language the newsletter is sent in
    #[serde(default = "default_target_language")]
    pub target_language: String,
    /// OpenAI API key
    #[serde(default)]
    pub openai_api_key: Option<String>,
    /// OpenAI model name
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            source_language: default_source_language(),
            target_language: default_target_language(),
            openai_api_key: None,
            openai_model: default_openai_model(),
        }
    }
}

/// Branding strings used by the HTML renderer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsletterConfig {
    /// Banner title at the top of the email
    #[serde(default = "default_title")]
    pub title: String,
    /// Section heading above the article list
    #[serde(default = "default_heading")]
    pub heading: String,
    /// Label placed before the date line
    #[serde(default = "default_date_label")]
    pub date_label: String,
    /// Link text for each article
    #[serde(default = "default_read_more_label")]
    pub read_more_label: String,
    /// Small note under each article (e.g. when translated)
    #[serde(default)]
    pub original_note: Option<String>,
    /// Subject line prefix; the date is appended
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,
}

impl Default for NewsletterConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            heading: default_heading(),
            date_label: default_date_label(),
            read_more_label: default_read_more_label(),
            original_note: None,
            subject_prefix: default_subject_prefix(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    /// SMTP server hostname
    #[serde(default = "default_smtp_host")]
    pub host: String,
    /// SMTP server port
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    /// SMTP username
    #[serde(default)]
    pub username: Option<String>,
    /// SMTP password (app password for Gmail)
    #[serde(default)]
    pub password: Option<String>,
    /// Sender address; falls back to the username
    #[serde(default)]
    pub from: Option<String>,
    /// TLS mode: "starttls", "tls" or "none"
    #[serde(default = "default_smtp_tls")]
    pub tls: String,
    /// Connection timeout in seconds
    #[serde(default = "default_smtp_timeout")]
    pub timeout_secs: u64,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: default_smtp_host(),
            port: default_smtp_port(),
            username: None,
            password: None,
            from: None,
            tls: default_smtp_tls(),
            timeout_secs: default_smtp_timeout(),
        }
    }
}

impl SmtpConfig {
    /// Sender address used in the From header
    pub fn sender(&self) -> Option<&str> {
        self.from.as_deref().or(self.username.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between schedule evaluations (1..=60)
    #[serde(default = "default_tick_interval")]
    pub tick_interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: default_tick_interval(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bulletin")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_news_base_url() -> String {
    "https://newsapi.org/v2".to_string()
}

fn default_news_query() -> String {
    r#"(San Francisco OR "Bay Area") AND (tech OR technology)"#.to_string()
}

fn default_news_language() -> String {
    "en".to_string()
}

fn default_sort_by() -> String {
    "relevancy".to_string()
}

fn default_page_size() -> u32 {
    5
}

fn default_timeout() -> u64 {
    30
}

fn default_source_language() -> String {
    "English".to_string()
}

fn default_target_language() -> String {
    "Italian".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_title() -> String {
    "Bay Area Tech & News Weekly".to_string()
}

fn default_heading() -> String {
    "Top Stories This Week".to_string()
}

fn default_date_label() -> String {
    "Week of".to_string()
}

fn default_read_more_label() -> String {
    "Read more".to_string()
}

fn default_subject_prefix() -> String {
    "Bay Area Tech & News".to_string()
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_smtp_tls() -> String {
    "starttls".to_string()
}

fn default_smtp_timeout() -> u64 {
    10
}

fn default_tick_interval() -> u64 {
    30
}

/// Expand tilde (~) in path to user's home directory
fn expand_tilde(path: &std::path::Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if let Some(stripped) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        } else if path_str == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
    }
    path.to_path_buf()
}

impl AppConfig {
    /// Load configuration from file (or defaults), then apply environment overrides
    pub fn load() -> crate::Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Read a config file as-is; a missing file yields the defaults
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Save configuration to file
    pub fn save(&self) -> crate::Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Override secrets and deployment settings from environment variables.
    ///
    /// Variables that are unset (or empty) leave the file value untouched.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("NEWS_API_KEY") {
            self.news.api_key = Some(key);
        }
        if let Some(user) = get("EMAIL_USER") {
            self.smtp.username = Some(user);
        }
        if let Some(password) = get("EMAIL_PASSWORD") {
            self.smtp.password = Some(password);
        }
        if let Some(from) = get("EMAIL_FROM") {
            self.smtp.from = Some(from);
        }
        if let Some(host) = get("SMTP_HOST") {
            self.smtp.host = host;
        }
        if let Some(port) = get("SMTP_PORT").and_then(|p| p.trim().parse().ok()) {
            self.smtp.port = port;
        }
        if let Some(key) = get("OPENAI_API_KEY") {
            self.translation.openai_api_key = Some(key);
        }
        if let Some(dir) = get("BULLETIN_DATA_DIR") {
            self.general.data_dir = PathBuf::from(dir);
        }
    }

    /// Reject settings the scheduler and provider cannot work with
    pub fn validate(&self) -> crate::Result<()> {
        if !(1..=60).contains(&self.scheduler.tick_interval_secs) {
            return Err(crate::Error::Config(format!(
                "scheduler.tick_interval_secs must be between 1 and 60, got {}",
                self.scheduler.tick_interval_secs
            )));
        }
        if !(1..=100).contains(&self.news.page_size) {
            return Err(crate::Error::Config(format!(
                "news.page_size must be between 1 and 100, got {}",
                self.news.page_size
            )));
        }
        Ok(())
    }

    /// Get the configuration file path
    /// Always uses ~/.config/bulletin/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("bulletin")
            .join("config.toml")
    }

    /// Get the database file path
    pub fn database_path(&self) -> PathBuf {
        self.data_dir().join("bulletin.db")
    }

    /// Get the data directory (with tilde expansion)
    pub fn data_dir(&self) -> PathBuf {
        expand_tilde(&self.general.data_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [news]
            page_size = 3

            [smtp]
            username = "sender@example.com"
            "#,
        )
        .unwrap();

        assert_eq!(config.news.page_size, 3);
        assert_eq!(config.news.sort_by, "relevancy");
        assert_eq!(config.smtp.port, 587);
        assert_eq!(config.smtp.sender(), Some("sender@example.com"));
        assert_eq!(config.scheduler.tick_interval_secs, 30);
        assert!(!config.translation.enabled);
    }

    #[test]
    fn test_env_overrides_secrets() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("NEWS_API_KEY", "news-key"),
            ("EMAIL_USER", "me@example.com"),
            ("EMAIL_PASSWORD", "app-pass"),
            ("SMTP_PORT", "2525"),
            ("OPENAI_API_KEY", ""),
        ]);

        let mut config = AppConfig::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.news.api_key.as_deref(), Some("news-key"));
        assert_eq!(config.smtp.username.as_deref(), Some("me@example.com"));
        assert_eq!(config.smtp.password.as_deref(), Some("app-pass"));
        assert_eq!(config.smtp.port, 2525);
        assert_eq!(config.translation.openai_api_key, None);
    }

    #[test]
    fn test_validate_rejects_slow_tick() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_ok());

        config.scheduler.tick_interval_secs = 90;
        assert!(matches!(config.validate(), Err(crate::Error::Config(_))));

        config.scheduler.tick_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let path = std::env::temp_dir()
            .join(format!("bulletin-config-{}", uuid::Uuid::new_v4()))
            .join("config.toml");

        let mut config = AppConfig::default();
        config.news.page_size = 8;
        config.smtp.from = Some("digest@example.com".to_string());
        config.translation.enabled = true;
        config.newsletter.original_note = Some("Articolo originale in inglese".to_string());
        config.save_to(&path).unwrap();

        let reloaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(reloaded.news.page_size, 8);
        assert_eq!(reloaded.smtp.from.as_deref(), Some("digest@example.com"));
        assert_eq!(reloaded.smtp.password, None);
        assert!(reloaded.translation.enabled);
        assert_eq!(
            reloaded.newsletter.original_note.as_deref(),
            Some("Articolo originale in inglese")
        );
        assert_eq!(reloaded.scheduler.tick_interval_secs, 30);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let path = std::env::temp_dir().join(format!("bulletin-missing-{}.toml", uuid::Uuid::new_v4()));
        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.news.page_size, 5);
    }

    #[test]
    fn test_italian_example_config() {
        let config: AppConfig = toml::from_str(include_str!("../config.example.toml")).unwrap();
        assert!(config.validate().is_ok());
        assert!(config.translation.enabled);
        assert_eq!(config.translation.target_language, "Italian");
        assert_eq!(
            config.newsletter.original_note.as_deref(),
            Some("Articolo originale in inglese")
        );
    }

    #[test]
    fn test_expand_tilde_leaves_absolute_paths() {
        let path = PathBuf::from("/var/lib/bulletin");
        assert_eq!(expand_tilde(&path), path);
    }
}
