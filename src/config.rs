use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub scraper: ScraperSettings,
    #[serde(default)]
    pub ai: AiSettings,
    #[serde(default)]
    pub telegram: TelegramSettings,
    #[serde(default)]
    pub vk: VkSettings,
    #[serde(default)]
    pub scheduler: SchedulerSettings,
    #[serde(default)]
    pub uploads: UploadSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    #[serde(default = "default_admin_username")]
    pub admin_username: String,
    /// Hex-encoded SHA-256 of the admin password
    #[serde(default)]
    pub admin_password_sha256: String,
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            admin_username: default_admin_username(),
            admin_password_sha256: String::new(),
            jwt_secret: String::new(),
            token_ttl_hours: default_token_ttl_hours(),
        }
    }
}

fn default_admin_username() -> String { "admin".to_string() }
fn default_token_ttl_hours() -> i64 { 12 }

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_cache_capacity")]
    pub capacity: u64,
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            ttl_secs: default_cache_ttl(),
        }
    }
}

fn default_cache_capacity() -> u64 { 1000 }
fn default_cache_ttl() -> u64 { 60 }

#[derive(Debug, Clone, Deserialize)]
pub struct ScraperSettings {
    #[serde(default = "default_source_url")]
    pub source_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_items")]
    pub max_items: usize,
    #[serde(default)]
    pub min_title_chars: usize,
    #[serde(default = "default_card_selectors")]
    pub card_selectors: Vec<String>,
    #[serde(default = "default_image_selector")]
    pub image_selector: String,
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            source_url: default_source_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_http_timeout(),
            max_items: default_max_items(),
            min_title_chars: 0,
            card_selectors: default_card_selectors(),
            image_selector: default_image_selector(),
        }
    }
}

fn default_source_url() -> String { "https://sberanalytics.ru/products".to_string() }
fn default_user_agent() -> String { concat!("kupets-api/", env!("CARGO_PKG_VERSION")).to_string() }
fn default_http_timeout() -> u64 { 10 }
fn default_max_items() -> usize { 20 }
fn default_card_selectors() -> Vec<String> {
    vec![
        "li.section-card-product__list".to_string(),
        "article".to_string(),
        "div.news-item".to_string(),
    ]
}
fn default_image_selector() -> String { "img.section-card-product__img-product".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct AiSettings {
    #[serde(default = "default_ai_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_ai_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_ai_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_batch_size")]
    pub batch_size: i64,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            base_url: default_ai_base_url(),
            api_key: None,
            model: default_ai_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_ai_timeout(),
            batch_size: default_batch_size(),
            system_prompt: default_system_prompt(),
        }
    }
}

fn default_ai_base_url() -> String { "https://api.polza.ai".to_string() }
fn default_ai_model() -> String { "openai/gpt-4o-mini".to_string() }
fn default_temperature() -> f32 { 0.7 }
fn default_max_tokens() -> u32 { 300 }
fn default_ai_timeout() -> u64 { 30 }
fn default_batch_size() -> i64 { 5 }
fn default_system_prompt() -> String {
    "Ты - редактор новостного канала для бизнеса. Перепиши короткое описание продукта \
     в интересную новость для Telegram-канала. Добавь эмодзи, сделай текст живым и \
     привлекательным. Максимум 3-4 предложения."
        .to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramSettings {
    #[serde(default = "default_telegram_api")]
    pub api_base: String,
    #[serde(default)]
    pub bot_token: Option<String>,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

impl Default for TelegramSettings {
    fn default() -> Self {
        Self {
            api_base: default_telegram_api(),
            bot_token: None,
            channel_id: None,
            timeout_secs: default_http_timeout(),
        }
    }
}

fn default_telegram_api() -> String { "https://api.telegram.org".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct VkSettings {
    #[serde(default = "default_vk_api")]
    pub api_base: String,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default = "default_vk_version")]
    pub api_version: String,
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

impl Default for VkSettings {
    fn default() -> Self {
        Self {
            api_base: default_vk_api(),
            access_token: None,
            group_id: None,
            api_version: default_vk_version(),
            timeout_secs: default_http_timeout(),
        }
    }
}

fn default_vk_api() -> String { "https://api.vk.com/method".to_string() }
fn default_vk_version() -> String { "5.199".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,
    #[serde(default = "default_publish_batch")]
    pub publish_batch: i64,
    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_minutes: default_interval_minutes(),
            publish_batch: default_publish_batch(),
            log_capacity: default_log_capacity(),
        }
    }
}

fn default_interval_minutes() -> u64 { 30 }
fn default_publish_batch() -> i64 { 3 }
fn default_log_capacity() -> usize { 50 }

#[derive(Debug, Clone, Deserialize)]
pub struct UploadSettings {
    #[serde(default = "default_upload_dir")]
    pub dir: String,
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_bytes: usize,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            dir: default_upload_dir(),
            public_base_url: default_public_base_url(),
            max_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_upload_dir() -> String { "uploads".to_string() }
fn default_public_base_url() -> String { "http://localhost:8080/api/v1".to_string() }
fn default_max_upload_bytes() -> usize { 2 * 1024 * 1024 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with KUPETS__)
    /// 5. Well-known plain variables such as DATABASE_URL or TELEGRAM_BOT_TOKEN
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., KUPETS__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("KUPETS")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        apply_overrides(settings, process_env)?.try_deserialize()
    }

    /// Load configuration from a custom path, with the same environment overrides as [`Settings::load`]
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("KUPETS")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        apply_overrides(settings, process_env)?.try_deserialize()
    }
}

/// Plain environment variables that override their config keys when set.
///
/// These are the names the hosting platform exposes secrets under.
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("DATABASE_URL", "database.url"),
    ("ADMIN_USERNAME", "auth.admin_username"),
    ("ADMIN_PASSWORD_SHA256", "auth.admin_password_sha256"),
    ("JWT_SECRET", "auth.jwt_secret"),
    ("AI_API_KEY", "ai.api_key"),
    ("POLZA_AI_API_KEY", "ai.api_key"),
    ("TELEGRAM_BOT_TOKEN", "telegram.bot_token"),
    ("TELEGRAM_CHANNEL_ID", "telegram.channel_id"),
    ("VK_ACCESS_TOKEN", "vk.access_token"),
    ("VK_GROUP_ID", "vk.group_id"),
];

fn process_env(var: &str) -> Option<String> {
    std::env::var(var).ok()
}

fn apply_overrides(
    settings: Config,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Config, ConfigError> {
    let mut builder = Config::builder().add_source(settings);

    for (var, key) in ENV_OVERRIDES {
        if let Some(value) = lookup(var).filter(|value| !value.is_empty()) {
            builder = builder.set_override(*key, value)?;
        }
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_scraper_settings() {
        let scraper = ScraperSettings::default();
        assert_eq!(scraper.source_url, "https://sberanalytics.ru/products");
        assert_eq!(scraper.max_items, 20);
        assert_eq!(scraper.card_selectors[0], "li.section-card-product__list");
    }

    #[test]
    fn test_default_ai_settings() {
        let ai = AiSettings::default();
        assert_eq!(ai.model, "openai/gpt-4o-mini");
        assert_eq!(ai.max_tokens, 300);
        assert_eq!(ai.batch_size, 5);
        assert!(ai.api_key.is_none());
    }

    #[test]
    fn test_default_logging() {
        let level = default_log_level();
        let format = default_log_format();
        assert_eq!(level, "info");
        assert_eq!(format, "json");
    }

    #[test]
    fn test_load_minimal_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
host = "127.0.0.1"
port = 9000

[database]
url = "postgres://localhost/kupets"

[scheduler]
enabled = true
interval_minutes = 15
"#
        )
        .unwrap();

        let settings = Settings::load_from(file.path()).unwrap();
        assert_eq!(settings.server.port, 9000);
        assert!(settings.scheduler.enabled);
        assert_eq!(settings.scheduler.interval_minutes, 15);
        assert_eq!(settings.scheduler.publish_batch, 3);
        assert_eq!(settings.telegram.api_base, "https://api.telegram.org");
        assert_eq!(settings.auth.admin_username, "admin");
    }

    #[test]
    fn test_plain_overrides_apply_to_file_settings() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
host = "127.0.0.1"
port = 8080

[database]
url = "postgres://localhost/kupets"

[telegram]
channel_id = "@from_file"
"#
        )
        .unwrap();

        let config = Config::builder()
            .add_source(File::from(file.path()))
            .build()
            .unwrap();
        let settings: Settings = apply_overrides(config, |var| match var {
            "DATABASE_URL" => Some("postgres://db.internal/kupets".to_string()),
            "TELEGRAM_BOT_TOKEN" => Some("123:abc".to_string()),
            "TELEGRAM_CHANNEL_ID" => Some(String::new()),
            _ => None,
        })
        .unwrap()
        .try_deserialize()
        .unwrap();

        assert_eq!(settings.database.url, "postgres://db.internal/kupets");
        assert_eq!(settings.telegram.bot_token.as_deref(), Some("123:abc"));
        assert_eq!(settings.telegram.channel_id.as_deref(), Some("@from_file"));
    }
}
