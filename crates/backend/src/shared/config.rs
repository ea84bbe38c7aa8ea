use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub uzum: UzumConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

/// Параметры подключения к Uzum Market Seller API
#[derive(Debug, Deserialize, Clone)]
pub struct UzumConfig {
    pub base_url: String,
    /// Токен продавца; переменная окружения UZUM_API_TOKEN имеет приоритет
    #[serde(default)]
    pub api_token: String,
    /// Предпочтительный магазин; если у аккаунта его нет, берется первый
    #[serde(default)]
    pub preferred_shop_id: Option<i64>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_page_size() -> u32 {
    100
}

fn default_port() -> u16 {
    3000
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[database]
path = "target/db/app.db"

[uzum]
base_url = "https://api-seller.uzum.uz/api/seller-openapi"
timeout_secs = 30
page_size = 100

[server]
port = 3000
"#;

/// Load configuration from config.toml file
///
/// Search order:
/// 1. Next to the executable (for production)
/// 2. Falls back to embedded default config
pub fn load_config() -> anyhow::Result<Config> {
    let mut config = read_config_file()?;
    apply_env_overrides(&mut config);
    Ok(config)
}

fn read_config_file() -> anyhow::Result<Config> {
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let config_path = exe_dir.join("config.toml");

            if config_path.exists() {
                tracing::info!("Loading config from: {}", config_path.display());
                let contents = std::fs::read_to_string(&config_path)?;
                let config: Config = toml::from_str(&contents)?;
                return Ok(config);
            } else {
                tracing::warn!("config.toml not found at: {}", config_path.display());
            }
        }
    }

    tracing::info!("Using default embedded configuration");
    let config: Config = toml::from_str(DEFAULT_CONFIG)?;
    Ok(config)
}

fn apply_env_overrides(config: &mut Config) {
    if let Ok(token) = std::env::var("UZUM_API_TOKEN") {
        if !token.trim().is_empty() {
            config.uzum.api_token = token;
        }
    }
}

/// Get the database file path from configuration
/// Resolves relative paths relative to the executable directory
pub fn get_database_path(config: &Config) -> PathBuf {
    let db_path = Path::new(&config.database.path);

    if db_path.is_absolute() {
        return db_path.to_path_buf();
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            return exe_dir.join(db_path);
        }
    }

    PathBuf::from(&config.database.path)
}
