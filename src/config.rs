use serde::{Deserialize, Serialize};

use std::{env, fs, path::Path};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Postgres DSN. Without one the in-memory store is used.
    #[serde(default)]
    pub database_dsn: Option<String>,
    #[serde(default = "default_scrape_url")]
    pub scrape_url: String,
    /// CSS selector for headings whose anchors become articles
    #[serde(default = "default_heading_selector")]
    pub heading_selector: String,
    /// Name of the single user that `/submit` appends notes to
    #[serde(default = "default_user")]
    pub default_user: String,
    #[serde(default)]
    pub public_dir: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

const fn default_port() -> u16 {
    3000
}

fn default_scrape_url() -> String {
    "http://www.tmz.com/".to_string()
}

fn default_heading_selector() -> String {
    "article h4".to_string()
}

fn default_user() -> String {
    "ShaToya Jones".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            database_dsn: None,
            scrape_url: default_scrape_url(),
            heading_selector: default_heading_selector(),
            default_user: default_user(),
            public_dir: None,
            user_agent: None,
            timeout_secs: None,
        }
    }
}

/// Environment variables take priority over values from a config file.
fn apply_env_overrides(
    mut config: Config,
    var: impl Fn(&str) -> Option<String>,
) -> Result<Config, Box<dyn std::error::Error>> {
    if let Some(port) = var("PORT") {
        config.port = port
            .parse::<u16>()
            .map_err(|e| format!("Failed to parse PORT: {e}"))?;
    }
    if let Some(dsn) = var("PG_DSN") {
        config.database_dsn = Some(dsn);
    }
    if let Some(url) = var("SCRAPE_URL") {
        config.scrape_url = url;
    }
    if let Some(selector) = var("HEADING_SELECTOR") {
        config.heading_selector = selector;
    }
    if let Some(name) = var("DEFAULT_USER") {
        config.default_user = name;
    }
    if let Some(dir) = var("PUBLIC_DIR") {
        config.public_dir = Some(dir);
    }
    if let Some(user_agent) = var("USER_AGENT") {
        config.user_agent = Some(user_agent);
    }
    if let Some(timeout) = var("TIMEOUT_SECS") {
        config.timeout_secs = Some(
            timeout
                .parse::<u64>()
                .map_err(|e| format!("Failed to parse TIMEOUT_SECS: {e}"))?,
        );
    }

    Ok(config)
}

fn load_from_file(path: &str) -> Result<Config, Box<dyn std::error::Error>> {
    let contents = fs::read_to_string(path)?;
    serde_yaml::from_str(&contents).map_err(Into::into)
}

pub fn load_config() -> Result<Config, Box<dyn std::error::Error>> {
    let config = load_base_config()?;
    apply_env_overrides(config, |key| env::var(key).ok())
}

fn load_base_config() -> Result<Config, Box<dyn std::error::Error>> {
    // Retrieve env variable
    let config_path = env::var("SCRAPER_CONFIG").unwrap_or_else(|_| "config.yaml".to_string());

    // Try env path
    if Path::new(&config_path).exists() {
        tracing::info!("Loading configuration from '{}'", config_path);
        return load_from_file(&config_path);
    }

    // Fallback to config.yaml
    if Path::new("config.yaml").exists() {
        tracing::warn!(
            "Config file '{}' not found, falling back to 'config.yaml'",
            config_path
        );
        return load_from_file("config.yaml");
    }

    // Fallback to config.example.yaml
    if Path::new("config.example.yaml").exists() {
        tracing::warn!(
            "Config file '{}' and 'config.yaml' not found, falling back to 'config.example.yaml'\
             \n This file should not be used and should be replaced with actual data",
            config_path
        );
        return load_from_file("config.example.yaml");
    }

    // Fallback to defaults
    tracing::info!(
        "No config file found, loading configuration from environment variables and defaults"
    );
    Ok(Config::default())
}
