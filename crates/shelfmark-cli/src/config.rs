use anyhow::{Context, Result};
use confyg::{env, Confygery};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for shelfmark.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (SHELFMARK_* prefix)
/// 3. Config file (~/.config/shelfmark/config.toml)
/// 4. Built-in defaults (lowest priority)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the SQLite catalog database.
    ///
    /// Can be set via:
    /// - CLI: --db /path/to/db
    /// - ENV: SHELFMARK_DATABASE_PATH
    /// - Config: database_path = "/path/to/db"
    #[serde(default = "default_db_path")]
    pub database_path: PathBuf,

    /// Prefix the catalog's routes are mounted under.
    #[serde(default = "default_url_prefix")]
    pub url_prefix: String,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// One of: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_coloured")]
    pub coloured: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            coloured: default_coloured(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_db_path(),
            url_prefix: default_url_prefix(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        let config_path = config_file_path();

        let mut builder = Confygery::new().context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder
                .add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("shelfmark");
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        let config: Self = builder.build().context("Failed to build configuration")?;

        Ok(config)
    }

    /// Load configuration, overriding the database path (the --db flag).
    pub fn load_with_db_path(db_path: PathBuf) -> Result<Self> {
        let mut config = Self::load()?;
        config.database_path = db_path;
        Ok(config)
    }
}

/// Returns: ~/.local/share/shelfmark/catalog.db (or platform equivalent)
fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("shelfmark")
        .join("catalog.db")
}

fn default_url_prefix() -> String {
    "/catalog".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

const fn default_coloured() -> bool {
    true
}

/// Returns:
/// - Linux: ~/.config/shelfmark/config.toml
/// - macOS: ~/Library/Application Support/shelfmark/config.toml
/// - Windows: %APPDATA%\shelfmark\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("shelfmark")
        .join("config.toml")
}

pub fn example_config() -> &'static str {
    r#"# Shelfmark Configuration File
#
# Priority: CLI arguments > environment (SHELFMARK_*) > this file > defaults

# Path to the SQLite catalog database
#
# Can also be set via:
# - CLI: shelfmark --db /custom/path.db status
# - Environment: SHELFMARK_DATABASE_PATH=/custom/path.db
#
# Default: Platform-specific data directory
#database_path = "/path/to/custom/catalog.db"

# Prefix for catalog page addresses (book-detail, author-detail, ...)
url_prefix = "/catalog"

[logging]
# trace, debug, info, warn or error
level = "info"
coloured = true
"#
}

/// Create the config file from the example if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
pub fn ensure_config_file() -> Result<bool> {
    let config_path = config_file_path();

    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    std::fs::write(&config_path, example_config()).context("Failed to write config file")?;

    Ok(true)
}
