use anyhow::{Context, Result};
use toml_edit::DocumentMut;

use crate::config::{self, Config};

const VALID_KEYS: &str = "database_path, url_prefix";

/// Show the effective configuration.
pub fn show_config(config: &Config) -> Result<()> {
    println!("Current Configuration");
    println!("=====================\n");

    let config_path = config::config_file_path();
    println!("Config file: {}", config_path.display());
    let exists = config_path.exists();
    println!("File exists: {}\n", if exists { "yes" } else { "no (using defaults)" });

    println!("Settings:");
    print!("{}", toml::to_string_pretty(config).context("Failed to render configuration")?);

    println!("\nPriority: CLI args > ENV vars (SHELFMARK_*) > Config file > Defaults");

    Ok(())
}

/// Print a single top-level value.
pub fn get_config(config: &Config, key: &str) -> Result<()> {
    match key {
        "database_path" => println!("{}", config.database_path.display()),
        "url_prefix" => println!("{}", config.url_prefix),
        _ => anyhow::bail!("Unknown config key: {key}\n\nValid keys: {VALID_KEYS}"),
    }
    Ok(())
}

/// Set a top-level value in the config file, creating the file if needed.
pub fn set_config(key: &str, value: &str) -> Result<()> {
    if !matches!(key, "database_path" | "url_prefix") {
        anyhow::bail!("Unknown config key: {key}\n\nValid keys: {VALID_KEYS}");
    }

    let config_path = config::config_file_path();
    config::ensure_config_file()?;
    let contents = std::fs::read_to_string(&config_path).context("Failed to read config file")?;

    let updated = set_top_level(&contents, key, value)?;
    std::fs::write(&config_path, updated).context("Failed to write config file")?;

    println!("✓ Updated {key} = {value}");
    println!("  in {}", config_path.display());
    Ok(())
}

pub fn show_path() -> Result<()> {
    println!("{}", config::config_file_path().display());
    Ok(())
}

pub fn show_example() -> Result<()> {
    print!("{}", config::example_config());
    Ok(())
}

pub fn init_config() -> Result<()> {
    let created = config::ensure_config_file()?;
    let config_path = config::config_file_path();

    if created {
        println!("✓ Created config file: {}", config_path.display());
        println!("\nEdit this file to configure shelfmark.");
    } else {
        println!("Config file already exists: {}", config_path.display());
    }

    Ok(())
}

/// Set a top-level string value, keeping the rest of the document as written.
fn set_top_level(contents: &str, key: &str, value: &str) -> Result<String> {
    let mut doc: DocumentMut = contents.parse().context("Failed to parse config file")?;
    doc[key] = toml_edit::value(value);
    Ok(doc.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_existing_key() {
        let input = "url_prefix = \"/catalog\"\n\n[logging]\nlevel = \"info\"\n";
        let out = set_top_level(input, "url_prefix", "/library").unwrap();
        let parsed: Config = toml::from_str(&out).unwrap();
        assert_eq!(parsed.url_prefix, "/library");
        assert_eq!(parsed.logging.level, "info");
    }

    #[test]
    fn test_set_quoted_key_does_not_duplicate() {
        let input = "\"url_prefix\" = \"/catalog\"\n\n[logging]\nlevel = \"info\"\n";
        let out = set_top_level(input, "url_prefix", "/library").unwrap();
        let parsed: Config = toml::from_str(&out).unwrap();
        assert_eq!(parsed.url_prefix, "/library");
        assert_eq!(out.matches("url_prefix").count(), 1);
    }

    #[test]
    fn test_set_missing_key_stays_top_level() {
        let input = "# comment\n[logging]\nlevel = \"debug\"\n";
        let out = set_top_level(input, "database_path", "/tmp/c.db").unwrap();
        let parsed: Config = toml::from_str(&out).unwrap();
        assert_eq!(parsed.database_path, std::path::PathBuf::from("/tmp/c.db"));
        assert_eq!(parsed.logging.level, "debug");
        assert!(out.contains("# comment"));
    }

    #[test]
    fn test_set_keeps_commented_lines() {
        let out = set_top_level("#database_path = \"/old\"\n", "database_path", "/new").unwrap();
        assert!(out.contains("#database_path = \"/old\""));
        assert!(out.contains("database_path = \"/new\""));
    }

    #[test]
    fn test_set_on_example_config() {
        let out = set_top_level(config::example_config(), "url_prefix", "/books").unwrap();
        let parsed: Config = toml::from_str(&out).unwrap();
        assert_eq!(parsed.url_prefix, "/books");
    }

    #[test]
    fn test_set_rejects_malformed_file() {
        assert!(set_top_level("url_prefix = ", "url_prefix", "/x").is_err());
    }
}
