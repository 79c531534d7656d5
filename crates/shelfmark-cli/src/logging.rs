use anyhow::{Context, Result};
use twyg::{LogLevel, OptsBuilder};

use crate::config::LoggingConfig;

/// Install the global logger.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let opts = OptsBuilder::new()
        .coloured(config.coloured)
        .level(parse_level(&config.level)?)
        .build()
        .context("Failed to build logging options")?;
    twyg::setup(opts).context("Failed to set up logging")?;
    Ok(())
}

fn parse_level(level: &str) -> Result<LogLevel> {
    match level.trim().to_lowercase().as_str() {
        "trace" => Ok(LogLevel::Trace),
        "debug" => Ok(LogLevel::Debug),
        "info" => Ok(LogLevel::Info),
        "warn" | "warning" => Ok(LogLevel::Warn),
        "error" => Ok(LogLevel::Error),
        other => anyhow::bail!("Unknown log level: {other}\n\nValid levels: trace, debug, info, warn, error"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert!(matches!(parse_level("DEBUG"), Ok(LogLevel::Debug)));
        assert!(matches!(parse_level("warning"), Ok(LogLevel::Warn)));
        assert!(parse_level("loud").is_err());
    }
}
