use std::path::Path;
use std::sync::LazyLock;

use anyhow::{bail, Context, Result};
use regex::Regex;
use tracing::{debug, error};

use crate::config::proc_validator;
use crate::config::settings::{LoggingConfig, ServiceConfig};
use crate::observability::metrics::get_metrics;

static ENV_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{(\w+)(?::([^\}]+))?\}").expect("env placeholder pattern is valid")
});

/// Load and validate config from YAML file
pub async fn file_to_config(path: &Path) -> Result<ServiceConfig> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    parse_config(&content).await
}

/// Expand `${VAR}` / `${VAR:default}` placeholders, parse, apply defaults, validate.
pub async fn parse_config(content: &str) -> Result<ServiceConfig> {
    let metrics = get_metrics().await;
    let expanded = expand_env_vars(content);
    let mut service_config: ServiceConfig = serde_yaml::from_str(&expanded)
        .inspect_err(|e| {
            error!("parse config error: {}", e);
            metrics.config_validation_errors.inc();
        })?;

    // Apply defaults
    if service_config.settings.logging.is_none() {
        service_config.settings.logging = Some(LoggingConfig::default());
    }

    debug!("validation config ...");
    if let Err(errors) = proc_validator::validate_service_config(&service_config).await {
        bail!("config is not valid: {}", errors.join("; "));
    }

    Ok(service_config)
}

pub fn expand_env_vars(input: &str) -> String {
    ENV_PLACEHOLDER
        .replace_all(input, |caps: &regex::Captures| {
            let var = &caps[1];
            let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            std::env::var(var).unwrap_or_else(|_| default.to_string())
        })
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn placeholders_use_env_then_default() {
        std::env::set_var("EVENT_RELAY_TEST_PORT", "8088");
        std::env::remove_var("EVENT_RELAY_TEST_HOST");
        let out = expand_env_vars("host: ${EVENT_RELAY_TEST_HOST:127.0.0.1}\nport: ${EVENT_RELAY_TEST_PORT:3001}\nx: ${EVENT_RELAY_TEST_HOST}");
        assert_eq!(out, "host: 127.0.0.1\nport: 8088\nx: ");
        std::env::remove_var("EVENT_RELAY_TEST_PORT");
    }

    #[test]
    fn text_without_placeholders_is_unchanged() {
        let input = "settings:\n  server: { host: 0.0.0.0, port: \"3001\" }\n";
        assert_eq!(expand_env_vars(input), input);
    }
}
