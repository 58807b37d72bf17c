//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

use crate::config::schema::MonitorConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a TOML configuration file without validating it.
pub fn load_file(path: &Path) -> Result<MonitorConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Build the effective configuration: optional file, then environment, then validation.
pub fn resolve_config(path: Option<&Path>) -> Result<MonitorConfig, ConfigError> {
    let mut config = match path {
        Some(path) => load_file(path)?,
        None => MonitorConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay deployment environment variables onto `config`.
///
/// Unparseable numbers are ignored and the previous value stays.
pub fn apply_env_overrides<F>(config: &mut MonitorConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    set_parsed(&mut config.monitor.interval_secs, var("CHECK_INTERVAL_SECONDS"));
    set_parsed(&mut config.monitor.timeout_ms, var("TIMEOUT_MS"));
    set_parsed(&mut config.monitor.default_slow_ms, var("SLOW_MS"));
    set_parsed(&mut config.monitor.max_concurrency, var("MAX_CONCURRENCY"));

    if let Some(minutes) = var("ALERT_THROTTLE_MINUTES").and_then(|v| v.trim().parse::<u64>().ok()) {
        config.monitor.throttle_window_secs = minutes.saturating_mul(60);
    }

    if let Some(flag) = var("ALERT_ON_RECOVERY") {
        config.monitor.alert_on_recovery = flag == "true";
    }

    if let Some(port) = var("PORT") {
        if let Ok(port) = port.parse::<u16>() {
            config.api.bind_address = format!("0.0.0.0:{}", port);
        }
    }

    let email = &mut config.alerts.email;
    if let Some(host) = var("SMTP_HOST") {
        email.host = host;
    }
    set_parsed(&mut email.port, var("SMTP_PORT"));
    if let Some(user) = var("SMTP_USERNAME") {
        email.username = user;
    }
    if let Some(pass) = var("SMTP_PASSWORD") {
        email.password = pass;
    }
    if let Some(from) = var("SMTP_FROM") {
        email.from = from;
    }
    if let Some(list) = var("ALERT_EMAILS") {
        email.to = list
            .split(',')
            .map(str::trim)
            .filter(|addr| !addr.is_empty())
            .map(String::from)
            .collect();
        email.enabled = !email.to.is_empty();
    }

    let webhook = &mut config.alerts.webhook;
    if let Some(flag) = var("ENABLE_DISCORD") {
        webhook.enabled = flag == "true";
    }
    if let Some(url) = var("DISCORD_WEBHOOK_URL") {
        webhook.url = url;
    }
    // Nothing to post to.
    if webhook.enabled && webhook.url.is_empty() {
        tracing::warn!("Webhook alerts enabled without DISCORD_WEBHOOK_URL, disabling");
        webhook.enabled = false;
    }

    if let Some(level) = var("LOG_LEVEL") {
        config.observability.log_level = level;
    }
}

fn set_parsed<T: FromStr>(slot: &mut T, raw: Option<String>) {
    if let Some(raw) = raw {
        if let Ok(value) = raw.trim().parse::<T>() {
            *slot = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_overrides_engine_settings() {
        let mut config = MonitorConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("CHECK_INTERVAL_SECONDS", "30"),
                ("TIMEOUT_MS", "1500"),
                ("SLOW_MS", "800"),
                ("ALERT_THROTTLE_MINUTES", "5"),
                ("ALERT_ON_RECOVERY", "true"),
                ("PORT", "9000"),
            ]),
        );

        assert_eq!(config.monitor.interval_secs, 30);
        assert_eq!(config.monitor.timeout_ms, 1500);
        assert_eq!(config.monitor.default_slow_ms, 800);
        assert_eq!(config.monitor.throttle_window_secs, 300);
        assert!(config.monitor.alert_on_recovery);
        assert_eq!(config.api.bind_address, "0.0.0.0:9000");
    }

    #[test]
    fn test_bad_numbers_keep_defaults() {
        let mut config = MonitorConfig::default();
        apply_env_overrides(&mut config, env(&[("CHECK_INTERVAL_SECONDS", "soon"), ("SMTP_PORT", "-1")]));
        assert_eq!(config.monitor.interval_secs, 60);
        assert_eq!(config.alerts.email.port, 1025);
    }

    #[test]
    fn test_alert_emails_enable_email_channel() {
        let mut config = MonitorConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[("ALERT_EMAILS", " a@example.com, ,b@example.com "), ("SMTP_HOST", "mail")]),
        );
        assert!(config.alerts.email.enabled);
        assert_eq!(config.alerts.email.to, vec!["a@example.com", "b@example.com"]);
        assert_eq!(config.alerts.email.host, "mail");
    }

    #[test]
    fn test_discord_requires_url() {
        let mut config = MonitorConfig::default();
        apply_env_overrides(&mut config, env(&[("ENABLE_DISCORD", "true")]));
        assert!(!config.alerts.webhook.enabled);

        let mut config = MonitorConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[("ENABLE_DISCORD", "true"), ("DISCORD_WEBHOOK_URL", "https://discord.test/hook")]),
        );
        assert!(config.alerts.webhook.enabled);
    }

    #[test]
    fn test_validation_error_display() {
        let err = ConfigError::Validation(vec![
            ValidationError::NotPositive { field: "monitor.interval_secs" },
            ValidationError::IncompleteEmail("from"),
        ]);
        assert_eq!(
            err.to_string(),
            "Validation failed: monitor.interval_secs must be greater than zero, email alerts enabled but from is missing"
        );
    }
}
