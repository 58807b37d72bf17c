//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals > 0, concurrency > 0)
//! - Check that enabled alert channels are usable
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: MonitorConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::MonitorConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },

    #[error("{field} is not a valid socket address: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("webhook url must be an absolute http(s) URL: {0}")]
    InvalidWebhookUrl(String),

    #[error("email alerts enabled but {0} is missing")]
    IncompleteEmail(&'static str),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &MonitorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let monitor = &config.monitor;

    if monitor.interval_secs == 0 {
        errors.push(ValidationError::NotPositive { field: "monitor.interval_secs" });
    }
    if monitor.timeout_ms == 0 {
        errors.push(ValidationError::NotPositive { field: "monitor.timeout_ms" });
    }
    if monitor.max_concurrency == 0 {
        errors.push(ValidationError::NotPositive { field: "monitor.max_concurrency" });
    }
    if config.store.retention_per_target == 0 {
        errors.push(ValidationError::NotPositive { field: "store.retention_per_target" });
    }

    if config.api.enabled && config.api.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "api.bind_address",
            value: config.api.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    let webhook = &config.alerts.webhook;
    if webhook.enabled && !is_http_url(&webhook.url) {
        errors.push(ValidationError::InvalidWebhookUrl(webhook.url.clone()));
    }

    let email = &config.alerts.email;
    if email.enabled {
        if email.host.is_empty() {
            errors.push(ValidationError::IncompleteEmail("host"));
        }
        if email.from.is_empty() {
            errors.push(ValidationError::IncompleteEmail("from"));
        }
        if email.to.is_empty() {
            errors.push(ValidationError::IncompleteEmail("to"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// True for absolute `http` or `https` URLs.
pub fn is_http_url(raw: &str) -> bool {
    match url::Url::parse(raw) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.has_host(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&MonitorConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = MonitorConfig::default();
        config.monitor.interval_secs = 0;
        config.monitor.max_concurrency = 0;
        config.alerts.webhook.enabled = true;
        config.alerts.webhook.url = "not a url".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::NotPositive { field: "monitor.interval_secs" }));
        assert!(errors.contains(&ValidationError::InvalidWebhookUrl("not a url".into())));
    }

    #[test]
    fn test_zero_throttle_window_is_allowed() {
        let mut config = MonitorConfig::default();
        config.monitor.throttle_window_secs = 0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_enabled_email_requires_recipients() {
        let mut config = MonitorConfig::default();
        config.alerts.email.enabled = true;
        config.alerts.email.host = "smtp.example.com".into();
        config.alerts.email.from = "monitor@example.com".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::IncompleteEmail("to")]);
    }

    #[test]
    fn test_http_url_check() {
        assert!(is_http_url("https://example.com/health"));
        assert!(is_http_url("http://127.0.0.1:8080"));
        assert!(!is_http_url("ftp://example.com"));
        assert!(!is_http_url("example.com"));
    }
}
