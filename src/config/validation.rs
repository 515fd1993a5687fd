//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid)
//! - Validate endpoint URLs
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BootstrapConfig → Result<(), Vec<ValidationError>>
//! - Production identity variables are checked by the identity loader, which
//!   reports them as a distinct configuration failure

use std::fmt;

use crate::config::schema::BootstrapConfig;

/// Upper bound for the local reachability probe.
pub const MAX_LOCAL_PROBE_TIMEOUT_MS: u64 = 1000;

/// Upper bound for the cache heartbeat period.
pub const MAX_HEARTBEAT_INTERVAL_SECS: u64 = 3600;

/// URL schemes the distributed cache client can open.
pub const CACHE_URL_SCHEMES: [&str; 4] = ["redis", "rediss", "redis+unix", "unix"];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    /// Human readable reason.
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &BootstrapConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for (field, value) in [
        ("network.mainnet_url", &config.network.mainnet_url),
        ("network.testnet_url", &config.network.testnet_url),
    ] {
        if let Err(e) = url::Url::parse(value) {
            errors.push(ValidationError::new(field, format!("invalid URL '{}': {}", value, e)));
        }
    }

    if config.network.local_port == 0 {
        errors.push(ValidationError::new("network.local_port", "must be non-zero"));
    }
    if config.network.probe_timeout_ms == 0
        || config.network.probe_timeout_ms > MAX_LOCAL_PROBE_TIMEOUT_MS
    {
        errors.push(ValidationError::new(
            "network.probe_timeout_ms",
            format!("must be between 1 and {}", MAX_LOCAL_PROBE_TIMEOUT_MS),
        ));
    }

    if let Some(cache_url) = &config.cache.url {
        match url::Url::parse(cache_url) {
            Ok(parsed) if !CACHE_URL_SCHEMES.contains(&parsed.scheme()) => {
                errors.push(ValidationError::new(
                    "cache.url",
                    format!(
                        "unsupported scheme '{}', expected one of {}",
                        parsed.scheme(),
                        CACHE_URL_SCHEMES.join(", ")
                    ),
                ));
            }
            Ok(_) => {}
            Err(e) => errors.push(ValidationError::new("cache.url", format!("invalid URL: {}", e))),
        }
    }
    if config.cache.connect_timeout_secs == 0 {
        errors.push(ValidationError::new("cache.connect_timeout_secs", "must be non-zero"));
    }
    if config.cache.command_timeout_secs == 0 {
        errors.push(ValidationError::new("cache.command_timeout_secs", "must be non-zero"));
    }
    if config.cache.heartbeat_interval_secs == 0
        || config.cache.heartbeat_interval_secs > MAX_HEARTBEAT_INTERVAL_SECS
    {
        errors.push(ValidationError::new(
            "cache.heartbeat_interval_secs",
            format!("must be between 1 and {}", MAX_HEARTBEAT_INTERVAL_SECS),
        ));
    }
    if config.cache.probe_timeout_ms == 0 {
        errors.push(ValidationError::new("cache.probe_timeout_ms", "must be non-zero"));
    }
    if config.cache.health_ttl_secs == 0 {
        errors.push(ValidationError::new("cache.health_ttl_secs", "must be non-zero"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&BootstrapConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = BootstrapConfig::default();
        config.network.local_port = 0;
        config.network.probe_timeout_ms = 5000;
        config.cache.url = Some("not a url".to_string());
        config.cache.health_ttl_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "network.local_port",
                "network.probe_timeout_ms",
                "cache.url",
                "cache.health_ttl_secs",
            ]
        );
    }

    #[test]
    fn test_cache_url_schemes() {
        let mut config = BootstrapConfig::default();
        for url in ["redis://cache:6379", "rediss://user:pw@managed.example:6380/0"] {
            config.cache.url = Some(url.to_string());
            assert!(validate_config(&config).is_ok(), "{} should be accepted", url);
        }

        config.cache.url = Some("http://cache:6379".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "cache.url");
        assert!(errors[0].message.contains("unsupported scheme 'http'"));
    }

    #[test]
    fn test_heartbeat_interval_bounded() {
        let mut config = BootstrapConfig::default();
        config.cache.heartbeat_interval_secs = MAX_HEARTBEAT_INTERVAL_SECS;
        assert!(validate_config(&config).is_ok());

        config.cache.heartbeat_interval_secs = u64::MAX;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "cache.heartbeat_interval_secs");
    }
}
