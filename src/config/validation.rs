//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and required
//! command lines. All problems are returned together, not just the first.

use std::fmt;

use crate::config::schema::BootConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
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

/// Validate a fully merged configuration.
pub fn validate_config(config: &BootConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let readiness = &config.readiness;

    if readiness.interval_ms == 0 {
        errors.push(ValidationError::new("readiness.interval_ms", "must be greater than 0"));
    }
    if !readiness.multiplier.is_finite() || readiness.multiplier < 1.0 {
        errors.push(ValidationError::new("readiness.multiplier", "must be a finite value >= 1.0"));
    }
    if readiness.max_interval_ms < readiness.interval_ms {
        errors.push(ValidationError::new(
            "readiness.max_interval_ms",
            format!("must be >= interval_ms ({})", readiness.interval_ms),
        ));
    }
    if !(0.0..=1.0).contains(&readiness.jitter_ratio) {
        errors.push(ValidationError::new("readiness.jitter_ratio", "must be between 0.0 and 1.0"));
    }
    if readiness.max_attempts == Some(0) {
        errors.push(ValidationError::new("readiness.max_attempts", "must be at least 1 when set"));
    }
    if readiness.timeout_secs == Some(0) {
        errors.push(ValidationError::new("readiness.timeout_secs", "must be greater than 0 when set"));
    }
    if readiness.connect_timeout_secs == 0 {
        errors.push(ValidationError::new("readiness.connect_timeout_secs", "must be greater than 0"));
    }

    if config.database.port == Some(0) {
        errors.push(ValidationError::new("database.port", "must be between 1 and 65535"));
    }

    if is_blank(&config.migrations.command) {
        errors.push(ValidationError::new("migrations.command", "must name a program"));
    }
    if config.migrations.config_path.as_os_str().is_empty() {
        errors.push(ValidationError::new("migrations.config_path", "must not be empty"));
    }
    if config.seed.enabled && is_blank(&config.seed.interpreter) {
        errors.push(ValidationError::new("seed.interpreter", "must name a program when seeding is enabled"));
    }
    if is_blank(&config.server.command) {
        errors.push(ValidationError::new("server.command", "must name a program"));
    }

    if let Some(scheme) = &config.env.database_url_scheme {
        if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphanumeric() || "+-.".contains(c)) {
            errors.push(ValidationError::new(
                "env.database_url_scheme",
                format!("'{}' is not a valid URL scheme", scheme),
            ));
        }
    }

    if config.observability.log_level.trim().is_empty() {
        errors.push(ValidationError::new("observability.log_level", "must not be empty"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_blank(argv: &[String]) -> bool {
    argv.first().map_or(true, |program| program.trim().is_empty())
}
