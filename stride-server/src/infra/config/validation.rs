use axum::http::HeaderValue;
use thiserror::Error;

use super::models::{Config, StorageBackend};

#[derive(Debug, Error)]
pub enum ConfigGuardRailError {
    #[error("invalid engine settings: {}", .problems.join("; "))]
    InvalidEngineSettings { problems: Vec<String> },
    #[error("invalid analytics settings: {}", .problems.join("; "))]
    InvalidAnalyticsSettings { problems: Vec<String> },
    #[error("storage.max_connections must be at least 1")]
    ZeroConnections,
    #[error("invalid CORS configuration: {reason}")]
    InvalidCorsConfig { reason: String },
}

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(
        &mut self,
        message: S,
        hint: H,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }
}

/// Hard failures for settings the engine cannot run with; softer problems
/// come back as warnings.
pub fn apply_guard_rails(
    config: &Config,
) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();

    let problems = config.engine.validate();
    if !problems.is_empty() {
        return Err(ConfigGuardRailError::InvalidEngineSettings { problems });
    }
    let problems = config.analytics.validate();
    if !problems.is_empty() {
        return Err(ConfigGuardRailError::InvalidAnalyticsSettings { problems });
    }
    if config.storage.max_connections == 0 {
        return Err(ConfigGuardRailError::ZeroConnections);
    }

    validate_cors(config)?;

    match config.storage.backend {
        StorageBackend::Memory => {
            if config.storage.seed_path.is_none() {
                warnings.push_with_hint(
                    "memory backend selected without a seed file; no courses or enrollments exist",
                    "Set storage.seed_path or STRIDE_SEED_PATH to a TOML fixture",
                );
            }
            warnings.push("memory backend keeps progress only for the lifetime of the process");
        }
        StorageBackend::Postgres => {
            if config.storage.database_url.is_none() {
                warnings.push_with_hint(
                    "postgres backend selected but no database URL is configured",
                    "Set storage.database_url or DATABASE_URL",
                );
            }
            if config.storage.seed_path.is_some() {
                warnings.push("storage.seed_path is ignored by the postgres backend");
            }
        }
    }

    if config.certificates.webhook_url.is_none() {
        warnings.push_with_hint(
            "no certificate webhook configured; course completions are only logged",
            "Set certificates.webhook_url or STRIDE_CERTIFICATE_WEBHOOK_URL",
        );
    }

    Ok(warnings)
}

fn validate_cors(config: &Config) -> Result<(), ConfigGuardRailError> {
    for origin in &config.cors.allowed_origins {
        if origin == "*" {
            continue;
        }
        HeaderValue::from_str(origin).map_err(|_| {
            ConfigGuardRailError::InvalidCorsConfig {
                reason: format!("invalid origin `{origin}` in CORS_ALLOWED_ORIGINS"),
            }
        })?;
    }
    Ok(())
}
