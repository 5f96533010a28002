use once_cell::sync::Lazy;
use std::{fs, path::PathBuf};
use thiserror::Error;

use super::{
    models::{
        CertificateConfig, Config, ConfigMetadata, CorsConfig, ServerConfig,
        StorageBackend, StorageConfig, DEFAULT_CERTIFICATE_TIMEOUT,
        DEFAULT_MAX_CONNECTIONS, DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT,
    },
    sources::{EnvConfig, FileConfig},
    validation::{self, ConfigGuardRailError, ConfigWarnings},
};

static DEFAULT_CONFIG_LOCATIONS: Lazy<Vec<PathBuf>> = Lazy::new(|| {
    vec![
        PathBuf::from("stride.toml"),
        PathBuf::from("config/stride.toml"),
    ]
});

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true).or_else(
                |err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                },
            )?,
            None => {
                dotenvy::dotenv().map(|_| true).or_else(|err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                })?
            }
        };

        self.load_with_env(EnvConfig::gather(), env_file_loaded)
    }

    /// Resolve against an already gathered environment, skipping `.env`.
    pub fn load_with_env(
        &self,
        env_config: EnvConfig,
        env_file_loaded: bool,
    ) -> Result<ConfigLoad, ConfigLoadError> {
        let (file_config, config_path) = self.load_file_config(&env_config)?;

        let (config, warnings) = compose_config(
            file_config,
            env_config,
            ConfigMetadata {
                config_path,
                env_file_loaded,
            },
        )?;

        Ok(ConfigLoad { config, warnings })
    }

    fn load_file_config(
        &self,
        env_config: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let mut source = ConfigPathSource::default();

        if let Some(explicit) = &self.options.config_path {
            source.explicit = Some(explicit.clone());
        } else if let Some(from_env) = &env_config.config_path {
            source.env = Some(from_env.clone());
        }

        if source.is_empty() {
            source.default = DEFAULT_CONFIG_LOCATIONS
                .iter()
                .find(|candidate| candidate.exists())
                .cloned();
        }

        let Some((path, provenance)) = source.resolved_path() else {
            return Ok((None, None));
        };

        if !path.exists() {
            if provenance.is_explicit() {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            return Ok((None, None));
        }

        let contents =
            fs::read_to_string(&path).map_err(|err| ConfigLoadError::Io {
                path: path.clone(),
                source: err,
            })?;
        let file_config: FileConfig =
            toml::from_str(&contents).map_err(|err| ConfigLoadError::Parse {
                path: path.clone(),
                source: err,
            })?;

        Ok((Some(file_config), Some(path)))
    }
}

/// Layers environment values over the file, and the file over defaults.
fn compose_config(
    file_config: Option<FileConfig>,
    env: EnvConfig,
    metadata: ConfigMetadata,
) -> Result<(Config, ConfigWarnings), ConfigLoadError> {
    let mut warnings = ConfigWarnings::default();

    if metadata.config_path.is_none() {
        warnings.push_with_hint(
            "No stride.toml detected; using defaults and environment variables",
            "Pass --config or set STRIDE_CONFIG to load a configuration file",
        );
    }

    let file = file_config.unwrap_or_default();

    let server = ServerConfig {
        host: env
            .server_host
            .or(file.server.host)
            .unwrap_or_else(|| DEFAULT_SERVER_HOST.to_string()),
        port: env
            .server_port
            .or(file.server.port)
            .unwrap_or(DEFAULT_SERVER_PORT),
    };

    let backend = match env.storage_backend {
        Some(raw) => raw.parse::<StorageBackend>().map_err(|reason| {
            ConfigLoadError::InvalidBackend { value: raw, reason }
        })?,
        None => file.storage.backend.unwrap_or_default(),
    };

    let storage = StorageConfig {
        backend,
        database_url: env
            .database_url
            .or(file.storage.database_url)
            .filter(|url| !url.trim().is_empty()),
        max_connections: file
            .storage
            .max_connections
            .unwrap_or(DEFAULT_MAX_CONNECTIONS),
        seed_path: env.seed_path.or(file.storage.seed_path),
    };

    let timeout = match file.certificates.timeout {
        Some(raw) => humantime::parse_duration(&raw).map_err(|source| {
            ConfigLoadError::InvalidDuration {
                field: "certificates.timeout",
                value: raw,
                source,
            }
        })?,
        None => DEFAULT_CERTIFICATE_TIMEOUT,
    };

    let certificates = CertificateConfig {
        webhook_url: env
            .certificate_webhook_url
            .or(file.certificates.webhook_url)
            .filter(|url| !url.trim().is_empty()),
        timeout,
    };

    let cors = CorsConfig {
        allowed_origins: env
            .cors_allowed_origins
            .or(file.cors.allowed_origins)
            .unwrap_or_default(),
    };

    let engine = file.engine.unwrap_or_default();
    let mut analytics = file.analytics.unwrap_or_default();
    // Near-completion is configured once, under [engine]
    analytics.near_completion_percentage = engine.near_completion_percentage;

    let config = Config {
        server,
        storage,
        engine,
        analytics,
        certificates,
        cors,
        metadata,
    };

    let guard_warnings = validation::apply_guard_rails(&config)?;
    warnings.extend(guard_warnings);

    Ok((config, warnings))
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("configuration file missing: {path}")]
    MissingConfig { path: PathBuf },
    #[error("failed to read configuration {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid storage backend '{value}': {reason}")]
    InvalidBackend { value: String, reason: String },
    #[error("invalid duration '{value}' for {field}")]
    InvalidDuration {
        field: &'static str,
        value: String,
        #[source]
        source: humantime::DurationError,
    },
    #[error(transparent)]
    GuardRail(#[from] ConfigGuardRailError),
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}

#[derive(Debug, Default)]
struct ConfigPathSource {
    explicit: Option<PathBuf>,
    env: Option<PathBuf>,
    default: Option<PathBuf>,
}

impl ConfigPathSource {
    fn is_empty(&self) -> bool {
        self.explicit.is_none() && self.env.is_none() && self.default.is_none()
    }

    fn resolved_path(&self) -> Option<(PathBuf, ConfigPathProvenance)> {
        if let Some(path) = &self.explicit {
            return Some((path.clone(), ConfigPathProvenance::Explicit));
        }
        if let Some(path) = &self.env {
            return Some((path.clone(), ConfigPathProvenance::Env));
        }
        if let Some(path) = &self.default {
            return Some((path.clone(), ConfigPathProvenance::Default));
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigPathProvenance {
    Explicit,
    Env,
    Default,
}

impl ConfigPathProvenance {
    fn is_explicit(self) -> bool {
        matches!(
            self,
            ConfigPathProvenance::Explicit | ConfigPathProvenance::Env
        )
    }
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn parse(raw: &str) -> FileConfig {
        toml::from_str(raw).unwrap()
    }

    #[test]
    fn environment_overrides_file_values() {
        let file = parse(
            r#"
            [server]
            host = "127.0.0.1"
            port = 8081

            [storage]
            backend = "memory"
            seed_path = "fixtures/seed.toml"
            "#,
        );
        let env = EnvConfig {
            server_port: Some(9090),
            storage_backend: Some("postgres".into()),
            database_url: Some("postgres://stride@localhost/stride".into()),
            ..EnvConfig::default()
        };

        let (config, _) =
            compose_config(Some(file), env, ConfigMetadata::default()).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.storage.backend, StorageBackend::Postgres);
        assert_eq!(
            config.storage.database_url.as_deref(),
            Some("postgres://stride@localhost/stride")
        );
    }

    #[test]
    fn certificate_timeout_uses_humantime() {
        let file = parse(
            r#"
            [certificates]
            webhook_url = "https://certs.example/hooks/completed"
            timeout = "1500ms"
            "#,
        );
        let (config, warnings) =
            compose_config(Some(file), EnvConfig::default(), ConfigMetadata::default())
                .unwrap();
        assert_eq!(config.certificates.timeout, Duration::from_millis(1500));
        assert!(
            !warnings
                .items
                .iter()
                .any(|warning| warning.message.contains("certificate webhook"))
        );
    }

    #[test]
    fn bad_timeout_is_a_load_error() {
        let file = parse(
            r#"
            [certificates]
            timeout = "soon"
            "#,
        );
        let err =
            compose_config(Some(file), EnvConfig::default(), ConfigMetadata::default())
                .unwrap_err();
        assert!(matches!(err, ConfigLoadError::InvalidDuration { .. }));
    }

    #[test]
    fn unknown_backend_is_a_load_error() {
        let env = EnvConfig {
            storage_backend: Some("sqlite".into()),
            ..EnvConfig::default()
        };
        let err = compose_config(None, env, ConfigMetadata::default()).unwrap_err();
        assert!(matches!(err, ConfigLoadError::InvalidBackend { .. }));
    }

    #[test]
    fn threshold_out_of_range_fails_guard_rails() {
        let file = parse(
            r#"
            [engine]
            default_minimum_watch_percentage = 0.0
            "#,
        );
        let err =
            compose_config(Some(file), EnvConfig::default(), ConfigMetadata::default())
                .unwrap_err();
        assert!(matches!(
            err,
            ConfigLoadError::GuardRail(ConfigGuardRailError::InvalidEngineSettings { .. })
        ));
    }

    #[test]
    fn near_completion_flows_into_analytics() {
        let file = parse(
            r#"
            [engine]
            near_completion_percentage = 90.0
            "#,
        );
        let (config, _) =
            compose_config(Some(file), EnvConfig::default(), ConfigMetadata::default())
                .unwrap();
        assert_eq!(config.analytics.near_completion_percentage, 90.0);
    }
}
