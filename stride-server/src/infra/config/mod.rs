//! Layered configuration: defaults, then `stride.toml`, then environment.
//! CLI flags are applied on top by the binary.

pub mod loader;
pub mod models;
pub mod sources;
pub mod validation;

pub use loader::{ConfigLoad, ConfigLoadError, ConfigLoader, ConfigLoaderOptions};
pub use models::{
    CertificateConfig, Config, ConfigMetadata, CorsConfig, ServerConfig,
    StorageBackend, StorageConfig,
};
pub use validation::{ConfigGuardRailError, ConfigWarning, ConfigWarnings};
