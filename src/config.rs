//! Configuration management for the JSON feeder
//!
//! Values are layered: built-in defaults, then an optional config file,
//! then `FEEDER__*` environment variables.

use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat, builder::DefaultState};
use serde::Deserialize;
use std::path::PathBuf;

const DEFAULT_CONFIG_FILE: &str = "config";
const CONFIG_FILE_ENV: &str = "FEEDER_CONFIG";
const ENV_PREFIX: &str = "FEEDER";

/// Complete application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub storage: StorageProperties,
    pub server: ServerSettings,
    pub vectorstore: VectorStoreSettings,
}

/// Where uploaded files are kept
#[derive(Debug, Deserialize, Clone)]
pub struct StorageProperties {
    /// Root folder for uploads
    pub location: String,

    /// Wipe the root folder before serving (restart discards prior uploads)
    pub reset_on_boot: bool,
}

/// Upload server settings
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind_address: String,
    pub port: u16,
    pub max_clients: usize,
    pub max_command_length: usize,
    pub max_upload_size_mb: u64,
}

/// Connection details passed through to the Redis vector store
#[derive(Debug, Deserialize, Clone)]
pub struct VectorStoreSettings {
    pub uri: String,
    pub index: String,
    pub prefix: String,
    /// Length of every embedding vector written to the index
    pub dimensions: usize,
}

impl Default for StorageProperties {
    fn default() -> Self {
        Self {
            location: "upload-dir".to_string(),
            reset_on_boot: true,
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 2121,
            max_clients: 10,
            max_command_length: 512,
            max_upload_size_mb: 100,
        }
    }
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            uri: "redis://localhost:6379".to_string(),
            index: "default-index".to_string(),
            prefix: "default:".to_string(),
            dimensions: 384,
        }
    }
}

impl AppConfig {
    /// Load configuration from the config file (if any) with environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let file_name =
            std::env::var(CONFIG_FILE_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        let settings = Self::defaults()?
            .add_source(File::with_name(&file_name).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        Self::finish(settings)
    }

    /// Load configuration from an inline TOML document layered over the defaults
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let settings = Self::defaults()?
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;

        Self::finish(settings)
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let storage = StorageProperties::default();
        let server = ServerSettings::default();
        let vectorstore = VectorStoreSettings::default();

        Config::builder()
            .set_default("storage.location", storage.location)?
            .set_default("storage.reset_on_boot", storage.reset_on_boot)?
            .set_default("server.bind_address", server.bind_address)?
            .set_default("server.port", i64::from(server.port))?
            .set_default("server.max_clients", server.max_clients as i64)?
            .set_default("server.max_command_length", server.max_command_length as i64)?
            .set_default("server.max_upload_size_mb", server.max_upload_size_mb as i64)?
            .set_default("vectorstore.uri", vectorstore.uri)?
            .set_default("vectorstore.index", vectorstore.index)?
            .set_default("vectorstore.prefix", vectorstore.prefix)?
            .set_default("vectorstore.dimensions", vectorstore.dimensions as i64)
    }

    fn finish(settings: Config) -> Result<Self, ConfigError> {
        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.location.trim().is_empty() {
            return Err(ConfigError::Message(
                "storage.location cannot be empty".into(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigError::Message("server.port cannot be 0".into()));
        }

        if self.server.max_clients == 0 {
            return Err(ConfigError::Message(
                "server.max_clients must be greater than 0".into(),
            ));
        }

        if self.server.max_upload_size_mb == 0 {
            return Err(ConfigError::Message(
                "server.max_upload_size_mb must be greater than 0".into(),
            ));
        }

        if self.vectorstore.index.trim().is_empty() {
            return Err(ConfigError::Message(
                "vectorstore.index cannot be empty".into(),
            ));
        }

        if self.vectorstore.dimensions == 0 {
            return Err(ConfigError::Message(
                "vectorstore.dimensions must be greater than 0".into(),
            ));
        }

        Ok(())
    }
}

impl StorageProperties {
    /// Get the storage location as PathBuf
    pub fn location_path(&self) -> PathBuf {
        PathBuf::from(&self.location)
    }
}

impl ServerSettings {
    /// Bind address and port as a socket address string
    pub fn listen_socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Maximum upload size in bytes
    pub fn max_upload_size_bytes(&self) -> u64 {
        self.max_upload_size_mb.saturating_mul(1024 * 1024)
    }
}
