//! Server configuration
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! [`Overrides`] collected from CLI flags and environment variables. A missing
//! spreadsheet id is allowed here; the recorder reports it per request.

use intake_core::{
    HeaderStyle, MemorySheetStore, RecorderConfig, SheetStore, SpreadsheetId, StoreError,
    DEFAULT_SHEET_TITLE,
};
use intake_sheets::{CredentialsError, ServiceAccountKey, SheetsClient, TokenSource, DEFAULT_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use url::Url;

/// Default listen address
pub const DEFAULT_BIND: SocketAddr = SocketAddr::new(std::net::IpAddr::V4(Ipv4Addr::LOCALHOST), 8080);

/// Default request body limit (64 KiB)
pub const DEFAULT_MAX_BODY_BYTES: u64 = 64 * 1024;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// File path
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`ServerConfig`]
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// File path
        path: String,
        /// Underlying parse error
        #[source]
        source: toml::de::Error,
    },

    /// A setting has an unusable value
    #[error("invalid {field}: {message}")]
    Invalid {
        /// Setting name
        field: &'static str,
        /// What is wrong with it
        message: String,
    },

    /// Google backend selected without any credentials
    #[error(
        "no Google credentials configured; set INTAKE_ACCESS_TOKEN or \
         INTAKE_SERVICE_ACCOUNT_KEY"
    )]
    MissingCredentials,

    /// Service account key could not be loaded
    #[error(transparent)]
    Credentials(#[from] CredentialsError),

    /// Sheets client could not be constructed
    #[error("failed to build sheets client: {0}")]
    Client(#[from] StoreError),
}

/// Where rows are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    /// Google Sheets v4 API
    #[default]
    GoogleSheets,
    /// Process memory, for local runs
    Memory,
}

impl FromStr for Backend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google-sheets" | "sheets" => Ok(Self::GoogleSheets),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::Invalid {
                field: "backend",
                message: format!("unknown backend '{other}', expected google-sheets or memory"),
            }),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GoogleSheets => f.write_str("google-sheets"),
            Self::Memory => f.write_str("memory"),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Invalid {
                field: "log_format",
                message: format!("unknown log format '{other}', expected text or json"),
            }),
        }
    }
}

/// Values that take precedence over the config file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Listen address
    pub bind: Option<SocketAddr>,
    /// Target spreadsheet
    pub spreadsheet_id: Option<String>,
    /// Target worksheet title
    pub sheet_title: Option<String>,
    /// Storage backend
    pub backend: Option<Backend>,
    /// Static OAuth bearer token
    pub access_token: Option<String>,
    /// Service account key file
    pub service_account_key: Option<PathBuf>,
    /// Log output format
    pub log_format: Option<LogFormat>,
}

/// Full server configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Listen address
    pub bind: SocketAddr,
    /// Target spreadsheet
    pub spreadsheet_id: SpreadsheetId,
    /// Target worksheet title
    pub sheet_title: String,
    /// Storage backend
    pub backend: Backend,
    /// Sheets API root, for proxies
    pub api_base: Option<String>,
    /// Static OAuth bearer token
    pub access_token: Option<String>,
    /// Service account key file
    pub service_account_key: Option<PathBuf>,
    /// Largest accepted POST body
    pub max_body_bytes: u64,
    /// Auto-resize columns after each append
    pub auto_resize: bool,
    /// Log output format
    pub log_format: LogFormat,
    /// Style for a freshly seeded header row
    pub header_style: HeaderStyle,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND,
            spreadsheet_id: SpreadsheetId::default(),
            sheet_title: DEFAULT_SHEET_TITLE.to_string(),
            backend: Backend::default(),
            api_base: None,
            access_token: None,
            service_account_key: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            auto_resize: true,
            log_format: LogFormat::default(),
            header_style: HeaderStyle::default(),
        }
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("bind", &self.bind)
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("sheet_title", &self.sheet_title)
            .field("backend", &self.backend)
            .field("api_base", &self.api_base)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("service_account_key", &self.service_account_key)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("auto_resize", &self.auto_resize)
            .field("log_format", &self.log_format)
            .finish_non_exhaustive()
    }
}

impl ServerConfig {
    /// Parse a TOML document
    pub fn from_toml(input: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(input).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Load a TOML config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&input, path)
    }

    /// Defaults or file, then overrides
    pub fn load(path: Option<&Path>, overrides: Overrides) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(config.with_overrides(overrides))
    }

    /// Apply overrides on top of this configuration
    #[must_use]
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(bind) = overrides.bind {
            self.bind = bind;
        }
        if let Some(id) = overrides.spreadsheet_id {
            self.spreadsheet_id = SpreadsheetId::new(id);
        }
        if let Some(title) = overrides.sheet_title {
            self.sheet_title = title;
        }
        if let Some(backend) = overrides.backend {
            self.backend = backend;
        }
        if let Some(token) = overrides.access_token {
            self.access_token = Some(token);
        }
        if let Some(key) = overrides.service_account_key {
            self.service_account_key = Some(key);
        }
        if let Some(format) = overrides.log_format {
            self.log_format = format;
        }
        self
    }

    /// Recorder settings derived from this configuration
    #[must_use]
    pub fn recorder_config(&self) -> RecorderConfig {
        let mut config = RecorderConfig::new(self.spreadsheet_id.clone())
            .with_sheet_title(self.sheet_title.clone())
            .with_auto_resize(self.auto_resize);
        config.header_style = self.header_style.clone();
        config
    }

    /// Token source for the Google backend
    ///
    /// A static token wins over a key file.
    pub fn token_source(&self) -> Result<TokenSource, ConfigError> {
        if let Some(token) = self.access_token.as_deref().filter(|t| !t.trim().is_empty()) {
            return Ok(TokenSource::bearer(token.trim()));
        }
        match &self.service_account_key {
            Some(path) => {
                let key = ServiceAccountKey::from_file(path)?;
                tracing::info!("Using service account {}", key.client_email);
                Ok(TokenSource::service_account(key))
            }
            None => Err(ConfigError::MissingCredentials),
        }
    }

    /// Build the configured storage backend
    pub fn build_store(&self) -> Result<Arc<dyn SheetStore>, ConfigError> {
        match self.backend {
            Backend::Memory => {
                tracing::warn!("Using in-memory backend; rows are lost on exit");
                Ok(Arc::new(MemorySheetStore::new(self.spreadsheet_id.clone())))
            }
            Backend::GoogleSheets => {
                let tokens = self.token_source()?;
                let client = match &self.api_base {
                    Some(base) => {
                        let base = Url::parse(base).map_err(|e| ConfigError::Invalid {
                            field: "api_base",
                            message: e.to_string(),
                        })?;
                        SheetsClient::with_base_url(base, tokens, DEFAULT_TIMEOUT)?
                    }
                    None => SheetsClient::new(tokens)?,
                };
                Ok(Arc::new(client))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind.to_string(), "127.0.0.1:8080");
        assert_eq!(config.max_body_bytes, 65536);
        assert_eq!(config.sheet_title, DEFAULT_SHEET_TITLE);
        assert_eq!(config.backend, Backend::GoogleSheets);
        assert!(!config.spreadsheet_id.is_configured());
        assert!(config.auto_resize);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = ServerConfig::from_toml(
            r##"
            spreadsheet_id = "1AbC"
            backend = "memory"

            [header_style]
            bold = false
            background = "#000000"
            foreground = "#ffffff"
            "##,
            Path::new("intake.toml"),
        )
        .unwrap();
        assert_eq!(config.spreadsheet_id.as_str(), "1AbC");
        assert_eq!(config.backend, Backend::Memory);
        assert_eq!(config.bind, DEFAULT_BIND);
        assert!(!config.recorder_config().header_style.bold);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = ServerConfig::from_toml("spreadsheet = \"x\"", Path::new("intake.toml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn parse_enums() {
        assert_eq!("Memory".parse::<Backend>().unwrap(), Backend::Memory);
        assert_eq!("google-sheets".parse::<Backend>().unwrap(), Backend::GoogleSheets);
        assert!("excel".parse::<Backend>().is_err());
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn missing_credentials() {
        let err = ServerConfig::default().token_source().unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredentials));

        let config = ServerConfig {
            access_token: Some("  ".to_string()),
            ..ServerConfig::default()
        };
        assert!(matches!(
            config.build_store(),
            Err(ConfigError::MissingCredentials)
        ));
    }

    #[test]
    fn token_is_redacted() {
        let config = ServerConfig {
            access_token: Some("ya29.secret".to_string()),
            ..ServerConfig::default()
        };
        assert!(!format!("{config:?}").contains("ya29"));
    }

    #[test]
    fn stores_by_backend() {
        let memory = ServerConfig {
            backend: Backend::Memory,
            ..ServerConfig::default()
        };
        assert_eq!(memory.build_store().unwrap().name(), "memory");

        let sheets = ServerConfig {
            access_token: Some("token".to_string()),
            api_base: Some("http://127.0.0.1:9/v4/".to_string()),
            ..ServerConfig::default()
        };
        assert_eq!(sheets.build_store().unwrap().name(), "google-sheets");

        let bad_base = ServerConfig {
            access_token: Some("token".to_string()),
            api_base: Some("not a url".to_string()),
            ..ServerConfig::default()
        };
        assert!(matches!(
            bad_base.build_store(),
            Err(ConfigError::Invalid { field: "api_base", .. })
        ));
    }
}
