//! Configuration for splitchaind

use serde::{Deserialize, Serialize};
use splitchain_adapters::{DenylistConfig, LlmOracleConfig, DEFAULT_SIMULATED_DELAY};
use splitchain_core::{DisperserConfig, SplitchainError};
use std::collections::HashMap;
use std::net::SocketAddr;

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Per-call timeouts used by the orchestrator
    #[serde(default)]
    pub disperse: DisperserConfig,

    #[serde(default)]
    pub oracle: OracleConfig,

    #[serde(default)]
    pub naming: NamingConfig,

    #[serde(default)]
    pub executor: ExecutorConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Start with the demo transaction history
    #[serde(default)]
    pub seed_demo_history: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            enable_cors: true,
            seed_demo_history: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or `EnvFilter` directive
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Risk oracle backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OracleConfig {
    /// Offline denylist and amount ceilings
    Denylist(DenylistConfig),
    /// OpenAI-compatible chat model
    Llm(LlmOracleConfig),
}

impl Default for OracleConfig {
    fn default() -> Self {
        OracleConfig::Denylist(DenylistConfig::default())
    }
}

/// Alias lookup backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NamingConfig {
    Static {
        #[serde(default)]
        aliases: HashMap<String, String>,

        /// Also load the built-in demo aliases
        #[serde(default = "default_true")]
        include_demo_aliases: bool,
    },
    Http {
        endpoint: String,

        #[serde(default = "default_naming_timeout")]
        request_timeout_secs: u64,
    },
}

impl Default for NamingConfig {
    fn default() -> Self {
        NamingConfig::Static {
            aliases: HashMap::new(),
            include_demo_aliases: true,
        }
    }
}

/// Simulated executor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    #[serde(default = "default_executor_delay_ms")]
    pub delay_ms: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_executor_delay_ms(),
        }
    }
}

// Default value helpers

fn default_true() -> bool {
    true
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8092))
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_naming_timeout() -> u64 {
    10
}

fn default_executor_delay_ms() -> u64 {
    DEFAULT_SIMULATED_DELAY.as_millis() as u64
}

impl ServiceConfig {
    /// Layer defaults, an optional file and `SPLITCHAIN_` environment variables.
    ///
    /// Nested keys use a double underscore, e.g.
    /// `SPLITCHAIN_DISPERSE__ORACLE_TIMEOUT_MS=5000`.
    pub fn load(path: Option<&str>) -> Result<Self, ::config::ConfigError> {
        let mut builder = ::config::Config::builder();

        builder = builder.add_source(::config::Config::try_from(&ServiceConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(::config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("SPLITCHAIN")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), SplitchainError> {
        if self.disperse.oracle_timeout_ms == 0 {
            return Err(SplitchainError::Config(
                "disperse.oracle_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.disperse.lookup_timeout_ms == 0 {
            return Err(SplitchainError::Config(
                "disperse.lookup_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if let NamingConfig::Http { endpoint, .. } = &self.naming {
            if endpoint.trim().is_empty() {
                return Err(SplitchainError::Config(
                    "naming.endpoint is required for the http naming service".to_string(),
                ));
            }
        }
        Ok(())
    }
}
