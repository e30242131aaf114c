//! # Application State
//!
//! The entitlement gate is pure, so state carries configuration only.

/// Service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
}

impl AppConfig {
    /// Read configuration from the environment. An unset or unparseable
    /// `PORT` falls back to the default.
    pub fn from_env() -> Self {
        Self::from_port_var(std::env::var("PORT").ok().as_deref())
    }

    fn from_port_var(port: Option<&str>) -> Self {
        let default = Self::default();
        let port = match port.map(str::trim) {
            Some(raw) => match raw.parse() {
                Ok(p) => p,
                Err(_) => {
                    tracing::warn!(value = raw, "ignoring invalid PORT");
                    default.port
                }
            },
            None => default.port,
        };
        Self { port }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

/// Shared state handed to every handler.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }
}
