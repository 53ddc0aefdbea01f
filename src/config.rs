//! Configuration for gpgagent
//!
//! Centralized configuration with sensible defaults.

use std::time::Duration;

use crate::error::{AgentError, Result};
use crate::transport::Endpoint;

/// Well-known per-user agent socket, before environment expansion
pub const DEFAULT_SOCKET_TEMPLATE: &str = "$HOME/.gnupg/S.gpg-agent";

/// Main configuration for an agent client
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Endpoint Configuration
    // -------------------------------------------------------------------------
    /// Socket path template; `$NAME` and `${NAME}` are expanded from the
    /// environment when the endpoint is resolved
    pub socket_path: String,

    // -------------------------------------------------------------------------
    // Timeout Configuration
    // -------------------------------------------------------------------------
    /// Greeting and `GETINFO version` probe timeout (milliseconds)
    pub probe_timeout_ms: u64,

    /// Timeout for ordinary commands (milliseconds)
    pub command_timeout_ms: u64,

    /// Timeout for commands that may prompt the user, e.g. for a PIN
    /// (milliseconds)
    pub interactive_timeout_ms: u64,

    /// Socket write timeout (milliseconds)
    pub write_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // Session Configuration
    // -------------------------------------------------------------------------
    /// `OPTION name=value` pairs sent right after connecting
    /// (pinentry hints such as `ttyname` or `display`)
    pub options: Vec<(String, String)>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            socket_path: DEFAULT_SOCKET_TEMPLATE.to_string(),
            probe_timeout_ms: 5000,
            command_timeout_ms: 5000,
            interactive_timeout_ms: 300_000, // 5 minutes for pinentry
            write_timeout_ms: 5000,
            options: Vec::new(),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Expand the socket template into a concrete endpoint
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::resolve(&self.socket_path)
    }

    /// Reject values that would make every exchange fail
    pub fn validate(&self) -> Result<()> {
        if self.socket_path.trim().is_empty() {
            return Err(AgentError::Config("socket path is empty".to_string()));
        }

        let timeouts = [
            ("probe_timeout_ms", self.probe_timeout_ms),
            ("command_timeout_ms", self.command_timeout_ms),
            ("interactive_timeout_ms", self.interactive_timeout_ms),
            ("write_timeout_ms", self.write_timeout_ms),
        ];
        for (name, value) in timeouts {
            if value == 0 {
                return Err(AgentError::Config(format!("{} must be non-zero", name)));
            }
        }

        for (name, _) in &self.options {
            if name.is_empty() || name.contains('=') {
                return Err(AgentError::Config(format!("invalid option name {:?}", name)));
            }
        }

        Ok(())
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    pub fn interactive_timeout(&self) -> Duration {
        Duration::from_millis(self.interactive_timeout_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the socket path template
    pub fn socket_path(mut self, template: impl Into<String>) -> Self {
        self.config.socket_path = template.into();
        self
    }

    /// Set the probe timeout (in milliseconds)
    pub fn probe_timeout_ms(mut self, ms: u64) -> Self {
        self.config.probe_timeout_ms = ms;
        self
    }

    /// Set the ordinary command timeout (in milliseconds)
    pub fn command_timeout_ms(mut self, ms: u64) -> Self {
        self.config.command_timeout_ms = ms;
        self
    }

    /// Set the interactive command timeout (in milliseconds)
    pub fn interactive_timeout_ms(mut self, ms: u64) -> Self {
        self.config.interactive_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Add an `OPTION` sent after connecting
    pub fn option(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.options.push((name.into(), value.into()));
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
