//! # Application State
//!
//! Created once at startup and shared with every handler through `Arc`. The
//! built-in collaborators are stateless; each request brings its own database and
//! parsed statements.

use serde::{Deserialize, Serialize};
use viewc_builtin::Builtins;
use viewc_core::config::CompilerConfig;

/// Server-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the HTTP listener binds to.
    pub bind_addr: String,
    /// Compiler settings applied to every request.
    pub compiler: CompilerConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            compiler: CompilerConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Defaults, with the bind address overridable through `VIEWC_BIND_ADDR`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(addr) = std::env::var("VIEWC_BIND_ADDR") {
            config.bind_addr = addr;
        }
        config
    }
}

pub struct AppState {
    pub builtins: Builtins,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            builtins: viewc_builtin::default_collaborators(),
            config,
        }
    }
}
