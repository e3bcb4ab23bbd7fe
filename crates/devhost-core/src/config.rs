//! Configuration for devhost.
//!
//! Configuration is loaded with precedence:
//! 1. `DEVHOST_CONFIG` (path to a TOML file)
//! 2. Config file in the platform config dir (`devhost/config.toml`)
//! 3. Default values
//!
//! ```toml
//! [git]
//! program = "git"
//! working_dir = "/src/shop"
//!
//! [debugger]
//! strategy = "attach"
//! program = "lldb"
//! arguments = "--attach-pid <pid>"
//! launcher_process_names = ["dotnet"]
//!
//! [[resources]]
//! name = "catalog-api"
//! solution_group = "shop"
//! ```

use crate::error::{Error, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Token in the attach argument template replaced by the worker pid.
pub const PID_PLACEHOLDER: &str = "<pid>";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DevhostConfig {
    /// Version control settings
    #[serde(default)]
    pub git: GitConfig,

    /// Debugger attachment strategy
    #[serde(default)]
    pub debugger: DebuggerConfig,

    /// Resources registered at startup, in registration order
    #[serde(default)]
    pub resources: Vec<ResourceEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitConfig {
    /// Version control executable
    #[serde(default = "default_git_program")]
    pub program: String,

    /// Working copy to sync (defaults to the current directory)
    pub working_dir: Option<PathBuf>,
}

/// How the debugger reaches the worker process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum DebuggerConfig {
    /// POST to an endpoint exposed by the application itself
    Url {
        #[serde(default = "default_debug_path")]
        path: String,
    },
    /// Spawn a debugger against the worker process
    Attach {
        #[serde(default = "default_debugger_program")]
        program: String,

        /// Shell-word argument template containing `<pid>`
        #[serde(default = "default_debugger_arguments")]
        arguments: String,

        /// Launcher processes that sit between the reported pid and the worker
        #[serde(default = "default_launcher_names")]
        launcher_process_names: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceEntry {
    pub name: String,

    /// Resources sharing a group never start concurrently
    pub solution_group: Option<String>,
}

// Default value functions
fn default_git_program() -> String {
    "git".to_string()
}

fn default_debug_path() -> String {
    "/debug/attach".to_string()
}

fn default_debugger_program() -> String {
    "lldb".to_string()
}

fn default_debugger_arguments() -> String {
    format!("--attach-pid {}", PID_PLACEHOLDER)
}

fn default_launcher_names() -> Vec<String> {
    vec!["dotnet".to_string()]
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            program: default_git_program(),
            working_dir: None,
        }
    }
}

impl Default for DebuggerConfig {
    fn default() -> Self {
        DebuggerConfig::Attach {
            program: default_debugger_program(),
            arguments: default_debugger_arguments(),
            launcher_process_names: default_launcher_names(),
        }
    }
}

impl DevhostConfig {
    /// Load configuration from the configured path, or defaults if absent.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            debug!("No config at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the config file path.
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("DEVHOST_CONFIG") {
            return PathBuf::from(path);
        }
        if let Some(proj_dirs) = ProjectDirs::from("dev", "devhost", "devhost") {
            proj_dirs.config_dir().join("config.toml")
        } else {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".devhost")
                .join("config.toml")
        }
    }

    fn validate(&self) -> Result<()> {
        if let DebuggerConfig::Attach { program, arguments, .. } = &self.debugger {
            if program.trim().is_empty() {
                return Err(Error::Config("debugger.program must not be empty".into()));
            }
            if !arguments.contains(PID_PLACEHOLDER) {
                return Err(Error::Config(format!(
                    "debugger.arguments must contain {}",
                    PID_PLACEHOLDER
                )));
            }
        }

        let mut seen = std::collections::HashSet::new();
        for entry in &self.resources {
            if !seen.insert(entry.name.as_str()) {
                return Err(Error::DuplicateResource(entry.name.clone()));
            }
        }
        Ok(())
    }
}
