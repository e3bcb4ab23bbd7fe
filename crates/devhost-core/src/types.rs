//! Shared types for devhost-core.
//!
//! These are the values exchanged with the orchestrator: resource snapshots coming
//! in, command and health results going out.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Property carrying the pid of the launched executable (0 until known).
pub const PID_PROPERTY: &str = "executable.pid";

// ─────────────────────────────────────────────────────────────────────────────
// Resource snapshots
// ─────────────────────────────────────────────────────────────────────────────

/// Reported run state of a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Starting,
    Running,
    Stopped,
    Failed,
    #[default]
    Unknown,
}

impl RunState {
    /// Map the orchestrator's state text onto a run state.
    pub fn from_state_text(text: &str) -> Self {
        match text.trim().to_ascii_lowercase().as_str() {
            "starting" => RunState::Starting,
            "running" => RunState::Running,
            "stopped" | "exited" | "finished" => RunState::Stopped,
            "failed" | "failedtostart" | "failed_to_start" => RunState::Failed,
            _ => RunState::Unknown,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunState::Starting => "starting",
            RunState::Running => "running",
            RunState::Stopped => "stopped",
            RunState::Failed => "failed",
            RunState::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Opaque scalar property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl PropertyValue {
    /// Integer view of the value, accepting numeric text.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(v) => Some(*v),
            PropertyValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        PropertyValue::Int(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::Text(v.to_string())
    }
}

/// A labelled endpoint URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceUrl {
    pub label: String,
    pub url: String,
}

impl ResourceUrl {
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }
}

/// Most recently observed state of a managed resource.
///
/// Snapshots are immutable once stored; an update replaces the whole value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    pub name: String,
    pub run_state: RunState,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
    #[serde(default)]
    pub urls: Vec<ResourceUrl>,
}

impl ResourceSnapshot {
    pub fn new(name: impl Into<String>, run_state: RunState) -> Self {
        Self {
            name: name.into(),
            run_state,
            properties: BTreeMap::new(),
            urls: Vec::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_pid(self, pid: u32) -> Self {
        self.with_property(PID_PROPERTY, i64::from(pid))
    }

    pub fn with_url(mut self, label: impl Into<String>, url: impl Into<String>) -> Self {
        self.urls.push(ResourceUrl::new(label, url));
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Results reported back to the orchestrator
// ─────────────────────────────────────────────────────────────────────────────

/// Uniform outcome of a command execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    pub success: bool,
    pub error_message: Option<String>,
}

impl CommandResult {
    pub fn success() -> Self {
        Self {
            success: true,
            error_message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_message: Some(message.into()),
        }
    }
}

impl From<crate::error::Result<()>> for CommandResult {
    fn from(result: crate::error::Result<()>) -> Self {
        match result {
            Ok(()) => CommandResult::success(),
            Err(e) => CommandResult::failure(e.to_string()),
        }
    }
}

/// Tri-state health verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
    Unknown,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Unhealthy => "unhealthy",
            HealthStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Health verdict plus a human-readable message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub status: HealthStatus,
    pub description: Option<String>,
}

impl HealthCheckResult {
    pub fn healthy() -> Self {
        Self {
            status: HealthStatus::Healthy,
            description: None,
        }
    }

    pub fn unhealthy(description: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            description: Some(description.into()),
        }
    }

    pub fn unknown(description: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unknown,
            description: Some(description.into()),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_state_from_text() {
        assert_eq!(RunState::from_state_text("Running"), RunState::Running);
        assert_eq!(RunState::from_state_text("Exited"), RunState::Stopped);
        assert_eq!(RunState::from_state_text("FailedToStart"), RunState::Failed);
        assert_eq!(RunState::from_state_text("Waiting"), RunState::Unknown);
    }

    #[test]
    fn test_property_value_as_i64() {
        assert_eq!(PropertyValue::Int(42).as_i64(), Some(42));
        assert_eq!(PropertyValue::from(" 17 ").as_i64(), Some(17));
        assert_eq!(PropertyValue::Bool(true).as_i64(), None);
    }

    #[test]
    fn test_snapshot_builder() {
        let snapshot = ResourceSnapshot::new("api", RunState::Running)
            .with_pid(1234)
            .with_url("http", "http://localhost:5000");

        assert_eq!(
            snapshot.properties.get(PID_PROPERTY),
            Some(&PropertyValue::Int(1234))
        );
        assert_eq!(snapshot.urls.len(), 1);
    }

    #[test]
    fn test_snapshot_deserialize_untagged_properties() {
        let json = r#"{
            "name": "web",
            "run_state": "running",
            "properties": { "executable.pid": 88, "project.path": "/src/web" }
        }"#;
        let snapshot: ResourceSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.run_state, RunState::Running);
        assert_eq!(
            snapshot.properties.get(PID_PROPERTY),
            Some(&PropertyValue::Int(88))
        );
        assert!(snapshot.urls.is_empty());
    }

    #[test]
    fn test_command_result_from_error() {
        let result: CommandResult = Err(crate::error::Error::NoPidFound).into();
        assert!(!result.success);
        assert_eq!(result.error_message.as_deref(), Some("No pid found"));
    }
}
