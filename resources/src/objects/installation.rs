use serde::{Deserialize, Serialize};
use strum::Display;

use super::{Metadata, Object};

/// The cluster-scoped resource driving the installer controller.
/// The CLI only ever reads it and patches its `action` label,
/// the status is owned by the in-cluster installer.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Installation {
    /// Standard object's metadata.
    pub metadata: Metadata,
    /// Desired installation parameters.
    pub spec: InstallationSpec,
    /// Current progress, written by the installer controller.
    pub status: Option<InstallationStatus>,
}

impl Object for Installation {
    fn kind(&self) -> &'static str {
        "Installation"
    }

    fn name(&self) -> &String {
        &self.metadata.name
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct InstallationSpec {
    /// Version of the platform to install.
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct InstallationStatus {
    #[serde(default)]
    pub state: InstallationState,
    /// Free-text description of the installation phase currently running.
    #[serde(default)]
    pub description: String,
    /// Per-component failures accumulated by the installer.
    #[serde(default)]
    pub error_log: Vec<ErrorLogEntry>,
    /// Set once the console is reachable.
    #[serde(default)]
    pub console_url: Option<String>,
}

/// Observed state of the installation.
///
/// States introduced by newer installers deserialize as `Unknown`
/// instead of breaking the client.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Display)]
pub enum InstallationState {
    NotInstalled,
    InProgress,
    Installed,
    Error,
    #[serde(other)]
    Unknown,
}

impl Default for InstallationState {
    fn default() -> Self {
        InstallationState::Unknown
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ErrorLogEntry {
    pub component: String,
    pub log: String,
    #[serde(default)]
    pub occurrences: u32,
}

impl std::fmt::Display for ErrorLogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:\n {} [{}]", self.component, self.log, self.occurrences)
    }
}
