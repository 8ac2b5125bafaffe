use serde::{Deserialize, Serialize};

use crate::schema::{ConfigSchema, ConfigValues};

// ── Wire envelopes ──────────────────────────────────────────────────────────

/// Paged list envelope used by the plugin and tenant-config list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResponse<T> {
    pub results: Vec<T>,
}

// ── Core entities ───────────────────────────────────────────────────────────

/// An installable integration descriptor, as served by `GET /api/plugin`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plugin {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Install source: a repository URL, or `file:<path>` for local plugins.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub config_schema: ConfigSchema,
}

/// A tenant's configuration of one installed plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Server id; `None` until the config has been persisted once.
    #[serde(default)]
    pub id: Option<u64>,
    /// Owning plugin id.
    pub plugin: u64,
    pub enabled: bool,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub config: ConfigValues,
    /// Whether this config is global (all tenants) rather than tenant-scoped.
    /// Set locally on fetch — the scope is implied by which endpoint returned
    /// the entry, not by a wire field.
    #[serde(default)]
    pub global: bool,
    /// Last delivery/runtime error reported by the server, if any.
    #[serde(default)]
    pub error: Option<String>,
}

/// A catalog entry for a plugin available to install but not yet installed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryEntry {
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub description: String,
}

// ── Derived entities ────────────────────────────────────────────────────────

/// A plugin merged with its config (stored or synthesized) plus its 1-based
/// display position. Recomputed from the source collections; never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct InstalledPlugin {
    pub plugin: Plugin,
    pub config: PluginConfig,
    /// Dense display order, `1..=N` after sorting. Not written back.
    pub order: u32,
}

impl InstalledPlugin {
    #[must_use]
    pub fn id(&self) -> u64 {
        self.plugin.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.plugin.name
    }
}

// ── Session collaborator ────────────────────────────────────────────────────

/// Plugin permission flags read from the ambient session's user.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginAccess {
    pub install: bool,
    pub configure: bool,
}

// ── UI state ────────────────────────────────────────────────────────────────

/// The active tab of the plugin management panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginTab {
    #[default]
    Installed,
    Repository,
    Custom,
}

impl PluginTab {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Installed => "installed",
            Self::Repository => "repository",
            Self::Custom => "custom",
        }
    }
}

/// Where an install request originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallSource {
    /// A path on the server host; rewritten to a `file:` URL.
    Local,
    /// A URL typed into the custom-install field.
    Custom,
    /// An entry picked from the public repository.
    Repository,
}

impl InstallSource {
    /// The URL actually submitted to the install endpoint.
    #[must_use]
    pub fn install_url(self, raw: &str) -> String {
        match self {
            Self::Local => format!("file:{raw}"),
            Self::Custom | Self::Repository => raw.to_string(),
        }
    }
}
