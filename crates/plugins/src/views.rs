//! Derived views over the store's collections.
//!
//! Pure functions of their inputs, recomputed on demand. Nothing here is
//! cached or persisted; the store exposes thin snapshot wrappers around them.

use std::collections::{HashMap, HashSet};

use crate::{
    schema,
    types::{InstalledPlugin, Plugin, PluginConfig, RepositoryEntry},
};

/// Merge every installed plugin with its config and assign display order.
///
/// Plugins without a stored config get a synthesized one: disabled, schema
/// defaults, and an order that appends them after the explicitly ordered
/// entries. The result is sorted by stored order (ties break by plugin id,
/// the base iteration order) and then renumbered densely `1..=N`. The
/// renumbering is display-only and never written back to the server.
#[must_use]
pub fn installed_plugins(
    plugins: &HashMap<u64, Plugin>,
    configs: &HashMap<u64, PluginConfig>,
) -> Vec<InstalledPlugin> {
    let mut base: Vec<&Plugin> = plugins.values().collect();
    base.sort_by_key(|plugin| plugin.id);

    let total = base.len();
    let mut merged: Vec<InstalledPlugin> = base
        .into_iter()
        .enumerate()
        .map(|(position, plugin)| {
            let config = configs.get(&plugin.id).cloned().unwrap_or_else(|| PluginConfig {
                id: None,
                plugin: plugin.id,
                enabled: false,
                order: (total + position) as i32,
                config: schema::defaults(&plugin.config_schema),
                global: false,
                error: None,
            });
            InstalledPlugin {
                plugin: plugin.clone(),
                config,
                order: 0,
            }
        })
        .collect();

    merged.sort_by_key(|entry| entry.config.order);
    for (index, entry) in merged.iter_mut().enumerate() {
        entry.order = index as u32 + 1;
    }
    merged
}

/// Names of all installed plugins, for O(1) membership tests.
#[must_use]
pub fn installed_plugin_names(installed: &[InstalledPlugin]) -> HashSet<String> {
    installed
        .iter()
        .map(|entry| entry.plugin.name.clone())
        .collect()
}

/// Repository entries not currently installed, by name.
///
/// The repository and installed sets use different identity systems, so
/// membership is tested by name, not id. Output is sorted by name.
#[must_use]
pub fn uninstalled_plugins(
    installed_names: &HashSet<String>,
    repository: &HashMap<String, RepositoryEntry>,
) -> Vec<RepositoryEntry> {
    let mut entries: Vec<RepositoryEntry> = repository
        .values()
        .filter(|entry| !installed_names.contains(&entry.name))
        .cloned()
        .collect();
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    entries
}

/// The installed plugin currently being edited, if any.
///
/// A stale id (e.g. just after an uninstall) yields `None` rather than an
/// error.
#[must_use]
pub fn editing_plugin(
    editing_plugin_id: Option<u64>,
    installed: &[InstalledPlugin],
) -> Option<InstalledPlugin> {
    editing_plugin_id
        .and_then(|id| installed.iter().find(|entry| entry.plugin.id == id).cloned())
}
