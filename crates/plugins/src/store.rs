//! The plugin management store.
//!
//! Mediates between the plugin REST API and a rendering layer: three
//! independently fetched collections (installed plugins, their configs, the
//! public repository), staging fields for pending installs, and async CRUD
//! operations that replace server-confirmed state wholesale.
//!
//! Writes never predict the server's answer — each mutating operation blocks
//! until the response arrives, then replaces the relevant entry or collection
//! with what the server returned. Overlapping invocations of the same
//! operation are not serialized; last response wins, which is acceptable for
//! the discrete user actions this store is driven by.

use std::collections::HashMap;

use {kohort_api::ApiClient, tokio::sync::RwLock};

use crate::{
    error::Result,
    schema::{self, ConfigValues},
    types::{
        InstallSource, InstalledPlugin, PagedResponse, Plugin, PluginAccess, PluginConfig,
        PluginTab, RepositoryEntry,
    },
    views,
};

const PLUGINS_PATH: &str = "api/plugin";
const REPOSITORY_PATH: &str = "api/plugin/repository";
const CONFIGS_PATH: &str = "api/plugin_config";
const GLOBAL_CONFIGS_PATH: &str = "api/plugin_config/global_plugins/";

#[derive(Debug, Default)]
struct StoreState {
    plugins: HashMap<u64, Plugin>,
    plugin_configs: HashMap<u64, PluginConfig>,
    repository: HashMap<String, RepositoryEntry>,
    editing_plugin_id: Option<u64>,
    /// Explicitly tracked, rather than inferred from collection order.
    last_installed_id: Option<u64>,
    custom_plugin_url: String,
    local_plugin_url: String,
    plugin_error: Option<String>,
    plugin_tab: PluginTab,
    plugins_loading: bool,
    configs_loading: bool,
    repository_loading: bool,
}

/// State container for the plugin management panel.
///
/// Constructed explicitly and passed by reference to whichever view layer
/// needs it. Operations take `&self`; state lives behind an async `RwLock`
/// that is only held around state replacement, never across a request.
#[derive(Debug)]
pub struct PluginStore {
    api: ApiClient,
    state: RwLock<StoreState>,
}

impl PluginStore {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            state: RwLock::new(StoreState::default()),
        }
    }

    // ── Activation ──────────────────────────────────────────────────────────

    /// Initial fetch, run once when the panel mounts.
    ///
    /// Loads plugins and configs unconditionally and the repository listing
    /// only for users with install permission. The three fetches run
    /// concurrently; a failure in one is logged and leaves the other
    /// collections untouched.
    pub async fn activate(&self, access: PluginAccess) {
        let (plugins, configs, repository) = tokio::join!(
            self.load_plugins(),
            self.load_plugin_configs(),
            async {
                if access.install {
                    self.load_repository().await
                } else {
                    Ok(())
                }
            },
        );

        for (collection, result) in [
            ("plugins", plugins),
            ("plugin_configs", configs),
            ("repository", repository),
        ] {
            if let Err(error) = result {
                tracing::warn!(collection, %error, "initial fetch failed");
            }
        }
    }

    // ── Loaders ─────────────────────────────────────────────────────────────

    /// Fetch the installed plugin list, replacing the collection on success.
    pub async fn load_plugins(&self) -> Result<()> {
        self.state.write().await.plugins_loading = true;
        let result = self.api.get::<PagedResponse<Plugin>>(PLUGINS_PATH).await;

        let mut state = self.state.write().await;
        state.plugins_loading = false;
        let page = result?;
        state.plugins = page.results.into_iter().map(|p| (p.id, p)).collect();
        tracing::info!(count = state.plugins.len(), "loaded plugins");
        Ok(())
    }

    /// Fetch tenant-scoped and global plugin configs in parallel and merge.
    ///
    /// Tenant entries are applied first, global entries second, so a plugin
    /// configured in both scopes ends up with the global entry.
    pub async fn load_plugin_configs(&self) -> Result<()> {
        self.state.write().await.configs_loading = true;
        let result = tokio::try_join!(
            self.api.get::<PagedResponse<PluginConfig>>(CONFIGS_PATH),
            self.api.get::<Vec<PluginConfig>>(GLOBAL_CONFIGS_PATH),
        );

        let mut state = self.state.write().await;
        state.configs_loading = false;
        let (tenant, global) = result?;

        let mut configs = HashMap::new();
        for mut config in tenant.results {
            config.global = false;
            configs.insert(config.plugin, config);
        }
        for mut config in global {
            config.global = true;
            configs.insert(config.plugin, config);
        }
        tracing::info!(count = configs.len(), "loaded plugin configs");
        state.plugin_configs = configs;
        Ok(())
    }

    /// Fetch the public repository listing, keyed by plugin name.
    pub async fn load_repository(&self) -> Result<()> {
        self.state.write().await.repository_loading = true;
        let result = self.api.get::<Vec<RepositoryEntry>>(REPOSITORY_PATH).await;

        let mut state = self.state.write().await;
        state.repository_loading = false;
        let entries = result?;
        state.repository = entries
            .into_iter()
            .map(|entry| (entry.name.clone(), entry))
            .collect();
        tracing::info!(count = state.repository.len(), "loaded plugin repository");
        Ok(())
    }

    // ── Mutations ───────────────────────────────────────────────────────────

    /// Install a plugin from a URL.
    ///
    /// On success the returned plugin is merged into the collection, becomes
    /// the editing target, and both staged url fields are cleared. On failure
    /// the error message is recorded in `plugin_error` and the staged fields
    /// are left as typed, so the user can correct and retry.
    pub async fn install_plugin(&self, url: &str, source: InstallSource) -> Result<Plugin> {
        {
            let mut state = self.state.write().await;
            state.plugin_error = None;
            state.plugins_loading = true;
        }

        let body = serde_json::json!({ "url": source.install_url(url) });
        let result = self.api.post::<_, Plugin>(PLUGINS_PATH, &body).await;

        let mut state = self.state.write().await;
        state.plugins_loading = false;
        match result {
            Ok(plugin) => {
                state.plugins.insert(plugin.id, plugin.clone());
                state.editing_plugin_id = Some(plugin.id);
                state.last_installed_id = Some(plugin.id);
                state.custom_plugin_url.clear();
                state.local_plugin_url.clear();
                tracing::info!(id = plugin.id, name = %plugin.name, "installed plugin");
                Ok(plugin)
            },
            Err(error) => {
                state.plugin_error = Some(error.to_string());
                Err(error.into())
            },
        }
    }

    /// Uninstall the plugin currently being edited.
    ///
    /// A silent no-op (`Ok(None)`) when nothing is being edited. On success
    /// both the plugin and its config are pruned and the editing selection is
    /// cleared; returns the removed plugin's id.
    pub async fn uninstall_plugin(&self) -> Result<Option<u64>> {
        let Some(editing) = self.editing_plugin().await else {
            return Ok(None);
        };

        self.state.write().await.plugins_loading = true;
        let result = self
            .api
            .delete(&format!("{PLUGINS_PATH}/{}", editing.id()))
            .await;

        let mut state = self.state.write().await;
        state.plugins_loading = false;
        result?;
        state.plugins.remove(&editing.id());
        state.plugin_configs.remove(&editing.id());
        state.editing_plugin_id = None;
        if state.last_installed_id == Some(editing.id()) {
            state.last_installed_id = None;
        }
        tracing::info!(id = editing.id(), name = %editing.name(), "uninstalled plugin");
        Ok(Some(editing.id()))
    }

    /// Persist config changes for the plugin currently being edited.
    ///
    /// Changes are validated against the plugin's schema and overlaid on the
    /// current values. A config that has never been persisted is created
    /// (tagged with the plugin id and order 0); an existing one is updated.
    /// The server's response replaces the entry for that plugin, and a
    /// successful save closes the editor. A no-op (`Ok(None)`) when nothing
    /// is being edited.
    pub async fn save_plugin_config(
        &self,
        changes: &ConfigValues,
    ) -> Result<Option<PluginConfig>> {
        let Some(editing) = self.editing_plugin().await else {
            return Ok(None);
        };

        let merged = schema::merge(&editing.plugin.config_schema, &editing.config.config, changes)?;
        let mut fields = schema::submission(&editing.plugin.config_schema, &merged);

        self.state.write().await.configs_loading = true;
        let result = match editing.config.id {
            Some(config_id) => {
                self.api
                    .patch_form::<PluginConfig>(&format!("{CONFIGS_PATH}/{config_id}"), &fields)
                    .await
            },
            None => {
                fields.push(("plugin".to_string(), editing.id().to_string()));
                fields.push(("order".to_string(), "0".to_string()));
                self.api
                    .post_form::<PluginConfig>(&format!("{CONFIGS_PATH}/"), &fields)
                    .await
            },
        };

        let mut state = self.state.write().await;
        state.configs_loading = false;
        let response = result?;
        state.editing_plugin_id = None;
        state.plugin_configs.insert(response.plugin, response.clone());
        tracing::info!(plugin = response.plugin, "saved plugin config");
        Ok(Some(response))
    }

    /// Flip a config's enabled flag by config id.
    pub async fn toggle_enabled(&self, config_id: u64, enabled: bool) -> Result<PluginConfig> {
        self.patch_config(config_id, &serde_json::json!({ "enabled": enabled }))
            .await
    }

    /// Clear a config's recorded error by config id.
    pub async fn reset_config_error(&self, config_id: u64) -> Result<PluginConfig> {
        self.patch_config(config_id, &serde_json::json!({ "error": null }))
            .await
    }

    async fn patch_config(
        &self,
        config_id: u64,
        body: &serde_json::Value,
    ) -> Result<PluginConfig> {
        self.state.write().await.configs_loading = true;
        let result = self
            .api
            .patch::<_, PluginConfig>(&format!("{CONFIGS_PATH}/{config_id}"), body)
            .await;

        let mut state = self.state.write().await;
        state.configs_loading = false;
        let response = result?;
        state.plugin_configs.insert(response.plugin, response.clone());
        Ok(response)
    }

    // ── Pure transitions ────────────────────────────────────────────────────

    /// Select (or clear) the plugin being edited.
    pub async fn edit_plugin(&self, id: Option<u64>) {
        self.state.write().await.editing_plugin_id = id;
    }

    /// Stage a custom install URL. Also clears any previous install error.
    pub async fn set_custom_plugin_url(&self, url: impl Into<String>) {
        let mut state = self.state.write().await;
        state.custom_plugin_url = url.into();
        state.plugin_error = None;
    }

    /// Stage a local install path.
    pub async fn set_local_plugin_url(&self, url: impl Into<String>) {
        self.state.write().await.local_plugin_url = url.into();
    }

    pub async fn set_plugin_tab(&self, tab: PluginTab) {
        self.state.write().await.plugin_tab = tab;
    }

    // ── Snapshots ───────────────────────────────────────────────────────────

    /// Installed plugins merged with their configs, in display order.
    pub async fn installed_plugins(&self) -> Vec<InstalledPlugin> {
        let state = self.state.read().await;
        views::installed_plugins(&state.plugins, &state.plugin_configs)
    }

    /// Repository entries not yet installed, sorted by name.
    pub async fn uninstalled_plugins(&self) -> Vec<RepositoryEntry> {
        let state = self.state.read().await;
        let installed = views::installed_plugins(&state.plugins, &state.plugin_configs);
        let names = views::installed_plugin_names(&installed);
        views::uninstalled_plugins(&names, &state.repository)
    }

    /// The plugin currently being edited, if its id is still installed.
    pub async fn editing_plugin(&self) -> Option<InstalledPlugin> {
        let state = self.state.read().await;
        let installed = views::installed_plugins(&state.plugins, &state.plugin_configs);
        views::editing_plugin(state.editing_plugin_id, &installed)
    }

    pub async fn plugins(&self) -> HashMap<u64, Plugin> {
        self.state.read().await.plugins.clone()
    }

    pub async fn plugin_configs(&self) -> HashMap<u64, PluginConfig> {
        self.state.read().await.plugin_configs.clone()
    }

    pub async fn repository(&self) -> HashMap<String, RepositoryEntry> {
        self.state.read().await.repository.clone()
    }

    pub async fn editing_plugin_id(&self) -> Option<u64> {
        self.state.read().await.editing_plugin_id
    }

    /// Id of the most recently installed plugin this session, if any.
    pub async fn last_installed_id(&self) -> Option<u64> {
        self.state.read().await.last_installed_id
    }

    pub async fn custom_plugin_url(&self) -> String {
        self.state.read().await.custom_plugin_url.clone()
    }

    pub async fn local_plugin_url(&self) -> String {
        self.state.read().await.local_plugin_url.clone()
    }

    /// Last install failure message, cleared on retry or url edit.
    pub async fn plugin_error(&self) -> Option<String> {
        self.state.read().await.plugin_error.clone()
    }

    pub async fn plugin_tab(&self) -> PluginTab {
        self.state.read().await.plugin_tab
    }

    pub async fn plugins_loading(&self) -> bool {
        self.state.read().await.plugins_loading
    }

    pub async fn configs_loading(&self) -> bool {
        self.state.read().await.configs_loading
    }

    pub async fn repository_loading(&self) -> bool {
        self.state.read().await.repository_loading
    }

    /// True while any of the three collections is being fetched.
    pub async fn loading(&self) -> bool {
        let state = self.state.read().await;
        state.plugins_loading || state.configs_loading || state.repository_loading
    }
}
