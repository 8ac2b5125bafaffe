//! Plugin management for the kohort analytics platform.
//!
//! An in-memory state container ([`store::PluginStore`]) that mediates
//! between the plugin REST API and a rendering layer: installed plugins,
//! their per-tenant configuration, the public plugin repository, and pure
//! derived views over all three.

pub mod error;
pub mod schema;
pub mod store;
pub mod types;
pub mod views;

pub use {
    error::{Error, Result},
    schema::{ConfigSchema, ConfigValues, FieldKind, FieldSpec, FieldValue},
    store::PluginStore,
    types::{
        InstallSource, InstalledPlugin, Plugin, PluginAccess, PluginConfig, PluginTab,
        RepositoryEntry,
    },
};
