//! HTTP client for the kohort REST API.
//!
//! Transport only: authentication, status handling, and JSON/form encoding.
//! Endpoint paths and payload types belong to the domain crates built on top.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::{ApiError, Result};
