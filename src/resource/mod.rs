//! Resource abstraction layer
//!
//! This module provides a data-driven approach to managing cloud resources.
//! Service declarations and resource definitions are loaded from JSON files at
//! compile time, allowing new resource types to be added without code changes.
//!
//! # Architecture
//!
//! - [`registry`] - Loads and caches service and resource definitions from embedded JSON
//! - [`fetcher`] - Generic list/get/find/create/update/delete/wait operations
//!
//! # Resource Definitions
//!
//! Resources are defined in JSON files under `src/resources/`:
//! - `identity.json` - Identity service (users, projects)
//! - `database.json` - Database service (instances, users, databases, flavors)
//! - `network.json` - Network service (API versions)
//!
//! # Example
//!
//! ```ignore
//! use ecl::resource::{list, require_resource};
//! use ecl::cloud::CloudClient;
//!
//! async fn list_users(client: &CloudClient) -> ecl::Result<Vec<serde_json::Value>> {
//!     let resource = require_resource("identity-users")?;
//!     list(client, resource, &[], &[]).await
//! }
//! ```

mod fetcher;
mod registry;

pub use fetcher::{
    create, delete, extract_items, extract_json_value, find, get, list, resource_path,
    string_field, update, wait_for_status, PathParams,
};
pub use registry::*;
