//! Resource Registry - Load service and resource definitions from JSON
//!
//! This module loads all service declarations and resource definitions from
//! embedded JSON files and provides lookup functions for the rest of the
//! crate.

use crate::error::{Error, Result};
use crate::service_filter::{Interface, ServiceFilter, ValidVersion};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Embedded resource JSON files (compiled into the binary)
const RESOURCE_FILES: &[&str] = &[
    include_str!("../resources/identity.json"),
    include_str!("../resources/database.json"),
    include_str!("../resources/network.json"),
];

/// Service declaration from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceDef {
    pub service_type: String,
    #[serde(default)]
    pub interface: Interface,
    /// Dotted namespace the service is declared in
    pub namespace: String,
    /// Supported versions, most preferred first
    #[serde(default)]
    pub valid_versions: Vec<ValidVersion>,
    #[serde(default)]
    pub requires_project_id: bool,
}

impl ServiceDef {
    /// A fresh service filter for this service
    pub fn filter(&self) -> Result<ServiceFilter> {
        Ok(ServiceFilter::new(&self.service_type)?
            .with_interface(self.interface)
            .with_valid_versions(self.valid_versions.clone())
            .with_namespace(self.namespace.clone())
            .with_requires_project_id(self.requires_project_id))
    }
}

/// Column definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnDef {
    pub header: String,
    pub json_path: String,
    pub width: u16,
}

/// Operations a resource allows
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Capabilities {
    #[serde(default)]
    pub create: bool,
    #[serde(default)]
    pub retrieve: bool,
    #[serde(default)]
    pub update: bool,
    #[serde(default)]
    pub delete: bool,
    #[serde(default)]
    pub list: bool,
}

fn default_id_field() -> String {
    "id".to_string()
}

fn default_name_field() -> String {
    "name".to_string()
}

fn default_status_field() -> String {
    "status".to_string()
}

/// Resource definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceDef {
    pub display_name: String,
    /// Key of the owning service in the registry
    pub service: String,
    /// Path below the service's version segment; may contain `{placeholders}`
    pub base_path: String,
    /// Key wrapping a single resource in request/response bodies
    #[serde(default)]
    pub resource_key: Option<String>,
    /// Key wrapping a list of resources in response bodies
    #[serde(default)]
    pub resources_key: Option<String>,
    #[serde(default = "default_id_field")]
    pub id_field: String,
    #[serde(default = "default_name_field")]
    pub name_field: String,
    #[serde(default = "default_status_field")]
    pub status_field: String,
    #[serde(default)]
    pub allow: Capabilities,
    /// Update with PATCH instead of PUT
    #[serde(default)]
    pub patch_update: bool,
    /// Create bodies carry a one-element list under `resources_key`
    #[serde(default)]
    pub create_as_list: bool,
    /// Version pinned by this resource (`""` for unversioned)
    #[serde(default)]
    pub version: Option<String>,
    /// Path override replacing the version segment
    #[serde(default)]
    pub service_path: Option<String>,
    #[serde(default)]
    pub columns: Vec<ColumnDef>,
}

impl ResourceDef {
    /// Service filter for requests on this resource
    pub fn filter(&self) -> Result<ServiceFilter> {
        let service = get_service(&self.service).ok_or_else(|| {
            Error::InvalidArgument(format!(
                "resource '{}' names unknown service '{}'",
                self.display_name, self.service
            ))
        })?;

        let mut filter = service.filter()?;
        if let Some(version) = &self.version {
            filter.set_version(Some(version.clone()));
        }
        if let Some(path) = &self.service_path {
            filter.set_path(Some(path.clone()));
        }
        Ok(filter)
    }

    /// Names of the `{placeholders}` in the base path
    pub fn path_params(&self) -> Vec<&str> {
        let mut params = Vec::new();
        let mut rest = self.base_path.as_str();
        while let Some(start) = rest.find('{') {
            let Some(len) = rest[start..].find('}') else {
                break;
            };
            params.push(&rest[start + 1..start + len]);
            rest = &rest[start + len + 1..];
        }
        params
    }
}

/// Root structure of resources/*.json
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceConfig {
    #[serde(default)]
    pub services: HashMap<String, ServiceDef>,
    #[serde(default)]
    pub resources: HashMap<String, ResourceDef>,
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<ResourceConfig> = OnceLock::new();

/// Get the resource registry (loads from embedded JSON on first access)
pub fn get_registry() -> &'static ResourceConfig {
    REGISTRY.get_or_init(|| {
        let mut final_config = ResourceConfig {
            services: HashMap::new(),
            resources: HashMap::new(),
        };

        for content in RESOURCE_FILES {
            let partial: ResourceConfig = serde_json::from_str(content)
                .unwrap_or_else(|e| panic!("Failed to parse embedded resource JSON: {}", e));
            final_config.services.extend(partial.services);
            final_config.resources.extend(partial.resources);
        }

        final_config
    })
}

/// Get a service declaration by key
pub fn get_service(key: &str) -> Option<&'static ServiceDef> {
    get_registry().services.get(key)
}

/// A fresh service filter for a declared service
pub fn service_filter(key: &str) -> Result<ServiceFilter> {
    get_service(key)
        .ok_or_else(|| Error::InvalidArgument(format!("Unknown service: {}", key)))?
        .filter()
}

/// Get a resource definition by key
pub fn get_resource(key: &str) -> Option<&'static ResourceDef> {
    get_registry().resources.get(key)
}

/// Get a resource definition by key, failing for unknown keys
pub fn require_resource(key: &str) -> Result<&'static ResourceDef> {
    get_resource(key).ok_or_else(|| Error::InvalidArgument(format!("Unknown resource: {}", key)))
}

/// Get all service keys, sorted
pub fn get_all_service_keys() -> Vec<&'static str> {
    let mut keys: Vec<&str> = get_registry().services.keys().map(|s| s.as_str()).collect();
    keys.sort_unstable();
    keys
}

/// Get all resource keys, sorted (for autocomplete)
pub fn get_all_resource_keys() -> Vec<&'static str> {
    let mut keys: Vec<&str> = get_registry()
        .resources
        .keys()
        .map(|s| s.as_str())
        .collect();
    keys.sort_unstable();
    keys
}
