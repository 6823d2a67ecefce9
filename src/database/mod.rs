//! Database service
//!
//! Relational database instances, their users and databases, and the
//! flavors instances are created from. The database endpoint carries the
//! project id in its path.

mod proxy;

pub use proxy::{CreateInstance, Proxy};

use crate::error::Result;
use crate::resource::{service_filter, string_field};
use crate::service_filter::ServiceFilter;
use serde_json::Value;

/// Registry key of the database service
pub const SERVICE_KEY: &str = "database";

pub const INSTANCES: &str = "database-instances";
pub const USERS: &str = "database-users";
pub const DATABASES: &str = "database-databases";
pub const FLAVORS: &str = "database-flavors";

/// Service filter for the database endpoint
pub fn database_service() -> Result<ServiceFilter> {
    service_filter(SERVICE_KEY)
}

/// Database instance
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    pub id: String,
    pub name: String,
    pub status: String,
    pub flavor_id: Option<String>,
    pub datastore_type: Option<String>,
    pub datastore_version: Option<String>,
    /// Volume size in GB
    pub volume_size: Option<u64>,
    pub availability_zone: Option<String>,
    pub created: Option<String>,
    pub updated: Option<String>,
}

impl From<&Value> for Instance {
    fn from(value: &Value) -> Self {
        let nested = |outer: &str, inner: &str| {
            value
                .get(outer)
                .and_then(|v| v.get(inner))
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
        };

        Self {
            id: string_field(value, "id").unwrap_or_else(|| "-".to_string()),
            name: string_field(value, "name").unwrap_or_else(|| "-".to_string()),
            status: string_field(value, "status").unwrap_or_else(|| "UNKNOWN".to_string()),
            flavor_id: nested("flavor", "id").or_else(|| string_field(value, "flavorRef")),
            datastore_type: nested("datastore", "type"),
            datastore_version: nested("datastore", "version"),
            volume_size: value
                .get("volume")
                .and_then(|v| v.get("size"))
                .and_then(|v| v.as_u64()),
            availability_zone: string_field(value, "availability_zone"),
            created: string_field(value, "created"),
            updated: string_field(value, "updated"),
        }
    }
}

/// User of a database instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub name: String,
    pub host: Option<String>,
    /// Names of the databases the user is granted
    pub databases: Vec<String>,
}

impl From<&Value> for User {
    fn from(value: &Value) -> Self {
        let databases = value
            .get("databases")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|d| d.get("name").and_then(|v| v.as_str()).or_else(|| d.as_str()))
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            name: string_field(value, "name").unwrap_or_else(|| "-".to_string()),
            host: string_field(value, "host"),
            databases,
        }
    }
}

/// Database inside an instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Database {
    pub name: String,
    pub character_set: Option<String>,
    pub collate: Option<String>,
}

impl From<&Value> for Database {
    fn from(value: &Value) -> Self {
        Self {
            name: string_field(value, "name").unwrap_or_else(|| "-".to_string()),
            character_set: string_field(value, "character_set"),
            collate: string_field(value, "collate"),
        }
    }
}

/// Instance size
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flavor {
    pub id: String,
    pub name: String,
    pub vcpus: Option<u64>,
    /// Memory in MB
    pub ram: Option<u64>,
    /// Disk in GB
    pub disk: Option<u64>,
}

impl From<&Value> for Flavor {
    fn from(value: &Value) -> Self {
        let number = |key: &str| value.get(key).and_then(|v| v.as_u64());
        Self {
            id: string_field(value, "id").unwrap_or_else(|| "-".to_string()),
            name: string_field(value, "name").unwrap_or_else(|| "-".to_string()),
            vcpus: number("vcpus"),
            ram: number("ram"),
            disk: number("disk"),
        }
    }
}
