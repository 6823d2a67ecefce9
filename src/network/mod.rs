//! Network service
//!
//! Besides its versioned API, the network service publishes the list of API
//! versions it supports at the unversioned root of its endpoint.

use crate::cloud::client::CloudClient;
use crate::error::Result;
use crate::resource::{self, require_resource, service_filter, string_field};
use crate::service_filter::ServiceFilter;
use serde_json::Value;

/// Registry key of the network service
pub const SERVICE_KEY: &str = "network";

/// Registry key of the API version resource
pub const VERSIONS: &str = "network-versions";

/// Service filter for the network endpoint
pub fn network_service() -> Result<ServiceFilter> {
    service_filter(SERVICE_KEY)
}

/// An API version advertised by the service
#[derive(Debug, Clone, PartialEq)]
pub struct Version {
    pub id: String,
    pub status: Option<String>,
    pub links: Vec<Value>,
}

impl From<&Value> for Version {
    fn from(value: &Value) -> Self {
        Self {
            id: string_field(value, "id").unwrap_or_else(|| "-".to_string()),
            status: string_field(value, "status"),
            links: value
                .get("links")
                .and_then(|v| v.as_array())
                .cloned()
                .unwrap_or_default(),
        }
    }
}

/// List the API versions the network service supports
pub async fn list_versions(client: &CloudClient) -> Result<Vec<Version>> {
    let items = resource::list(client, require_resource(VERSIONS)?, &[], &[]).await?;
    Ok(items.iter().map(Version::from).collect())
}

/// The version the service marks as `CURRENT`
pub async fn current_version(client: &CloudClient) -> Result<Option<Version>> {
    let versions = list_versions(client).await?;
    Ok(versions
        .into_iter()
        .find(|v| v.status.as_deref() == Some("CURRENT")))
}
