//! Identity Projects
//!
//! Functions for listing and reading projects.

use crate::cloud::client::CloudClient;
use crate::error::Result;
use crate::resource::{self, require_resource, string_field};
use serde_json::Value;

/// Registry key of the project resource
pub const RESOURCE_KEY: &str = "identity-projects";

/// Project information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub domain_id: Option<String>,
    pub is_enabled: bool,
}

impl From<&Value> for Project {
    fn from(value: &Value) -> Self {
        Self {
            id: string_field(value, "id").unwrap_or_else(|| "-".to_string()),
            name: string_field(value, "name").unwrap_or_else(|| "-".to_string()),
            description: string_field(value, "description"),
            domain_id: string_field(value, "domain_id"),
            is_enabled: value
                .get("enabled")
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
        }
    }
}

/// List all accessible projects
pub async fn list_projects(client: &CloudClient) -> Result<Vec<Project>> {
    let def = require_resource(RESOURCE_KEY)?;
    let items = resource::list(client, def, &[], &[]).await?;
    Ok(items.iter().map(Project::from).collect())
}

/// Get enabled project IDs as a simple list
pub async fn list_project_ids(client: &CloudClient) -> Result<Vec<String>> {
    let projects = list_projects(client).await?;
    Ok(projects
        .into_iter()
        .filter(|p| p.is_enabled)
        .map(|p| p.id)
        .collect())
}

/// Get a single project
pub async fn get_project(client: &CloudClient, id: &str) -> Result<Project> {
    let def = require_resource(RESOURCE_KEY)?;
    let item = resource::get(client, def, &[], id).await?;
    Ok(Project::from(&item))
}
