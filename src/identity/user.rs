//! Identity Users

use crate::cloud::client::CloudClient;
use crate::error::Result;
use crate::resource::{self, require_resource, string_field};
use serde_json::Value;

/// Registry key of the user resource
pub const RESOURCE_KEY: &str = "identity-users";

/// User information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Domain owning the user
    pub domain_id: Option<String>,
    pub email: Option<String>,
    /// Project used when a token request names none
    pub default_project_id: Option<String>,
    /// Disabled users cannot authenticate
    pub is_enabled: bool,
}

impl From<&Value> for User {
    fn from(value: &Value) -> Self {
        Self {
            id: string_field(value, "id").unwrap_or_else(|| "-".to_string()),
            name: string_field(value, "name").unwrap_or_else(|| "-".to_string()),
            description: string_field(value, "description"),
            domain_id: string_field(value, "domain_id"),
            email: string_field(value, "email"),
            default_project_id: string_field(value, "default_project_id"),
            is_enabled: value
                .get("enabled")
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
        }
    }
}

/// List users visible to the caller
pub async fn list_users(client: &CloudClient) -> Result<Vec<User>> {
    let def = require_resource(RESOURCE_KEY)?;
    let items = resource::list(client, def, &[], &[]).await?;
    Ok(items.iter().map(User::from).collect())
}

/// Find a user by id or name
pub async fn find_user(
    client: &CloudClient,
    name_or_id: &str,
    ignore_missing: bool,
) -> Result<Option<User>> {
    let def = require_resource(RESOURCE_KEY)?;
    let item = resource::find(client, def, &[], name_or_id, ignore_missing).await?;
    Ok(item.as_ref().map(User::from))
}
