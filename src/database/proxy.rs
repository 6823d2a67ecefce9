//! Database Proxy
//!
//! Typed operations on the database service.

use super::{Database, Flavor, Instance, User, DATABASES, FLAVORS, INSTANCES, USERS};
use crate::cloud::client::CloudClient;
use crate::error::Result;
use crate::resource::{self, require_resource};
use serde_json::{json, Map, Value};
use std::time::Duration;

/// Attributes of a new database instance
#[derive(Debug, Clone, Default)]
pub struct CreateInstance {
    pub name: String,
    pub flavor_id: String,
    /// Volume configuration, e.g. `{"size": 20}`
    pub volume: Value,
    /// Databases created with the instance
    pub databases: Value,
    /// Users created with the instance
    pub users: Value,
    /// Datastore type and version
    pub datastores: Value,
    /// Network interfaces
    pub nics: Value,
    pub availability_zone: Option<String>,
    pub backup_window: Option<String>,
    /// Days to keep backups
    pub backup_retention_period: Option<u32>,
    pub maintenance_window: Option<String>,
    /// Extra attributes sent as-is
    pub extra: Map<String, Value>,
}

impl CreateInstance {
    /// Request body attributes
    pub fn to_attrs(&self) -> Value {
        let mut attrs = self.extra.clone();
        attrs.insert("name".to_string(), json!(self.name));
        attrs.insert("flavorRef".to_string(), json!(self.flavor_id));
        attrs.insert("volume".to_string(), self.volume.clone());
        attrs.insert("databases".to_string(), self.databases.clone());
        attrs.insert("users".to_string(), self.users.clone());
        attrs.insert("datastores".to_string(), self.datastores.clone());
        attrs.insert("nics".to_string(), self.nics.clone());

        if let Some(zone) = &self.availability_zone {
            attrs.insert("availability_zone".to_string(), json!(zone));
        }
        if let Some(window) = &self.backup_window {
            attrs.insert("backup_window".to_string(), json!(window));
        }
        if let Some(days) = self.backup_retention_period {
            // Field name as the API spells it
            attrs.insert("backup_retension_period".to_string(), json!(days));
        }
        if let Some(window) = &self.maintenance_window {
            attrs.insert("maintenance_window".to_string(), json!(window));
        }

        Value::Object(attrs)
    }
}

/// Database service operations
#[derive(Clone)]
pub struct Proxy {
    client: CloudClient,
}

impl Proxy {
    pub fn new(client: CloudClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &CloudClient {
        &self.client
    }

    /// List instances, optionally narrowed by query parameters
    pub async fn instances(&self, query: &[(String, String)]) -> Result<Vec<Instance>> {
        let items = resource::list(&self.client, require_resource(INSTANCES)?, &[], query).await?;
        Ok(items.iter().map(Instance::from).collect())
    }

    pub async fn create_instance(&self, request: &CreateInstance) -> Result<Instance> {
        let item = resource::create(
            &self.client,
            require_resource(INSTANCES)?,
            &[],
            request.to_attrs(),
        )
        .await?;
        Ok(Instance::from(&item))
    }

    pub async fn delete_instance(&self, instance_id: &str, ignore_missing: bool) -> Result<()> {
        resource::delete(
            &self.client,
            require_resource(INSTANCES)?,
            &[],
            instance_id,
            ignore_missing,
        )
        .await
    }

    pub async fn find_instance(&self, name_or_id: &str, ignore_missing: bool) -> Result<Option<Instance>> {
        let item = resource::find(
            &self.client,
            require_resource(INSTANCES)?,
            &[],
            name_or_id,
            ignore_missing,
        )
        .await?;
        Ok(item.as_ref().map(Instance::from))
    }

    pub async fn get_instance(&self, instance_id: &str) -> Result<Instance> {
        let item = resource::get(&self.client, require_resource(INSTANCES)?, &[], instance_id).await?;
        Ok(Instance::from(&item))
    }

    /// Poll an instance until it reaches `status` (e.g. `ACTIVE`)
    pub async fn wait_for_instance(
        &self,
        instance_id: &str,
        status: &str,
        failures: &[&str],
        interval: Duration,
        wait: Duration,
    ) -> Result<Instance> {
        let item = resource::wait_for_status(
            &self.client,
            require_resource(INSTANCES)?,
            &[],
            instance_id,
            status,
            failures,
            interval,
            wait,
        )
        .await?;
        Ok(Instance::from(&item))
    }

    pub async fn flavors(&self) -> Result<Vec<Flavor>> {
        let items = resource::list(&self.client, require_resource(FLAVORS)?, &[], &[]).await?;
        Ok(items.iter().map(Flavor::from).collect())
    }

    pub async fn find_flavor(&self, name_or_id: &str, ignore_missing: bool) -> Result<Option<Flavor>> {
        let item = resource::find(
            &self.client,
            require_resource(FLAVORS)?,
            &[],
            name_or_id,
            ignore_missing,
        )
        .await?;
        Ok(item.as_ref().map(Flavor::from))
    }

    pub async fn get_flavor(&self, flavor_id: &str) -> Result<Flavor> {
        let item = resource::get(&self.client, require_resource(FLAVORS)?, &[], flavor_id).await?;
        Ok(Flavor::from(&item))
    }

    /// List the users of an instance
    pub async fn users(&self, instance_id: &str, query: &[(String, String)]) -> Result<Vec<User>> {
        let items = resource::list(
            &self.client,
            require_resource(USERS)?,
            &[("instance_id", instance_id)],
            query,
        )
        .await?;
        Ok(items.iter().map(User::from).collect())
    }

    /// Create a user on an instance, optionally granting it databases
    pub async fn create_user(
        &self,
        instance_id: &str,
        name: &str,
        password: &str,
        databases: &[&str],
    ) -> Result<User> {
        let mut attrs = json!({ "name": name, "password": password });
        if !databases.is_empty() {
            attrs["databases"] = Value::Array(
                databases.iter().map(|d| json!({ "name": d })).collect(),
            );
        }

        let item = resource::create(
            &self.client,
            require_resource(USERS)?,
            &[("instance_id", instance_id)],
            attrs,
        )
        .await?;
        Ok(User::from(&item))
    }

    pub async fn delete_user(&self, instance_id: &str, name: &str, ignore_missing: bool) -> Result<()> {
        resource::delete(
            &self.client,
            require_resource(USERS)?,
            &[("instance_id", instance_id)],
            name,
            ignore_missing,
        )
        .await
    }

    pub async fn find_user(&self, instance_id: &str, name: &str, ignore_missing: bool) -> Result<Option<User>> {
        let item = resource::find(
            &self.client,
            require_resource(USERS)?,
            &[("instance_id", instance_id)],
            name,
            ignore_missing,
        )
        .await?;
        Ok(item.as_ref().map(User::from))
    }

    /// List the databases of an instance
    pub async fn databases(&self, instance_id: &str, query: &[(String, String)]) -> Result<Vec<Database>> {
        let items = resource::list(
            &self.client,
            require_resource(DATABASES)?,
            &[("instance_id", instance_id)],
            query,
        )
        .await?;
        Ok(items.iter().map(Database::from).collect())
    }

    pub async fn create_database(&self, instance_id: &str, name: &str) -> Result<Database> {
        let item = resource::create(
            &self.client,
            require_resource(DATABASES)?,
            &[("instance_id", instance_id)],
            json!({ "name": name }),
        )
        .await?;
        Ok(Database::from(&item))
    }

    pub async fn delete_database(&self, instance_id: &str, name: &str, ignore_missing: bool) -> Result<()> {
        resource::delete(
            &self.client,
            require_resource(DATABASES)?,
            &[("instance_id", instance_id)],
            name,
            ignore_missing,
        )
        .await
    }

    pub async fn find_database(
        &self,
        instance_id: &str,
        name: &str,
        ignore_missing: bool,
    ) -> Result<Option<Database>> {
        let item = resource::find(
            &self.client,
            require_resource(DATABASES)?,
            &[("instance_id", instance_id)],
            name,
            ignore_missing,
        )
        .await?;
        Ok(item.as_ref().map(Database::from))
    }
}
