//! Resource Fetcher
//!
//! Generic CRUD operations driven by a [`ResourceDef`]: paths are built from
//! the definition's base path, bodies are wrapped and unwrapped with its
//! resource keys, and its capabilities are enforced.

use super::registry::ResourceDef;
use crate::cloud::client::CloudClient;
use crate::error::{Error, Result};
use serde_json::Value;
use std::time::Duration;

/// Values for the `{placeholders}` of a base path
pub type PathParams<'a> = [(&'a str, &'a str)];

/// Which operation is being checked against a resource's capabilities
#[derive(Debug, Clone, Copy)]
enum Operation {
    Create,
    Retrieve,
    Update,
    Delete,
    List,
}

impl Operation {
    fn as_str(self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Retrieve => "retrieve",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::List => "list",
        }
    }
}

fn ensure_allowed(def: &ResourceDef, op: Operation) -> Result<()> {
    let allowed = match op {
        Operation::Create => def.allow.create,
        Operation::Retrieve => def.allow.retrieve,
        Operation::Update => def.allow.update,
        Operation::Delete => def.allow.delete,
        Operation::List => def.allow.list,
    };

    if allowed {
        Ok(())
    } else {
        Err(Error::MethodNotSupported {
            resource: def.display_name.clone(),
            method: op.as_str().to_string(),
        })
    }
}

/// Fill the base path placeholders and append an optional resource id
pub fn resource_path(def: &ResourceDef, params: &PathParams<'_>, id: Option<&str>) -> Result<String> {
    let mut path = String::with_capacity(def.base_path.len());
    let mut rest = def.base_path.as_str();

    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        let name = &rest[start + 1..start + len];
        let value = params
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| *v)
            .ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "{} requires the '{}' parameter",
                    def.display_name, name
                ))
            })?;
        path.push_str(&rest[..start]);
        path.push_str(&urlencoding::encode(value));
        rest = &rest[start + len + 1..];
    }
    path.push_str(rest);

    if let Some(id) = id {
        if !path.ends_with('/') {
            path.push('/');
        }
        path.push_str(&urlencoding::encode(id));
    }

    Ok(path)
}

/// Append query parameters to a path
fn add_query_params(path: &str, query: &[(String, String)]) -> String {
    if query.is_empty() {
        return path.to_string();
    }

    let query_parts: Vec<String> = query
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect();

    if path.contains('?') {
        format!("{}&{}", path, query_parts.join("&"))
    } else {
        format!("{}?{}", path, query_parts.join("&"))
    }
}

/// Take the single resource out of a `{resource_key: {...}}` body
fn unwrap_single(def: &ResourceDef, response: Value) -> Value {
    match (&def.resource_key, response) {
        (Some(key), Value::Object(mut map)) if map.get(key).is_some_and(|v| v.is_object()) => {
            map.remove(key).unwrap_or(Value::Null)
        }
        (_, response) => response,
    }
}

/// Extract items from a list response using the resources key
pub fn extract_items(def: &ResourceDef, response: &Value) -> Vec<Value> {
    if let Some(arr) = response.as_array() {
        return arr.clone();
    }

    def.resources_key
        .as_deref()
        .and_then(|key| response.get(key))
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default()
}

/// List all resources
pub async fn list(
    client: &CloudClient,
    def: &ResourceDef,
    params: &PathParams<'_>,
    query: &[(String, String)],
) -> Result<Vec<Value>> {
    ensure_allowed(def, Operation::List)?;
    let filter = def.filter()?;
    let path = add_query_params(&resource_path(def, params, None)?, query);

    let response = client.get(&filter, &path).await?;
    let items = extract_items(def, &response);
    tracing::debug!("Listed {} {}", items.len(), def.display_name);
    Ok(items)
}

/// Get a single resource by id
pub async fn get(
    client: &CloudClient,
    def: &ResourceDef,
    params: &PathParams<'_>,
    id: &str,
) -> Result<Value> {
    ensure_allowed(def, Operation::Retrieve)?;
    let filter = def.filter()?;
    let path = resource_path(def, params, Some(id))?;

    let response = client.get(&filter, &path).await?;
    Ok(unwrap_single(def, response))
}

/// Find a single resource by id, then by name.
///
/// Returns `Ok(None)` for a missing resource when `ignore_missing` is set.
pub async fn find(
    client: &CloudClient,
    def: &ResourceDef,
    params: &PathParams<'_>,
    name_or_id: &str,
    ignore_missing: bool,
) -> Result<Option<Value>> {
    if def.allow.retrieve {
        match get(client, def, params, name_or_id).await {
            Ok(item) => return Ok(Some(item)),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }
    }

    let items = list(client, def, params, &[]).await?;
    let mut matches = items.into_iter().filter(|item| {
        [&def.id_field, &def.name_field]
            .iter()
            .any(|field| item.get(field.as_str()).and_then(|v| v.as_str()) == Some(name_or_id))
    });

    match (matches.next(), matches.next()) {
        (Some(item), None) => Ok(Some(item)),
        (Some(_), Some(_)) => Err(Error::InvalidArgument(format!(
            "More than one {} matches '{}'",
            def.display_name, name_or_id
        ))),
        (None, _) if ignore_missing => Ok(None),
        (None, _) => Err(Error::NotFound(format!(
            "No {} found for {}",
            def.display_name, name_or_id
        ))),
    }
}

/// Create a resource from attributes
pub async fn create(
    client: &CloudClient,
    def: &ResourceDef,
    params: &PathParams<'_>,
    attrs: Value,
) -> Result<Value> {
    ensure_allowed(def, Operation::Create)?;
    let filter = def.filter()?;
    let path = resource_path(def, params, None)?;

    let body = match (&def.resources_key, &def.resource_key) {
        (Some(key), _) if def.create_as_list => serde_json::json!({ key.as_str(): [attrs.clone()] }),
        (_, Some(key)) => serde_json::json!({ key.as_str(): attrs.clone() }),
        _ => attrs.clone(),
    };

    tracing::info!("Creating {}", def.display_name);
    let response = client.post(&filter, &path, Some(&body)).await?;

    // Some services answer 202 with no body
    if response.is_null() {
        return Ok(attrs);
    }
    Ok(unwrap_single(def, response))
}

/// Update a resource (PATCH or PUT per the definition)
pub async fn update(
    client: &CloudClient,
    def: &ResourceDef,
    params: &PathParams<'_>,
    id: &str,
    attrs: Value,
) -> Result<Value> {
    ensure_allowed(def, Operation::Update)?;
    let filter = def.filter()?;
    let path = resource_path(def, params, Some(id))?;

    let body = match &def.resource_key {
        Some(key) => serde_json::json!({ key.as_str(): attrs }),
        None => attrs,
    };

    tracing::info!("Updating {} {}", def.display_name, id);
    let response = if def.patch_update {
        client.patch(&filter, &path, Some(&body)).await?
    } else {
        client.put(&filter, &path, Some(&body)).await?
    };
    Ok(unwrap_single(def, response))
}

/// Delete a resource.
///
/// A missing resource is not an error when `ignore_missing` is set.
pub async fn delete(
    client: &CloudClient,
    def: &ResourceDef,
    params: &PathParams<'_>,
    id: &str,
    ignore_missing: bool,
) -> Result<()> {
    ensure_allowed(def, Operation::Delete)?;
    let filter = def.filter()?;
    let path = resource_path(def, params, Some(id))?;

    tracing::info!("Deleting {} {}", def.display_name, id);
    match client.delete(&filter, &path).await {
        Ok(_) => Ok(()),
        Err(e) if e.is_not_found() && ignore_missing => {
            tracing::debug!("{} {} already gone", def.display_name, id);
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Poll a resource until its status field reaches `status`.
///
/// Fails when the status enters one of `failures` or `wait` elapses.
#[allow(clippy::too_many_arguments)]
pub async fn wait_for_status(
    client: &CloudClient,
    def: &ResourceDef,
    params: &PathParams<'_>,
    id: &str,
    status: &str,
    failures: &[&str],
    interval: Duration,
    wait: Duration,
) -> Result<Value> {
    let started = tokio::time::Instant::now();

    loop {
        let item = get(client, def, params, id).await?;
        let current = item
            .get(def.status_field.as_str())
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        if current.eq_ignore_ascii_case(status) {
            return Ok(item);
        }
        if failures.iter().any(|f| current.eq_ignore_ascii_case(f)) {
            return Err(Error::ResourceFailure {
                id: id.to_string(),
                status: current,
            });
        }
        if started.elapsed() >= wait {
            return Err(Error::Timeout {
                id: id.to_string(),
                status: status.to_string(),
                seconds: wait.as_secs(),
            });
        }

        tracing::debug!("{} {} is {}, waiting for {}", def.display_name, id, current, status);
        tokio::time::sleep(interval).await;
    }
}

/// Read a string field out of a resource body
pub fn string_field(item: &Value, key: &str) -> Option<String> {
    item.get(key).and_then(|v| v.as_str()).map(|s| s.to_string())
}

/// Extract a value from JSON using a dot-notation path
pub fn extract_json_value(item: &Value, path: &str) -> String {
    let parts: Vec<&str> = path.split('.').collect();
    let mut current = item;

    for part in parts {
        // Handle array index
        if let Ok(idx) = part.parse::<usize>() {
            current = match current.get(idx) {
                Some(v) => v,
                None => return "-".to_string(),
            };
        } else {
            current = match current.get(part) {
                Some(v) => v,
                None => return "-".to_string(),
            };
        }
    }

    match current {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(_) => "[object]".to_string(),
    }
}
