//! Service Catalog
//!
//! Endpoints published by the identity service, and matching them against a
//! [`FilterView`].

use crate::error::{Error, Result};
use crate::service_filter::{FilterView, Interface};
use serde_json::Value;

/// One endpoint of one service in the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub service_type: String,
    pub service_name: Option<String>,
    pub interface: Interface,
    pub region: Option<String>,
    pub url: String,
}

impl Endpoint {
    /// Whether this endpoint satisfies the filter.
    ///
    /// Type and interface must be equal; region and name only count when the
    /// filter sets them.
    pub fn matches(&self, filter: &FilterView) -> bool {
        if self.service_type != filter.service_type || self.interface != filter.interface {
            return false;
        }
        if let Some(region) = &filter.region_name {
            if self.region.as_deref() != Some(region.as_str()) {
                return false;
            }
        }
        if let Some(name) = &filter.service_name {
            if self.service_name.as_deref() != Some(name.as_str()) {
                return false;
            }
        }
        true
    }
}

/// The list of endpoints returned with a token
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    endpoints: Vec<Endpoint>,
}

impl Catalog {
    pub fn new(endpoints: Vec<Endpoint>) -> Self {
        Self { endpoints }
    }

    /// Parse the `catalog` array of an identity v3 token body.
    ///
    /// Endpoints with an unknown interface are skipped.
    pub fn from_token_body(token: &Value) -> Self {
        let mut endpoints = Vec::new();

        let Some(services) = token.get("catalog").and_then(|v| v.as_array()) else {
            return Self::default();
        };

        for service in services {
            let Some(service_type) = service.get("type").and_then(|v| v.as_str()) else {
                continue;
            };
            let service_name = service
                .get("name")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string());

            let entries = service
                .get("endpoints")
                .and_then(|v| v.as_array())
                .map(|v| v.as_slice())
                .unwrap_or_default();

            for entry in entries {
                let Some(url) = entry.get("url").and_then(|v| v.as_str()) else {
                    continue;
                };
                let interface = match entry
                    .get("interface")
                    .and_then(|v| v.as_str())
                    .map(str::parse::<Interface>)
                {
                    Some(Ok(interface)) => interface,
                    _ => {
                        tracing::debug!("Skipping {} endpoint without a known interface", service_type);
                        continue;
                    }
                };
                let region = entry
                    .get("region_id")
                    .or_else(|| entry.get("region"))
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string());

                endpoints.push(Endpoint {
                    service_type: service_type.to_lowercase(),
                    service_name: service_name.clone(),
                    interface,
                    region,
                    url: url.to_string(),
                });
            }
        }

        Self { endpoints }
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// First endpoint matching the filter
    pub fn find(&self, filter: &FilterView) -> Result<&Endpoint> {
        self.endpoints
            .iter()
            .find(|e| e.matches(filter))
            .ok_or_else(|| Error::EndpointNotFound {
                service_type: filter.service_type.clone(),
                interface: filter.interface.to_string(),
                region: filter.region_name.clone().unwrap_or_else(|| "any".to_string()),
            })
    }

    /// Regions advertised by any endpoint, in catalog order
    pub fn regions(&self) -> Vec<String> {
        let mut regions: Vec<String> = Vec::new();
        for region in self.endpoints.iter().filter_map(|e| e.region.as_ref()) {
            if !regions.contains(region) {
                regions.push(region.clone());
            }
        }
        regions
    }
}

/// Drop a trailing version segment (`/v2.0`, `/v3/`) and any project id after it.
///
/// The resolved version of the service filter is the one that gets appended.
pub fn strip_version_suffix(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    let mut segments: Vec<&str> = trimmed.split('/').collect();

    // Keep scheme and host ("https:", "", "host")
    let min_len = if trimmed.contains("://") { 3 } else { 1 };

    if let Some(pos) = segments.iter().rposition(|s| is_version_segment(s)) {
        if pos >= min_len {
            segments.truncate(pos);
        }
    }

    segments.join("/")
}

fn is_version_segment(segment: &str) -> bool {
    let Some(rest) = segment.strip_prefix('v') else {
        return false;
    };
    !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit() || c == '.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service_filter::ServiceFilter;
    use serde_json::json;

    fn token_body() -> Value {
        json!({
            "catalog": [
                {
                    "type": "identity",
                    "name": "keystone",
                    "endpoints": [
                        {"interface": "public", "region_id": "jp1", "url": "https://identity-jp1.example.com/v3"},
                        {"interface": "admin", "region_id": "jp1", "url": "https://identity-admin.example.com"}
                    ]
                },
                {
                    "type": "database",
                    "name": "rdb",
                    "endpoints": [
                        {"interface": "public", "region": "jp1", "url": "https://db-jp1.example.com/v1.0/abc"},
                        {"interface": "public", "region": "jp2", "url": "https://db-jp2.example.com"},
                        {"interface": "bogus", "region": "jp2", "url": "https://ignored.example.com"}
                    ]
                }
            ]
        })
    }

    #[test]
    fn test_parse_catalog() {
        let catalog = Catalog::from_token_body(&token_body());
        assert_eq!(catalog.endpoints().len(), 4);
        assert_eq!(catalog.regions(), vec!["jp1".to_string(), "jp2".to_string()]);
    }

    #[test]
    fn test_find_by_interface() {
        let catalog = Catalog::from_token_body(&token_body());
        let filter = ServiceFilter::new("identity")
            .unwrap()
            .with_interface(Interface::Admin);
        let endpoint = catalog.find(&filter.filter_view()).unwrap();
        assert_eq!(endpoint.url, "https://identity-admin.example.com");
    }

    #[test]
    fn test_find_by_region() {
        let catalog = Catalog::from_token_body(&token_body());
        let filter = ServiceFilter::new("database").unwrap().with_region("jp2");
        let endpoint = catalog.find(&filter.filter_view()).unwrap();
        assert_eq!(endpoint.url, "https://db-jp2.example.com");
    }

    #[test]
    fn test_find_missing_service() {
        let catalog = Catalog::from_token_body(&token_body());
        let filter = ServiceFilter::new("network").unwrap();
        assert!(matches!(
            catalog.find(&filter.filter_view()),
            Err(Error::EndpointNotFound { .. })
        ));
    }

    #[test]
    fn test_service_name_must_match_when_set() {
        let catalog = Catalog::from_token_body(&token_body());
        let filter = ServiceFilter::new("identity")
            .unwrap()
            .with_service_name("other");
        assert!(catalog.find(&filter.filter_view()).is_err());
    }

    #[test]
    fn test_strip_version_suffix() {
        assert_eq!(
            strip_version_suffix("https://identity.example.com/v3"),
            "https://identity.example.com"
        );
        assert_eq!(
            strip_version_suffix("https://db.example.com/v1.0/abc123/"),
            "https://db.example.com"
        );
        assert_eq!(
            strip_version_suffix("https://net.example.com/network/v2.0"),
            "https://net.example.com/network"
        );
        assert_eq!(
            strip_version_suffix("https://net.example.com/"),
            "https://net.example.com"
        );
        assert_eq!(
            strip_version_suffix("https://vault.example.com"),
            "https://vault.example.com"
        );
    }
}
