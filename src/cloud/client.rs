//! Cloud Client
//!
//! Main client for the cloud APIs, combining authentication, the service
//! catalog, version resolution and HTTP.

use super::auth::{AuthMethod, AuthToken, Credentials};
use super::catalog::strip_version_suffix;
use super::http::{EclHttpClient, RequestOptions};
use crate::error::{Error, Result};
use crate::service_filter::{Interface, ServiceFilter};
use serde_json::Value;

/// Main cloud client
#[derive(Clone)]
pub struct CloudClient {
    pub credentials: Credentials,
    pub http: EclHttpClient,
    /// Region applied to services that do not name one
    pub region: Option<String>,
    /// Interface applied to services declared with the default (public) interface
    pub interface: Option<Interface>,
}

impl CloudClient {
    /// Create a new client
    pub fn new(method: AuthMethod) -> Result<Self> {
        let http = EclHttpClient::new()?;
        let credentials = Credentials::new(method, http.clone());

        Ok(Self {
            credentials,
            http,
            region: None,
            interface: None,
        })
    }

    pub fn with_region(mut self, region: Option<String>) -> Self {
        self.region = region;
        self
    }

    pub fn with_interface(mut self, interface: Option<Interface>) -> Self {
        self.interface = interface;
        self
    }

    /// Switch to a different region
    pub fn switch_region(&mut self, region: &str) {
        self.region = Some(region.to_string());
    }

    /// Get the current token
    pub async fn get_token(&self) -> Result<AuthToken> {
        self.credentials.get_token().await
    }

    /// Apply the client's region and interface preferences to a service filter
    pub fn apply_preferences(&self, filter: &mut ServiceFilter) {
        if filter.region().is_none() {
            filter.set_region(self.region.clone());
        }
        if let Some(interface) = self.interface {
            if filter.interface() == Interface::Public {
                filter.set_interface(interface);
            }
        }
    }

    /// Build the full URL of `path` on the service described by `filter`
    pub async fn endpoint_url(&self, filter: &ServiceFilter, path: &str) -> Result<String> {
        let auth = self.get_token().await?;
        let mut filter = filter.clone();
        self.apply_preferences(&mut filter);
        build_url(&auth, &mut filter, path)
    }

    /// Make a GET request on a service
    pub async fn get(&self, filter: &ServiceFilter, path: &str) -> Result<Value> {
        let (url, auth) = self.prepare(filter, path).await?;
        self.http.get(&url, &request_options(&auth, filter)).await
    }

    /// Make a POST request on a service
    pub async fn post(&self, filter: &ServiceFilter, path: &str, body: Option<&Value>) -> Result<Value> {
        let (url, auth) = self.prepare(filter, path).await?;
        self.http.post(&url, &request_options(&auth, filter), body).await
    }

    /// Make a PUT request on a service
    pub async fn put(&self, filter: &ServiceFilter, path: &str, body: Option<&Value>) -> Result<Value> {
        let (url, auth) = self.prepare(filter, path).await?;
        self.http.put(&url, &request_options(&auth, filter), body).await
    }

    /// Make a PATCH request on a service
    pub async fn patch(&self, filter: &ServiceFilter, path: &str, body: Option<&Value>) -> Result<Value> {
        let (url, auth) = self.prepare(filter, path).await?;
        self.http.patch(&url, &request_options(&auth, filter), body).await
    }

    /// Make a DELETE request on a service
    pub async fn delete(&self, filter: &ServiceFilter, path: &str) -> Result<Value> {
        let (url, auth) = self.prepare(filter, path).await?;
        self.http.delete(&url, &request_options(&auth, filter)).await
    }

    async fn prepare(&self, filter: &ServiceFilter, path: &str) -> Result<(String, AuthToken)> {
        let auth = self.get_token().await?;
        let mut filter = filter.clone();
        self.apply_preferences(&mut filter);
        let url = build_url(&auth, &mut filter, path)?;
        Ok((url, auth))
    }
}

fn request_options<'a>(auth: &'a AuthToken, filter: &'a ServiceFilter) -> RequestOptions<'a> {
    RequestOptions {
        token: Some(auth.token.as_str()),
        subject_token: None,
        api_version: filter
            .api_version()
            .map(|api_version| (filter.service_type(), api_version)),
    }
}

/// Join catalog endpoint, resolved version, project id and resource path
pub fn build_url(auth: &AuthToken, filter: &mut ServiceFilter, path: &str) -> Result<String> {
    let endpoint = auth.catalog.find(&filter.filter_view())?;

    url::Url::parse(&endpoint.url).map_err(|e| {
        Error::InvalidArgument(format!("catalog URL '{}' is invalid: {}", endpoint.url, e))
    })?;

    let mut url = strip_version_suffix(&endpoint.url);

    let version = filter.resolve_path(None);
    push_segment(&mut url, &version);

    if filter.requires_project_id() {
        let project_id = auth.project_id.as_deref().ok_or_else(|| {
            Error::Auth(format!(
                "{} needs a project id but the token is not project scoped",
                filter.service_type()
            ))
        })?;
        push_segment(&mut url, project_id);
    }

    push_segment(&mut url, path);

    tracing::debug!("Resolved {} -> {}", filter, url);
    Ok(url)
}

fn push_segment(url: &mut String, segment: &str) {
    let segment = segment.trim_matches('/');
    if segment.is_empty() {
        return;
    }
    url.push('/');
    url.push_str(segment);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::catalog::{Catalog, Endpoint};
    use crate::service_filter::ValidVersion;
    use std::sync::Arc;

    fn auth() -> AuthToken {
        AuthToken {
            token: "tok".to_string(),
            project_id: Some("proj-1".to_string()),
            catalog: Arc::new(Catalog::new(vec![
                Endpoint {
                    service_type: "database".to_string(),
                    service_name: None,
                    interface: Interface::Public,
                    region: Some("jp1".to_string()),
                    url: "https://rdb.example.com/v1.0/proj-1".to_string(),
                },
                Endpoint {
                    service_type: "network".to_string(),
                    service_name: None,
                    interface: Interface::Internal,
                    region: Some("jp1".to_string()),
                    url: "https://net-internal.example.com".to_string(),
                },
                Endpoint {
                    service_type: "network".to_string(),
                    service_name: None,
                    interface: Interface::Public,
                    region: Some("jp1".to_string()),
                    url: "https://net.example.com/".to_string(),
                },
            ])),
        }
    }

    fn database() -> ServiceFilter {
        ServiceFilter::new("database")
            .unwrap()
            .with_valid_versions(vec![ValidVersion::with_path("v1", "v1.0")])
            .with_requires_project_id(true)
    }

    #[test]
    fn test_build_url_with_project_id() {
        let url = build_url(&auth(), &mut database(), "/instances").unwrap();
        assert_eq!(url, "https://rdb.example.com/v1.0/proj-1/instances");
    }

    #[test]
    fn test_build_url_unscoped_token_fails() {
        let mut auth = auth();
        auth.project_id = None;
        assert!(matches!(
            build_url(&auth, &mut database(), "/instances"),
            Err(Error::Auth(_))
        ));
    }

    #[test]
    fn test_build_url_path_override() {
        let mut filter = ServiceFilter::new("network")
            .unwrap()
            .with_valid_versions(vec![ValidVersion::new("v2.0")]);
        filter.set_path(Some("/".to_string()));
        let url = build_url(&auth(), &mut filter, "/").unwrap();
        assert_eq!(url, "https://net.example.com");
    }

    #[test]
    fn test_preferences_fill_region_and_interface() {
        let client = CloudClient::new(AuthMethod::Token {
            auth_url: "https://keystone.example.com".to_string(),
            token: "tok".to_string(),
        })
        .unwrap()
        .with_region(Some("jp1".to_string()))
        .with_interface(Some(Interface::Internal));

        let mut filter = ServiceFilter::new("network").unwrap();
        client.apply_preferences(&mut filter);
        assert_eq!(filter.region(), Some("jp1"));
        assert_eq!(filter.interface(), Interface::Internal);

        let mut admin = ServiceFilter::new("identity")
            .unwrap()
            .with_interface(Interface::Admin)
            .with_region("jp2");
        client.apply_preferences(&mut admin);
        assert_eq!(admin.region(), Some("jp2"));
        assert_eq!(admin.interface(), Interface::Admin);
    }

    #[test]
    fn test_request_options_microversion() {
        let auth = auth();
        let filter = database().with_api_version("1.1");
        let opts = request_options(&auth, &filter);
        assert_eq!(opts.token, Some("tok"));
        assert_eq!(opts.api_version, Some(("database", "1.1")));
    }
}
