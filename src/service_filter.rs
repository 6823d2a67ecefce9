//! Service Filter
//!
//! A [`ServiceFilter`] names one API service (type, interface, region, name,
//! version, microversion) and resolves which URL version segment a request
//! for that service should address.
//!
//! # Version resolution
//!
//! Every service declares an ordered list of [`ValidVersion`]s. The first entry
//! is the default. A requested version matches the first declared entry it
//! starts with, so a server reporting `v2.1` is served by a client entry `v2`.
//! Unknown versions fall back to the default instead of failing.
//!
//! # Example
//!
//! ```
//! use ecl::service_filter::{ServiceFilter, ValidVersion};
//!
//! let mut filter = ServiceFilter::new("Identity")
//!     .unwrap()
//!     .with_valid_versions(vec![ValidVersion::new("v3"), ValidVersion::new("v2")])
//!     .with_namespace("ecl.identity.identity_service");
//!
//! assert_eq!(filter.service_type(), "identity");
//! assert_eq!(filter.resolve_path(Some("v2.0")), "v2");
//! assert_eq!(filter.module_path(), "ecl.identity.v2");
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Version marker for services addressed without a version segment
pub const UNVERSIONED: &str = "";

/// A supported API version and the URL path segment used for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ValidVersionDef")]
pub struct ValidVersion {
    module: String,
    path: String,
}

/// Wire shape of a version entry in the resource JSON
#[derive(Deserialize)]
struct ValidVersionDef {
    module: String,
    #[serde(default)]
    path: Option<String>,
}

impl From<ValidVersionDef> for ValidVersion {
    fn from(def: ValidVersionDef) -> Self {
        match def.path {
            Some(path) => Self::with_path(def.module, path),
            None => Self::new(def.module),
        }
    }
}

impl ValidVersion {
    /// Create a version whose path segment is its module name
    pub fn new(module: impl Into<String>) -> Self {
        let module = module.into();
        Self {
            path: module.clone(),
            module,
        }
    }

    /// Create a version with a distinct URL path segment
    pub fn with_path(module: impl Into<String>, path: impl Into<String>) -> Self {
        let module = module.into();
        let path = path.into();
        if path.is_empty() {
            return Self::new(module);
        }
        Self { module, path }
    }

    /// The entry returned for services that declare no versions
    pub fn unversioned() -> Self {
        Self::new(UNVERSIONED)
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Pick the entry serving `requested` from an ordered list of versions.
    ///
    /// Total: an empty list yields [`ValidVersion::unversioned`], an unset or
    /// unmatched request yields the first declared entry.
    pub fn select(requested: Option<&str>, valid_versions: &[ValidVersion]) -> ValidVersion {
        let Some(default) = valid_versions.first() else {
            return Self::unversioned();
        };

        match requested.filter(|v| !v.is_empty()) {
            Some(requested) => Self::find_prefix(requested, valid_versions)
                .unwrap_or(default)
                .clone(),
            None => default.clone(),
        }
    }

    /// First declared entry that `requested` starts with (v2.1 -> v2)
    fn find_prefix<'a>(
        requested: &str,
        valid_versions: &'a [ValidVersion],
    ) -> Option<&'a ValidVersion> {
        valid_versions
            .iter()
            .find(|valid| requested.starts_with(valid.module.as_str()))
    }
}

/// Network exposure class of an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interface {
    #[default]
    Public,
    Internal,
    Admin,
}

impl Interface {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interface::Public => "public",
            Interface::Internal => "internal",
            Interface::Admin => "admin",
        }
    }
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interface {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        // Catalogs from older identity versions use the "URL" suffix
        let lowered = s.trim().to_ascii_lowercase();
        match lowered.strip_suffix("url").unwrap_or(lowered.as_str()) {
            "public" => Ok(Interface::Public),
            "internal" => Ok(Interface::Internal),
            "admin" => Ok(Interface::Admin),
            other => Err(Error::InvalidArgument(format!(
                "unknown interface '{}', expected public, internal or admin",
                other
            ))),
        }
    }
}

/// Identifies a service and the version of it a request should address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceFilter {
    service_type: String,
    interface: Interface,
    region: Option<String>,
    service_name: Option<String>,
    version: Option<String>,
    api_version: Option<String>,
    requires_project_id: bool,
    path: Option<String>,
    valid_versions: Arc<[ValidVersion]>,
    namespace: String,
}

/// The fields of a [`ServiceFilter`] used to match catalog endpoints.
///
/// The requested version is left out: it is resolved lazily with prefix
/// matching rather than compared exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterView {
    pub service_type: String,
    pub interface: Interface,
    pub region_name: Option<String>,
    pub service_name: Option<String>,
    pub api_version: Option<String>,
    pub requires_project_id: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl FilterView {
    /// The view as a JSON object, keyed by field name
    pub fn as_map(&self) -> serde_json::Map<String, serde_json::Value> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        }
    }
}

impl ServiceFilter {
    /// Create a filter for a service type with default settings.
    ///
    /// The service type is stored lower-cased as given; only an empty type is
    /// rejected.
    pub fn new(service_type: &str) -> Result<Self> {
        if service_type.is_empty() {
            return Err(Error::InvalidArgument(
                "service_type must not be empty".to_string(),
            ));
        }

        Ok(Self {
            service_type: service_type.to_lowercase(),
            interface: Interface::default(),
            region: None,
            service_name: None,
            version: None,
            api_version: None,
            requires_project_id: false,
            path: None,
            valid_versions: Arc::from(Vec::new()),
            namespace: String::new(),
        })
    }

    pub fn with_interface(mut self, interface: Interface) -> Self {
        self.interface = interface;
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_service_name(mut self, service_name: impl Into<String>) -> Self {
        self.service_name = Some(service_name.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = Some(api_version.into());
        self
    }

    pub fn with_requires_project_id(mut self, requires_project_id: bool) -> Self {
        self.requires_project_id = requires_project_id;
        self
    }

    /// Set the ordered versions this service supports (first is the default)
    pub fn with_valid_versions(mut self, valid_versions: impl Into<Arc<[ValidVersion]>>) -> Self {
        self.valid_versions = valid_versions.into();
        self
    }

    /// Set the dotted namespace the service is declared in, e.g. `ecl.identity.identity_service`
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn service_type(&self) -> &str {
        &self.service_type
    }

    pub fn interface(&self) -> Interface {
        self.interface
    }

    pub fn set_interface(&mut self, interface: Interface) {
        self.interface = interface;
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub fn set_region(&mut self, region: Option<String>) {
        self.region = region;
    }

    pub fn service_name(&self) -> Option<&str> {
        self.service_name.as_deref()
    }

    pub fn set_service_name(&mut self, service_name: Option<String>) {
        self.service_name = service_name;
    }

    /// The requested version, if any
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn set_version(&mut self, version: Option<String>) {
        self.version = version;
    }

    /// Forget the requested version so the next [`resolve_path`](Self::resolve_path) adopts its fallback again
    pub fn clear_version(&mut self) {
        self.version = None;
    }

    /// Microversion sent alongside requests, independent of the URL version
    pub fn api_version(&self) -> Option<&str> {
        self.api_version.as_deref()
    }

    pub fn set_api_version(&mut self, api_version: Option<String>) {
        self.api_version = api_version;
    }

    pub fn requires_project_id(&self) -> bool {
        self.requires_project_id
    }

    pub fn set_requires_project_id(&mut self, requires_project_id: bool) {
        self.requires_project_id = requires_project_id;
    }

    /// Explicit path override, if one was set
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Override the resolved path (e.g. `/` for an unversioned root)
    pub fn set_path(&mut self, path: Option<String>) {
        self.path = path;
    }

    pub fn valid_versions(&self) -> &[ValidVersion] {
        &self.valid_versions
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Every field except the requested version
    pub fn filter_view(&self) -> FilterView {
        FilterView {
            service_type: self.service_type.clone(),
            interface: self.interface,
            region_name: self.region.clone(),
            service_name: self.service_name.clone(),
            api_version: self.api_version.clone(),
            requires_project_id: self.requires_project_id,
            path: self.path.clone(),
        }
    }

    /// Resolve the URL version segment for this service.
    ///
    /// An unset requested version adopts `fallback` and keeps it: later calls
    /// see the latched version whatever fallback they pass. An explicit path
    /// override always wins.
    pub fn resolve_path(&mut self, fallback: Option<&str>) -> String {
        if self.version.as_deref().map_or(true, str::is_empty) {
            self.version = fallback.map(str::to_string);
        }

        if let Some(path) = &self.path {
            return path.clone();
        }

        self.valid_version().path
    }

    /// The declared version serving the requested one
    pub fn valid_version(&self) -> ValidVersion {
        if let Some(requested) = self.version.as_deref().filter(|v| !v.is_empty()) {
            if !self.valid_versions.is_empty()
                && ValidVersion::find_prefix(requested, &self.valid_versions).is_none()
            {
                tracing::warn!(
                    "Requested {} version '{}' is not supported, using '{}'",
                    self.service_type,
                    requested,
                    self.valid_versions[0].module
                );
            }
        }

        ValidVersion::select(self.version.as_deref(), &self.valid_versions)
    }

    /// Module path of the version-specific implementation.
    ///
    /// The last namespace segment is replaced by the matched version:
    /// `ecl.identity.identity_service` with `v3` gives `ecl.identity.v3`.
    /// A namespace without a dot yields the bare module (`v3`, not `.v3`).
    pub fn module_path(&self) -> String {
        let module = self.valid_version().module;
        match self.namespace.rsplit_once('.') {
            Some((parent, _)) => format!("{}.{}", parent, module),
            None => module,
        }
    }

    /// Namespace-safe name of the service (`object_store` for `object-store`)
    pub fn service_module(&self) -> String {
        match self.namespace.split('.').nth(1) {
            Some(segment) if !segment.is_empty() => segment.to_string(),
            _ => self.service_type.replace('-', "_"),
        }
    }
}

impl fmt::Display for ServiceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "service_type={},interface={}",
            self.service_type, self.interface
        )?;
        if let Some(region) = &self.region {
            write!(f, ",region={}", region)?;
        }
        if let Some(name) = &self.service_name {
            write!(f, ",service_name={}", name)?;
        }
        if let Some(version) = self.version.as_deref().filter(|v| !v.is_empty()) {
            write!(f, ",version={}", version)?;
        }
        if let Some(api_version) = &self.api_version {
            write!(f, ",api_version={}", api_version)?;
        }
        Ok(())
    }
}
