//! Identity service
//!
//! The identity service supports `v3` (preferred) and `v2`. Its admin
//! variant addresses the admin interface of the same service.

mod project;
mod user;

pub use project::{get_project, list_project_ids, list_projects, Project};
pub use user::{find_user, list_users, User};

use crate::error::Result;
use crate::resource::service_filter;
use crate::service_filter::ServiceFilter;

/// Registry key of the identity service
pub const SERVICE_KEY: &str = "identity";

/// Registry key of the identity service on the admin interface
pub const ADMIN_SERVICE_KEY: &str = "identity-admin";

/// Service filter for the public identity endpoint
pub fn identity_service() -> Result<ServiceFilter> {
    service_filter(SERVICE_KEY)
}

/// Service filter for the admin identity endpoint
pub fn admin_service() -> Result<ServiceFilter> {
    service_filter(ADMIN_SERVICE_KEY)
}
