//! Cloud API interaction module
//!
//! This module provides the plumbing between service filters and the REST
//! APIs: authentication, the service catalog, the HTTP client and the
//! [`client::CloudClient`] that ties them together.
//!
//! # Module Structure
//!
//! - [`auth`] - Identity v3 token authentication with token caching
//! - [`catalog`] - Service catalog parsing and endpoint matching
//! - [`client`] - Main client for making API requests
//! - [`http`] - HTTP utilities for REST API calls
//!
//! # Example
//!
//! ```ignore
//! use ecl::cloud::{AuthMethod, CloudClient};
//! use ecl::identity;
//!
//! async fn example() -> ecl::Result<()> {
//!     let client = CloudClient::new(AuthMethod::Password {
//!         auth_url: "https://keystone.example.com/v3".into(),
//!         username: "alice".into(),
//!         password: "secret".into(),
//!         user_domain_id: None,
//!         project_id: Some("my-project".into()),
//!     })?;
//!     let users = client.get(&identity::identity_service()?, "/users").await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod catalog;
pub mod client;
pub mod http;

pub use auth::{AuthMethod, AuthToken, Credentials};
pub use catalog::{Catalog, Endpoint};
pub use client::CloudClient;
