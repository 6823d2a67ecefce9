//! Client SDK for the Enterprise Cloud APIs.
//!
//! Every resource the SDK knows about belongs to a service, and every service
//! is addressed through a [`ServiceFilter`](service_filter::ServiceFilter):
//! it picks the catalog endpoint (type, interface, region, name) and resolves
//! the API version segment to put in request paths.
//!
//! - [`service_filter`] - Service identification and version resolution
//! - [`cloud`] - Authentication, service catalog and HTTP client
//! - [`resource`] - Data-driven resource registry and generic CRUD operations
//! - [`identity`], [`database`], [`network`] - Service declarations and typed resources
//! - [`config`] - Persistent configuration

pub mod cloud;
pub mod config;
pub mod database;
pub mod error;
pub mod identity;
pub mod network;
pub mod resource;
pub mod service_filter;

pub use error::{Error, Result};
