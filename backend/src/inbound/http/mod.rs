//! HTTP inbound adapter.
//!
//! Handlers translate form or JSON bodies into domain calls and map domain
//! errors onto status codes. Identity is resolved by the extractors in
//! [`identity`]; routes are registered through [`routes::configure`].

pub mod accounts;
pub mod advisory;
pub mod body;
pub mod equipment;
pub mod error;
pub mod health;
pub mod identity;
pub mod livestock;
pub mod rentals;
pub mod routes;
pub mod session;
pub mod session_config;
pub mod state;
pub mod subscription;
#[cfg(test)]
pub mod test_utils;
pub mod validation;

pub use error::ApiResult;
