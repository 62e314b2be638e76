//! Request guards.

pub mod auth;

pub use auth::{AuthRejection, RequireAdmin, RequireCustomer, LOGIN_PATH};
