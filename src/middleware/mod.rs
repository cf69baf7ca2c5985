//! Request extractors for authentication.
//!
//! - [`auth::AuthUser`]: any valid bearer access token
//! - [`auth::AdminUser`]: a valid token whose account role is `ADMIN`
//!
//! A missing or invalid token is rejected with 401 before the handler runs.

pub mod auth;
