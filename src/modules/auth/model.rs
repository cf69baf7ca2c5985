//! Authentication DTOs, re-exported from the models crate.

pub use schoolhub_auth::Claims;
pub use schoolhub_models::users::{LoginRequest, LoginResponse, RegisterUserDto};
