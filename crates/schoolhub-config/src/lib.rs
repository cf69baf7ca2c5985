//! # Schoolhub Config
//!
//! Configuration types for the schoolhub API.
//!
//! This crate provides configuration structures loaded from environment variables:
//!
//! - [`jwt`]: Signing secret and token lifetimes
//! - [`cors`]: CORS (Cross-Origin Resource Sharing) configuration
//! - [`rate_limit`]: API rate limiting configuration
//! - [`academic`]: Academic structure generation settings
//!
//! # Example
//!
//! ```ignore
//! use schoolhub_config::{AcademicConfig, CorsConfig, JwtConfig, RateLimitConfig};
//!
//! let jwt_config = JwtConfig::from_env();
//! let cors_config = CorsConfig::from_env();
//! let rate_limit_config = RateLimitConfig::from_env();
//! let academic_config = AcademicConfig::from_env();
//! ```

pub mod academic;
pub mod cors;
pub mod jwt;
pub mod rate_limit;

// Re-export commonly used types at crate root
pub use academic::AcademicConfig;
pub use cors::CorsConfig;
pub use jwt::JwtConfig;
pub use rate_limit::RateLimitConfig;
