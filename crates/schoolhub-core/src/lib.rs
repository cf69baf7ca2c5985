//! # Schoolhub Core
//!
//! Core types, errors, and utilities for the schoolhub API.
//!
//! This crate provides foundational types used throughout the application:
//!
//! - [`errors`]: Application error type with HTTP response conversion
//! - [`password`]: One-way hashing for passwords and school join codes
//! - [`ident`]: Short random codes and slug-like usernames for generated records
//!
//! # Example
//!
//! ```ignore
//! use schoolhub_core::{AppError, hash_code, verify_code};
//!
//! let hash = hash_code("S3CRET")?;
//! if !verify_code("S3CRET", &hash)? {
//!     return Err(AppError::bad_request(anyhow::anyhow!("Invalid code")));
//! }
//! ```

pub mod errors;
pub mod ident;
pub mod password;

// Re-export commonly used types at crate root
pub use errors::AppError;
pub use ident::{IdentSource, RandomIdents, generate_code, generate_username, slugify};
pub use password::{hash_code, hash_password, verify_code, verify_password};
