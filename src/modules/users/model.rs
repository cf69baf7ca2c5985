//! User models, re-exported from the models crate.

pub use schoolhub_models::users::*;
