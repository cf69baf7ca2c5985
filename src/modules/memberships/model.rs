pub use schoolhub_models::memberships::*;
