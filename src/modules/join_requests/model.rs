pub use schoolhub_models::join_requests::*;
