pub use schoolhub_models::academics::*;
