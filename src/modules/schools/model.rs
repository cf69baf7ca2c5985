pub use schoolhub_models::schools::*;
