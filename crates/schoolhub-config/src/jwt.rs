use std::env;

/// Token signing configuration.
///
/// Session tokens (login) and membership tokens (issued when a user joins a
/// school) share one secret but have separate lifetimes.
#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    /// Lifetime of login access tokens, in seconds.
    pub access_token_expiry: i64,
    /// Lifetime of role-scoped membership tokens, in seconds.
    pub membership_token_expiry: i64,
}

impl JwtConfig {
    pub fn from_env() -> Self {
        Self {
            secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| "your-secret-key-change-in-production".to_string()),
            access_token_expiry: env::var("JWT_ACCESS_EXPIRY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3600), // 1 hour
            membership_token_expiry: env::var("JWT_MEMBERSHIP_EXPIRY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(604800), // 7 days
        }
    }
}
