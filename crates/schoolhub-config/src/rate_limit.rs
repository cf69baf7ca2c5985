//! Rate limiting configuration.
//!
//! Join codes are short shared secrets, so the join-by-code endpoint and the
//! auth endpoints get a stricter limiter than the rest of the API.
//!
//! # Environment Variables
//!
//! - `RATE_LIMIT_ENABLED`: Default true
//! - `RATE_LIMIT_GENERAL_PER_SECOND`: Default 2
//! - `RATE_LIMIT_GENERAL_BURST_SIZE`: Default 30
//! - `RATE_LIMIT_JOIN_PER_SECOND`: Default 10
//! - `RATE_LIMIT_JOIN_BURST_SIZE`: Default 5

use tower_governor::governor::{GovernorConfig, GovernorConfigBuilder};
use tower_governor::key_extractor::PeerIpKeyExtractor;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Rate limiting needs the peer address, which only exists when the app
    /// is served with connect info. Disabled in router-level tests.
    pub enabled: bool,
    /// Requests per second for general endpoints.
    pub general_per_second: u64,
    /// Burst size for general endpoints.
    pub general_burst_size: u32,
    /// Seconds between replenished join/auth attempts.
    pub join_per_second: u64,
    /// Burst size for join/auth endpoints.
    pub join_burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            general_per_second: 2,
            general_burst_size: 30,
            join_per_second: 10,
            join_burst_size: 5,
        }
    }
}

impl RateLimitConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: std::env::var("RATE_LIMIT_ENABLED")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(defaults.enabled),
            general_per_second: std::env::var("RATE_LIMIT_GENERAL_PER_SECOND")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.general_per_second),
            general_burst_size: std::env::var("RATE_LIMIT_GENERAL_BURST_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.general_burst_size),
            join_per_second: std::env::var("RATE_LIMIT_JOIN_PER_SECOND")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.join_per_second),
            join_burst_size: std::env::var("RATE_LIMIT_JOIN_BURST_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.join_burst_size),
        }
    }

    /// Same as [`Default`] but with limiting switched off.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Creates a `GovernorConfig` for general API endpoints.
    ///
    /// # Panics
    ///
    /// Panics if the governor configuration cannot be built (zero rates).
    #[must_use]
    pub fn general_governor_config(
        &self,
    ) -> GovernorConfig<PeerIpKeyExtractor, ::governor::middleware::NoOpMiddleware> {
        GovernorConfigBuilder::default()
            .per_second(self.general_per_second)
            .burst_size(self.general_burst_size)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .expect("Failed to build general rate limiter config")
    }

    /// Creates a `GovernorConfig` for the join-by-code and auth endpoints.
    ///
    /// # Panics
    ///
    /// Panics if the governor configuration cannot be built (zero rates).
    #[must_use]
    pub fn join_governor_config(
        &self,
    ) -> GovernorConfig<PeerIpKeyExtractor, ::governor::middleware::NoOpMiddleware> {
        GovernorConfigBuilder::default()
            .per_second(self.join_per_second)
            .burst_size(self.join_burst_size)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .expect("Failed to build join rate limiter config")
    }
}
