use std::str::FromStr;

use anyhow::anyhow;

use schoolhub_core::AppError;

/// Parses a path or body identifier, failing with 400 when malformed.
pub fn parse_id<T: FromStr>(raw: &str, what: &str) -> Result<T, AppError> {
    raw.parse()
        .map_err(|_| AppError::bad_request(anyhow!("Invalid {} format: {}", what, raw)))
}
