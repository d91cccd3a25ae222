// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use crate::error::Result;
use crate::models::Settings;

/// Abandoned fetches are dropped by the client after this many deadlines.
const REAP_FACTOR: u32 = 3;

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(settings: &Settings) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&settings.user_agent)
        .connect_timeout(settings.timeout())
        .timeout(reap_timeout(settings.timeout()))
        .build()?;
    Ok(client)
}

/// Hard limit for a request whose deadline already passed.
pub fn reap_timeout(deadline: Duration) -> Duration {
    deadline * REAP_FACTOR
}
