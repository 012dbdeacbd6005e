//! Shared HTTP client construction for consistent connect timeout and TLS configuration.

use std::time::Duration;

/// Create the HTTP client used for backend calls.
///
/// Per-request timeouts are applied by [`crate::BackendClient`]; this client only
/// bounds connection setup. rustls TLS, `soulstat/{version}` user-agent, redirect limit 5.
///
/// # Panics
///
/// Panics if the TLS backend cannot be initialized (should never happen with rustls).
#[must_use]
pub fn default_client(connect_timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .user_agent(concat!("soulstat/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .expect("default HTTP client construction must not fail")
}
