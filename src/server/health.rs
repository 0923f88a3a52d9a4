//! `GET /health`: process liveness, independent of the store.
//!
//! A store outage surfaces as `Failed` callback responses. Restarting the
//! relay would not bring the store back, so liveness never consults it.

/// Body returned by [`health_handler`].
pub const HEALTH_BODY: &str = "OK";

/// Answers `200 text/plain` with [`HEALTH_BODY`].
pub async fn health_handler() -> &'static str {
    HEALTH_BODY
}
