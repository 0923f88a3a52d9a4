//! Callback Relay - idempotent ingestion of payment and telecom provider callbacks.
//!
//! Providers (Africa's Talking airtime, Kyanda bill payments, Safaricom M-Pesa)
//! deliver asynchronous results by POSTing JSON to a callback URL, and they
//! redeliver. This library validates each delivery against the provider's
//! schema, derives its natural key, and stores it at most once.

pub mod callbacks;
pub mod config;
pub mod ingest;
pub mod server;
pub mod store;
pub mod types;

#[cfg(test)]
mod test_utils;
