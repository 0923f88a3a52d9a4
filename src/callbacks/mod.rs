//! Provider callback handling.
//!
//! This module provides:
//! - Typed payload schemas for each provider ([`payloads`])
//! - Validation of raw bodies into [`CallbackRecord`]s ([`parser`])
//! - Natural key extraction ([`key`])

pub mod key;
pub mod parser;
pub mod payloads;

pub use key::{MissingKeyError, extract_natural_key, natural_key};
pub use parser::{CallbackRecord, ValidationError, parse_callback, validate_callback};
pub use payloads::CallbackPayload;
