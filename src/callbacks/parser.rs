//! Callback payload validation.
//!
//! Parses a raw request body into the typed payload for a given provider kind.
//! Validation is all-or-nothing: a body either yields a complete
//! [`CallbackRecord`] or a [`ValidationError`], never a partial record.

use serde::de::DeserializeOwned;
use serde_json::error::Category;
use thiserror::Error;

use crate::types::ProviderKind;

use super::payloads::{
    AirtimeCallback, C2bCallback, CallbackPayload, KyandaCallback, ResultCallback,
    StkPushCallback,
};

/// Error type for callback validation failures.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The body is not a JSON document at all.
    #[error("{kind} callback body is not valid JSON: {source}")]
    Malformed {
        kind: ProviderKind,
        #[source]
        source: serde_json::Error,
    },

    /// The body is JSON but a required field is missing or has the wrong type.
    #[error("{kind} callback payload does not match schema: {source}")]
    Schema {
        kind: ProviderKind,
        #[source]
        source: serde_json::Error,
    },
}

impl ValidationError {
    fn from_json(kind: ProviderKind, source: serde_json::Error) -> Self {
        match source.classify() {
            Category::Data => ValidationError::Schema { kind, source },
            Category::Syntax | Category::Eof | Category::Io => {
                ValidationError::Malformed { kind, source }
            }
        }
    }

    pub fn kind(&self) -> ProviderKind {
        match self {
            ValidationError::Malformed { kind, .. } | ValidationError::Schema { kind, .. } => *kind,
        }
    }
}

/// A validated inbound callback.
///
/// Created once per request after validation and dropped once the store call
/// returns.
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackRecord {
    /// The route the callback arrived on.
    pub path: String,

    /// The typed payload.
    pub payload: CallbackPayload,
}

impl CallbackRecord {
    pub fn kind(&self) -> ProviderKind {
        self.payload.kind()
    }
}

/// Parses a raw body into the typed payload for `kind`.
///
/// # Examples
///
/// ```
/// use callback_relay::callbacks::parse_callback;
/// use callback_relay::types::ProviderKind;
///
/// let body = br#"{
///     "phoneNumber": "+254711XXXYYY",
///     "description": "Airtime Delivered Successfully",
///     "status": "Success",
///     "requestId": "ATQid_SampleTxnId123",
///     "discount": "KES 0.6000",
///     "value": "KES 100.0000"
/// }"#;
///
/// let payload = parse_callback(ProviderKind::Airtime, body).unwrap();
/// assert_eq!(payload.kind(), ProviderKind::Airtime);
/// ```
pub fn parse_callback(kind: ProviderKind, body: &[u8]) -> Result<CallbackPayload, ValidationError> {
    let payload = match kind {
        ProviderKind::Airtime => CallbackPayload::Airtime(decode::<AirtimeCallback>(kind, body)?),
        ProviderKind::BillPayment => {
            CallbackPayload::BillPayment(decode::<KyandaCallback>(kind, body)?)
        }
        ProviderKind::StkPush => CallbackPayload::StkPush(decode::<StkPushCallback>(kind, body)?),
        ProviderKind::CustomerToBusiness => {
            CallbackPayload::CustomerToBusiness(decode::<C2bCallback>(kind, body)?)
        }
        ProviderKind::TransactionStatus => {
            CallbackPayload::TransactionStatus(decode::<ResultCallback>(kind, body)?)
        }
        ProviderKind::Reversal => CallbackPayload::Reversal(decode::<ResultCallback>(kind, body)?),
    };
    Ok(payload)
}

/// Validates a body received on `path` and wraps it in a [`CallbackRecord`].
pub fn validate_callback(
    kind: ProviderKind,
    body: &[u8],
    path: &str,
) -> Result<CallbackRecord, ValidationError> {
    let payload = parse_callback(kind, body)?;
    Ok(CallbackRecord {
        path: path.to_string(),
        payload,
    })
}

fn decode<T: DeserializeOwned>(kind: ProviderKind, body: &[u8]) -> Result<T, ValidationError> {
    serde_json::from_slice(body).map_err(|source| ValidationError::from_json(kind, source))
}
