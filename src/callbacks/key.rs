//! Natural key extraction.
//!
//! Each provider names its notifications with its own identifier, sometimes
//! nested inside the payload:
//!
//! - Airtime: `requestId`
//! - Kyanda: `transactionRef`
//! - STK push: `Body.stkCallback.MerchantRequestID`
//! - C2B: `TransID`
//! - Transaction status and reversal: `Result.ConversationID`
//!
//! Validation guarantees these fields are present, but a present-and-empty
//! identifier cannot name a notification, so it is reported as missing.

use thiserror::Error;

use crate::types::{NaturalKey, ProviderKind};

use super::parser::CallbackRecord;
use super::payloads::CallbackPayload;

/// The validated payload lacks a usable natural key.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{kind} callback has no natural key at {field}")]
pub struct MissingKeyError {
    pub kind: ProviderKind,
    pub field: &'static str,
}

/// Returns the natural key that identifies `record`.
pub fn extract_natural_key(record: &CallbackRecord) -> Result<NaturalKey, MissingKeyError> {
    natural_key(&record.payload)
}

/// Returns the natural key of a payload.
pub fn natural_key(payload: &CallbackPayload) -> Result<NaturalKey, MissingKeyError> {
    let raw = match payload {
        CallbackPayload::Airtime(cb) => &cb.request_id,
        CallbackPayload::BillPayment(cb) => &cb.transaction_ref,
        CallbackPayload::StkPush(cb) => &cb.body.stk_callback.merchant_request_id,
        CallbackPayload::CustomerToBusiness(cb) => &cb.trans_id,
        CallbackPayload::TransactionStatus(cb) | CallbackPayload::Reversal(cb) => {
            &cb.result.conversation_id
        }
    };

    let kind = payload.kind();
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(MissingKeyError {
            kind,
            field: kind.key_field(),
        });
    }
    Ok(NaturalKey::new(trimmed))
}
