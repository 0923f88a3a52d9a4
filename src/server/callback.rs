//! Provider callback endpoints.
//!
//! Every route answers `200 OK` with `{"status": "Success" | "Exists" | "Failed"}`.
//! Providers treat any non-2xx answer as a reason to redeliver, and a
//! redelivery of a rejected payload would be rejected again, so failures are
//! reported in the body rather than the status line.
//!
//! Bodies are taken as raw [`Bytes`] so that malformed JSON reaches the
//! validator instead of being rejected by an extractor. A body that cannot be
//! buffered at all (over the body limit, or a broken stream) is answered
//! `Failed` like any other rejected delivery.
//!
//! # Example
//!
//! ```ignore
//! POST /c2b-callback HTTP/1.1
//! Content-Type: application/json
//!
//! {"TransactionType": "Pay Bill", "TransID": "PLU8V00V00", ...}
//!
//! HTTP/1.1 200 OK
//! Content-Type: application/json
//!
//! {"status":"Success"}
//! ```

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::AppState;
use crate::ingest::IngestionOutcome;
use crate::types::ProviderKind;

/// Response body for every callback route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackResponse {
    pub status: String,
}

impl From<IngestionOutcome> for CallbackResponse {
    fn from(outcome: IngestionOutcome) -> Self {
        CallbackResponse {
            status: outcome.as_status().to_string(),
        }
    }
}

async fn ingest(
    app_state: &AppState,
    kind: ProviderKind,
    body: Result<Bytes, BytesRejection>,
) -> Json<CallbackResponse> {
    let outcome = match body {
        Ok(body) => app_state.ingestor().handle(kind, &body, kind.route()).await,
        Err(rejection) => {
            warn!(
                kind = %kind,
                path = kind.route(),
                status = %rejection.status(),
                error = %rejection,
                "Rejected unreadable callback body"
            );
            IngestionOutcome::Rejected
        }
    };
    Json(outcome.into())
}

/// `POST /at-airtime-callback`
pub async fn airtime_handler(
    State(app_state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Json<CallbackResponse> {
    ingest(&app_state, ProviderKind::Airtime, body).await
}

/// `POST /kyanda-callback`
pub async fn bill_payment_handler(
    State(app_state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Json<CallbackResponse> {
    ingest(&app_state, ProviderKind::BillPayment, body).await
}

/// `POST /stk-push-callback`
pub async fn stk_push_handler(
    State(app_state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Json<CallbackResponse> {
    ingest(&app_state, ProviderKind::StkPush, body).await
}

/// `POST /c2b-callback`
pub async fn c2b_handler(
    State(app_state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Json<CallbackResponse> {
    ingest(&app_state, ProviderKind::CustomerToBusiness, body).await
}

/// `POST /transaction-status-callback`
pub async fn transaction_status_handler(
    State(app_state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Json<CallbackResponse> {
    ingest(&app_state, ProviderKind::TransactionStatus, body).await
}

/// `POST /stk-reversal-callback`
pub async fn reversal_handler(
    State(app_state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Json<CallbackResponse> {
    ingest(&app_state, ProviderKind::Reversal, body).await
}
