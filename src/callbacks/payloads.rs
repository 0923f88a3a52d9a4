//! Typed callback payloads, one per provider kind.
//!
//! Field names follow each provider's wire format exactly. Every field that is
//! not an `Option` is required: a body without it fails validation. Unknown
//! fields are ignored so that providers can add fields without breaking us.
//!
//! # Shapes
//!
//! - Africa's Talking airtime: flat object of strings, keyed by `requestId`
//! - Kyanda IPN: flat object with a nested `details` object, keyed by `transactionRef`
//! - M-Pesa STK push: `Body.stkCallback` with a `CallbackMetadata.Item` name/value list
//! - M-Pesa C2B: flat PascalCase object, keyed by `TransID`
//! - M-Pesa transaction status and reversal: a `Result` object with a
//!   `ResultParameters.ResultParameter` key/value list, keyed by `ConversationID`

use serde::{Deserialize, Serialize};

use crate::types::ProviderKind;

/// A scalar in a provider's name/value list.
///
/// M-Pesa sends amounts and phone numbers as JSON numbers and receipts and
/// dates as strings, sometimes within the same list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemValue {
    Text(String),
    Number(serde_json::Number),
}

// ============================================================================
// Africa's Talking
// ============================================================================

/// Airtime disbursement result from Africa's Talking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AirtimeCallback {
    pub phone_number: String,
    pub description: String,
    pub status: String,
    pub request_id: String,
    pub discount: String,
    pub value: String,
}

// ============================================================================
// Kyanda
// ============================================================================

/// Bill-payment IPN from Kyanda.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KyandaCallback {
    pub category: String,
    pub source: String,
    pub destination: String,
    #[serde(rename = "MerchantID")]
    pub merchant_id: String,
    pub details: KyandaDetails,
    pub status: String,
    pub status_code: String,
    pub message: String,
    #[serde(rename = "transactionDate")]
    pub transaction_date: String,
    #[serde(rename = "transactionRef")]
    pub transaction_ref: String,
    pub amount: String,
}

/// Biller-specific details. Which fields are present depends on the biller
/// (prepaid electricity carries `tokens` and `units`, most others only a receipt).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KyandaDetails {
    #[serde(
        rename = "biller_Receipt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub biller_receipt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
}

// ============================================================================
// M-Pesa STK push
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StkPushCallback {
    #[serde(rename = "Body")]
    pub body: StkPushBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StkPushBody {
    #[serde(rename = "stkCallback")]
    pub stk_callback: StkCallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StkCallback {
    #[serde(rename = "MerchantRequestID")]
    pub merchant_request_id: String,
    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: String,
    #[serde(rename = "ResultCode")]
    pub result_code: i64,
    #[serde(rename = "ResultDesc")]
    pub result_desc: String,
    #[serde(rename = "CallbackMetadata")]
    pub callback_metadata: CallbackMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackMetadata {
    #[serde(rename = "Item")]
    pub item: Vec<CallbackMetadataItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackMetadataItem {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Value", default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ItemValue>,
}

// ============================================================================
// M-Pesa C2B
// ============================================================================

/// Customer-to-business payment confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct C2bCallback {
    pub transaction_type: String,
    #[serde(rename = "TransID")]
    pub trans_id: String,
    pub trans_time: String,
    pub trans_amount: String,
    pub business_short_code: String,
    pub bill_ref_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_account_balance: Option<String>,
    #[serde(
        rename = "ThirdPartyTransID",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub third_party_trans_id: Option<String>,
    #[serde(rename = "MSISDN")]
    pub msisdn: String,
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

// ============================================================================
// M-Pesa result callbacks (transaction status, reversal)
// ============================================================================

/// Asynchronous result of an M-Pesa API request.
///
/// Transaction status queries and reversals share this envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultCallback {
    #[serde(rename = "Result")]
    pub result: ResultBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResultBody {
    pub result_type: i64,
    pub result_code: i64,
    pub result_desc: String,
    #[serde(rename = "OriginatorConversationID")]
    pub originator_conversation_id: String,
    #[serde(rename = "ConversationID")]
    pub conversation_id: String,
    #[serde(rename = "TransactionID")]
    pub transaction_id: String,
    /// Absent on failed requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_parameters: Option<ResultParameters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_data: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultParameters {
    #[serde(rename = "ResultParameter")]
    pub result_parameter: Vec<ResultParameter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultParameter {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Value", default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ItemValue>,
}

// ============================================================================
// Tagged union
// ============================================================================

/// A validated callback payload of any provider kind.
///
/// Serializes as the inner payload, without a tag, so the stored `data` has the
/// provider's own shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CallbackPayload {
    Airtime(AirtimeCallback),
    BillPayment(KyandaCallback),
    StkPush(StkPushCallback),
    CustomerToBusiness(C2bCallback),
    TransactionStatus(ResultCallback),
    Reversal(ResultCallback),
}

impl CallbackPayload {
    pub fn kind(&self) -> ProviderKind {
        match self {
            CallbackPayload::Airtime(_) => ProviderKind::Airtime,
            CallbackPayload::BillPayment(_) => ProviderKind::BillPayment,
            CallbackPayload::StkPush(_) => ProviderKind::StkPush,
            CallbackPayload::CustomerToBusiness(_) => ProviderKind::CustomerToBusiness,
            CallbackPayload::TransactionStatus(_) => ProviderKind::TransactionStatus,
            CallbackPayload::Reversal(_) => ProviderKind::Reversal,
        }
    }

    /// Converts the payload into the structured mapping that is persisted.
    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}
