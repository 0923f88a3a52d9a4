//! Shared test utilities: sample provider bodies and arbitrary generators.

use proptest::prelude::*;
use serde_json::{Value, json};

use crate::types::{NamespaceMode, NaturalKey, ProviderKind};

pub fn airtime_body(request_id: &str) -> Value {
    json!({
        "phoneNumber": "+254711XXXYYY",
        "description": "Airtime Delivered Successfully",
        "status": "Success",
        "requestId": request_id,
        "discount": "KES 0.6000",
        "value": "KES 100.0000"
    })
}

pub fn kyanda_body(transaction_ref: &str) -> Value {
    json!({
        "category": "UtilityPayment",
        "source": "PaymentWallet",
        "destination": "0715330000",
        "MerchantID": "kyanda",
        "details": { "biller_Receipt": "0105781244210" },
        "status": "Success",
        "status_code": "0000",
        "message": "Your Request has been processed successfully.",
        "transactionDate": "20210401091002",
        "transactionRef": transaction_ref,
        "amount": "1500"
    })
}

pub fn stk_push_body(merchant_request_id: &str, amount: f64) -> Value {
    json!({
        "Body": {
            "stkCallback": {
                "MerchantRequestID": merchant_request_id,
                "CheckoutRequestID": "ws_CO_191220191020363925",
                "ResultCode": 0,
                "ResultDesc": "The service request is processed successfully.",
                "CallbackMetadata": {
                    "Item": [
                        { "Name": "Amount", "Value": amount },
                        { "Name": "MpesaReceiptNumber", "Value": "NLJ7RT61SV" },
                        { "Name": "Balance" },
                        { "Name": "TransactionDate", "Value": 20191219102115u64 },
                        { "Name": "PhoneNumber", "Value": 254708374149u64 }
                    ]
                }
            }
        }
    })
}

pub fn c2b_body(trans_id: &str) -> Value {
    json!({
        "TransactionType": "Pay Bill",
        "TransID": trans_id,
        "TransTime": "20211230143100",
        "TransAmount": "10.00",
        "BusinessShortCode": "600638",
        "BillRefNumber": "invoice008",
        "InvoiceNumber": "",
        "OrgAccountBalance": "49197.00",
        "ThirdPartyTransID": "",
        "MSISDN": "254708374149",
        "FirstName": "John",
        "MiddleName": "",
        "LastName": "Doe"
    })
}

pub fn result_body(conversation_id: &str) -> Value {
    json!({
        "Result": {
            "ResultType": 0,
            "ResultCode": 0,
            "ResultDesc": "The service request is processed successfully.",
            "OriginatorConversationID": "10571-7910404-1",
            "ConversationID": conversation_id,
            "TransactionID": "LHG31AA5TX",
            "ResultParameters": {
                "ResultParameter": [
                    { "Key": "DebitPartyName", "Value": "600310 - Safaricom333" },
                    { "Key": "Amount", "Value": 300 }
                ]
            },
            "ReferenceData": {
                "ReferenceItem": { "Key": "Occasion" }
            }
        }
    })
}

/// Returns a valid body for `kind` whose natural key is `key`.
pub fn body_for(kind: ProviderKind, key: &str) -> Value {
    match kind {
        ProviderKind::Airtime => airtime_body(key),
        ProviderKind::BillPayment => kyanda_body(key),
        ProviderKind::StkPush => stk_push_body(key, 1.0),
        ProviderKind::CustomerToBusiness => c2b_body(key),
        ProviderKind::TransactionStatus | ProviderKind::Reversal => result_body(key),
    }
}

pub fn arb_provider_kind() -> impl Strategy<Value = ProviderKind> {
    prop::sample::select(ProviderKind::ALL.to_vec())
}

pub fn arb_namespace_mode() -> impl Strategy<Value = NamespaceMode> {
    prop_oneof![Just(NamespaceMode::Production), Just(NamespaceMode::Test)]
}

/// Keys shaped like the identifiers providers actually send.
pub fn arb_natural_key() -> impl Strategy<Value = NaturalKey> {
    "[A-Za-z0-9][A-Za-z0-9_-]{0,40}".prop_map(NaturalKey::new)
}
