//! The set of callback providers the relay accepts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of provider callback.
///
/// Each kind owns exactly one POST route and one storage table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    /// Africa's Talking airtime disbursement result.
    Airtime,
    /// Kyanda bill-payment aggregator IPN.
    BillPayment,
    /// M-Pesa STK push (Lipa na M-Pesa Online) result.
    StkPush,
    /// M-Pesa customer-to-business confirmation.
    CustomerToBusiness,
    /// M-Pesa transaction status query result.
    TransactionStatus,
    /// M-Pesa reversal result.
    Reversal,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 6] = [
        ProviderKind::Airtime,
        ProviderKind::BillPayment,
        ProviderKind::StkPush,
        ProviderKind::CustomerToBusiness,
        ProviderKind::TransactionStatus,
        ProviderKind::Reversal,
    ];

    /// The fixed route path the provider delivers to.
    pub fn route(&self) -> &'static str {
        match self {
            ProviderKind::Airtime => "/at-airtime-callback",
            ProviderKind::BillPayment => "/kyanda-callback",
            ProviderKind::StkPush => "/stk-push-callback",
            ProviderKind::CustomerToBusiness => "/c2b-callback",
            ProviderKind::TransactionStatus => "/transaction-status-callback",
            ProviderKind::Reversal => "/stk-reversal-callback",
        }
    }

    /// Base name of the production table for this provider.
    pub fn table_name(&self) -> &'static str {
        match self {
            ProviderKind::Airtime => "at_airtime_callback",
            ProviderKind::BillPayment => "kyanda_ipn_transaction",
            ProviderKind::StkPush => "mpesa_stk_push_callback",
            ProviderKind::CustomerToBusiness => "mpesa_c2b_callback",
            ProviderKind::TransactionStatus => "mpesa_transaction_status_callback",
            ProviderKind::Reversal => "mpesa_stk_reversal_callback",
        }
    }

    /// Dotted path of the field the natural key is read from.
    pub fn key_field(&self) -> &'static str {
        match self {
            ProviderKind::Airtime => "requestId",
            ProviderKind::BillPayment => "transactionRef",
            ProviderKind::StkPush => "Body.stkCallback.MerchantRequestID",
            ProviderKind::CustomerToBusiness => "TransID",
            ProviderKind::TransactionStatus | ProviderKind::Reversal => "Result.ConversationID",
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Airtime => "airtime",
            ProviderKind::BillPayment => "bill-payment",
            ProviderKind::StkPush => "stk-push",
            ProviderKind::CustomerToBusiness => "customer-to-business",
            ProviderKind::TransactionStatus => "transaction-status",
            ProviderKind::Reversal => "reversal",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn routes_are_distinct() {
        let routes: HashSet<_> = ProviderKind::ALL.iter().map(|k| k.route()).collect();
        assert_eq!(routes.len(), ProviderKind::ALL.len());
    }

    #[test]
    fn table_names_are_distinct() {
        let tables: HashSet<_> = ProviderKind::ALL.iter().map(|k| k.table_name()).collect();
        assert_eq!(tables.len(), ProviderKind::ALL.len());
    }

    #[test]
    fn display_matches_serde_name() {
        for kind in ProviderKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
    }

    #[test]
    fn routes_start_with_slash() {
        for kind in ProviderKind::ALL {
            assert!(kind.route().starts_with('/'), "{}", kind.route());
        }
    }
}
