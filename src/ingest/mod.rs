//! Callback ingestion: validate, extract the natural key, store once.
//!
//! [`Ingestor::handle`] is the single pipeline every provider route runs:
//!
//! 1. Validate the raw body against the provider's schema.
//! 2. Extract the natural key.
//! 3. Conditionally insert `{path, data, ref}` under the provider namespace.
//!
//! Any failure collapses to [`IngestionOutcome::Rejected`]. Nothing is
//! retried, and a rejection never follows a partial write: the store is only
//! reached after steps 1 and 2 succeed, and the store itself never writes a
//! partial document.

use std::sync::Arc;

use thiserror::Error;
use tracing::{Span, debug, error, info, instrument, warn};

use crate::callbacks::{MissingKeyError, ValidationError, extract_natural_key, validate_callback};
use crate::store::{InsertOutcome, NotificationStore, StoreError, StoredNotification};
use crate::types::{Namespace, NamespaceMode, ProviderKind};

/// Outcome of ingesting one callback, as reported to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IngestionOutcome {
    /// First sighting; the notification was stored.
    Created,
    /// Already stored; nothing was written.
    Duplicate,
    /// Validation, key extraction or storage failed.
    Rejected,
}

impl IngestionOutcome {
    /// The status string sent back in the response body.
    pub fn as_status(self) -> &'static str {
        match self {
            IngestionOutcome::Created => "Success",
            IngestionOutcome::Duplicate => "Exists",
            IngestionOutcome::Rejected => "Failed",
        }
    }
}

impl From<InsertOutcome> for IngestionOutcome {
    fn from(outcome: InsertOutcome) -> Self {
        match outcome {
            InsertOutcome::Created => IngestionOutcome::Created,
            InsertOutcome::Duplicate => IngestionOutcome::Duplicate,
        }
    }
}

/// Why a callback was rejected.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    MissingKey(#[from] MissingKeyError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Runs the ingestion pipeline against a shared store.
#[derive(Clone)]
pub struct Ingestor {
    store: Arc<dyn NotificationStore>,
    mode: NamespaceMode,
}

impl Ingestor {
    pub fn new(store: Arc<dyn NotificationStore>, mode: NamespaceMode) -> Self {
        Ingestor { store, mode }
    }

    pub fn mode(&self) -> NamespaceMode {
        self.mode
    }

    pub fn store(&self) -> &Arc<dyn NotificationStore> {
        &self.store
    }

    /// The namespace notifications of `kind` are written to.
    pub fn namespace_for(&self, kind: ProviderKind) -> Namespace {
        Namespace::for_provider(kind, self.mode)
    }

    /// Ingests one callback and reports the outcome. Never fails.
    #[instrument(skip_all, fields(kind = %kind, path = %path, key = tracing::field::Empty))]
    pub async fn handle(&self, kind: ProviderKind, body: &[u8], path: &str) -> IngestionOutcome {
        match self.try_ingest(kind, body, path).await {
            Ok(outcome) => {
                let outcome = IngestionOutcome::from(outcome);
                match outcome {
                    IngestionOutcome::Created => info!("Stored callback"),
                    _ => debug!("Duplicate callback ignored"),
                }
                outcome
            }
            Err(e @ (IngestError::Validation(_) | IngestError::MissingKey(_))) => {
                warn!(error = %e, "Rejected callback");
                IngestionOutcome::Rejected
            }
            Err(e @ IngestError::Store(_)) => {
                error!(error = %e, "Failed to store callback");
                IngestionOutcome::Rejected
            }
        }
    }

    /// Ingests one callback, returning the specific failure on rejection.
    pub async fn try_ingest(
        &self,
        kind: ProviderKind,
        body: &[u8],
        path: &str,
    ) -> Result<InsertOutcome, IngestError> {
        let record = validate_callback(kind, body, path)?;
        let key = extract_natural_key(&record)?;
        Span::current().record("key", key.as_str());

        let data = record.payload.to_value().map_err(StoreError::from)?;
        let doc = StoredNotification::new(record.path, data, key.clone());
        let namespace = self.namespace_for(kind);

        Ok(self.store.try_insert(&namespace, &key, doc).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FsStore, MemoryStore, Result as StoreResult};
    use crate::test_utils::{
        airtime_body, arb_natural_key, arb_provider_kind, body_for, c2b_body, result_body,
        stk_push_body,
    };
    use crate::types::NaturalKey;
    use async_trait::async_trait;
    use proptest::prelude::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn bytes(value: &serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(value).unwrap()
    }

    fn memory_ingestor(mode: NamespaceMode) -> (Ingestor, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (Ingestor::new(store.clone(), mode), store)
    }

    /// A store that is always down.
    struct Unavailable;

    #[async_trait]
    impl NotificationStore for Unavailable {
        async fn try_insert(
            &self,
            _namespace: &Namespace,
            _key: &NaturalKey,
            _doc: StoredNotification,
        ) -> StoreResult<InsertOutcome> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        async fn get(
            &self,
            _namespace: &Namespace,
            _key: &NaturalKey,
        ) -> StoreResult<Option<StoredNotification>> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
    }

    #[test]
    fn status_strings() {
        assert_eq!(IngestionOutcome::Created.as_status(), "Success");
        assert_eq!(IngestionOutcome::Duplicate.as_status(), "Exists");
        assert_eq!(IngestionOutcome::Rejected.as_status(), "Failed");
    }

    #[tokio::test]
    async fn stk_push_round_trip() {
        let (ingestor, store) = memory_ingestor(NamespaceMode::Production);

        let first = ingestor
            .handle(
                ProviderKind::StkPush,
                &bytes(&stk_push_body("837-18118467-1", 1.0)),
                "/stk-push-callback",
            )
            .await;
        let second = ingestor
            .handle(
                ProviderKind::StkPush,
                &bytes(&stk_push_body("837-18118467-1", 250.0)),
                "/stk-push-callback",
            )
            .await;

        assert_eq!(first, IngestionOutcome::Created);
        assert_eq!(second, IngestionOutcome::Duplicate);

        let ns = Namespace::new("mpesa_stk_push_callback");
        let stored = store
            .get(&ns, &NaturalKey::new("837-18118467-1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.path, "/stk-push-callback");
        assert_eq!(stored.reference.as_str(), "837-18118467-1");
        assert_eq!(
            stored.data["Body"]["stkCallback"]["CallbackMetadata"]["Item"][0]["Value"],
            json!(1.0)
        );
    }

    #[tokio::test]
    async fn missing_request_id_is_rejected_without_write() {
        let (ingestor, store) = memory_ingestor(NamespaceMode::Production);
        let mut body = airtime_body("ATQid_SampleTxnId123");
        body.as_object_mut().unwrap().remove("requestId");

        let result = ingestor
            .try_ingest(ProviderKind::Airtime, &bytes(&body), "/at-airtime-callback")
            .await;
        let outcome = ingestor
            .handle(ProviderKind::Airtime, &bytes(&body), "/at-airtime-callback")
            .await;

        assert!(matches!(result, Err(IngestError::Validation(_))));
        assert_eq!(outcome, IngestionOutcome::Rejected);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn malformed_json_is_rejected() {
        let (ingestor, store) = memory_ingestor(NamespaceMode::Production);

        let outcome = ingestor
            .handle(ProviderKind::CustomerToBusiness, b"{\"TransID\":", "/c2b-callback")
            .await;

        assert_eq!(outcome, IngestionOutcome::Rejected);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn blank_key_is_missing_key() {
        let (ingestor, store) = memory_ingestor(NamespaceMode::Production);

        let result = ingestor
            .try_ingest(
                ProviderKind::CustomerToBusiness,
                &bytes(&c2b_body("   ")),
                "/c2b-callback",
            )
            .await;

        assert!(matches!(result, Err(IngestError::MissingKey(_))));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn unsafe_key_is_store_error() {
        let (ingestor, store) = memory_ingestor(NamespaceMode::Production);

        let result = ingestor
            .try_ingest(
                ProviderKind::CustomerToBusiness,
                &bytes(&c2b_body("../../etc")),
                "/c2b-callback",
            )
            .await;

        assert!(matches!(
            result,
            Err(IngestError::Store(StoreError::InvalidKey(_)))
        ));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn store_outage_is_rejected() {
        let ingestor = Ingestor::new(Arc::new(Unavailable), NamespaceMode::Production);

        let outcome = ingestor
            .handle(
                ProviderKind::Reversal,
                &bytes(&result_body("AG_20211230")),
                "/stk-reversal-callback",
            )
            .await;

        assert_eq!(outcome, IngestionOutcome::Rejected);
    }

    #[tokio::test]
    async fn c2b_and_transaction_status_keys_do_not_collide() {
        let (ingestor, store) = memory_ingestor(NamespaceMode::Production);

        let c2b = ingestor
            .handle(
                ProviderKind::CustomerToBusiness,
                &bytes(&c2b_body("PLU8V00V00")),
                "/c2b-callback",
            )
            .await;
        let status = ingestor
            .handle(
                ProviderKind::TransactionStatus,
                &bytes(&result_body("AG_20211230")),
                "/transaction-status-callback",
            )
            .await;

        assert_eq!(c2b, IngestionOutcome::Created);
        assert_eq!(status, IngestionOutcome::Created);
        assert_eq!(store.count(&Namespace::new("mpesa_c2b_callback")), 1);
        assert_eq!(
            store.count(&Namespace::new("mpesa_transaction_status_callback")),
            1
        );
        assert!(
            store
                .get(
                    &Namespace::new("mpesa_c2b_callback"),
                    &NaturalKey::new("PLU8V00V00")
                )
                .await
                .unwrap()
                .is_some()
        );
        assert!(
            store
                .get(
                    &Namespace::new("mpesa_transaction_status_callback"),
                    &NaturalKey::new("AG_20211230")
                )
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_and_production_namespaces_are_independent() {
        let store = Arc::new(MemoryStore::new());
        let test = Ingestor::new(store.clone(), NamespaceMode::Test);
        let prod = Ingestor::new(store.clone(), NamespaceMode::Production);
        let body = bytes(&c2b_body("PLU8V00V00"));

        let in_test = test
            .handle(ProviderKind::CustomerToBusiness, &body, "/c2b-callback")
            .await;
        let in_prod = prod
            .handle(ProviderKind::CustomerToBusiness, &body, "/c2b-callback")
            .await;

        assert_eq!(in_test, IngestionOutcome::Created);
        assert_eq!(in_prod, IngestionOutcome::Created);
        assert_eq!(store.count(&Namespace::new("mpesa_c2b_callback_test")), 1);
        assert_eq!(store.count(&Namespace::new("mpesa_c2b_callback")), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_duplicates_persist_one_intact_payload() {
        let dir = tempdir().unwrap();
        let store = Arc::new(FsStore::open(dir.path()).unwrap());
        let ingestor = Ingestor::new(store.clone(), NamespaceMode::Production);

        let a = bytes(&stk_push_body("837-18118467-1", 10.0));
        let b = bytes(&stk_push_body("837-18118467-1", 20.0));

        let (ra, rb) = tokio::join!(
            {
                let ingestor = ingestor.clone();
                async move {
                    ingestor
                        .handle(ProviderKind::StkPush, &a, "/stk-push-callback")
                        .await
                }
            },
            {
                let ingestor = ingestor.clone();
                async move {
                    ingestor
                        .handle(ProviderKind::StkPush, &b, "/stk-push-callback")
                        .await
                }
            }
        );

        let mut outcomes = [ra, rb];
        outcomes.sort_by_key(|o| o.as_status());
        assert_eq!(
            outcomes,
            [IngestionOutcome::Duplicate, IngestionOutcome::Created]
        );

        let stored = store
            .get(
                &Namespace::new("mpesa_stk_push_callback"),
                &NaturalKey::new("837-18118467-1"),
            )
            .await
            .unwrap()
            .unwrap();
        let amount = &stored.data["Body"]["stkCallback"]["CallbackMetadata"]["Item"][0]["Value"];
        assert!(*amount == json!(10.0) || *amount == json!(20.0));
    }

    proptest! {
        /// Ingesting the same body twice is Created then Duplicate for every
        /// provider kind.
        #[test]
        fn second_delivery_is_duplicate(kind in arb_provider_kind(), key in arb_natural_key()) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let (ingestor, store) = memory_ingestor(NamespaceMode::Production);
                let body = bytes(&body_for(kind, key.as_str()));

                let first = ingestor.handle(kind, &body, kind.route()).await;
                let second = ingestor.handle(kind, &body, kind.route()).await;

                prop_assert_eq!(first, IngestionOutcome::Created);
                prop_assert_eq!(second, IngestionOutcome::Duplicate);
                prop_assert_eq!(store.count(&ingestor.namespace_for(kind)), 1);
                Ok(())
            })?;
        }
    }
}
