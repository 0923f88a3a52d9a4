//! HTTP server for the callback relay.
//!
//! # Endpoints
//!
//! - `POST /at-airtime-callback` - airtime top-up results
//! - `POST /kyanda-callback` - bill payment IPNs
//! - `POST /stk-push-callback` - M-Pesa STK push results
//! - `POST /c2b-callback` - M-Pesa customer-to-business confirmations
//! - `POST /transaction-status-callback` - M-Pesa transaction status results
//! - `POST /stk-reversal-callback` - M-Pesa reversal results
//! - `GET /health` - Returns 200 if server is running
//! - `GET /` and `GET /{id}` - diagnostic echo

use std::io;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::ingest::Ingestor;
use crate::store::NotificationStore;
use crate::types::{NamespaceMode, ProviderKind};

pub mod callback;
pub mod health;
pub mod index;
pub mod shutdown;

pub use callback::{
    CallbackResponse, airtime_handler, bill_payment_handler, c2b_handler, reversal_handler,
    stk_push_handler, transaction_status_handler,
};
pub use health::health_handler;
pub use index::{index_handler, service_handler};
pub use shutdown::shutdown_signal;

/// Shared application state.
///
/// This is passed to all handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    ingestor: Ingestor,
}

impl AppState {
    pub fn new(ingestor: Ingestor) -> Self {
        AppState {
            inner: Arc::new(AppStateInner { ingestor }),
        }
    }

    /// Builds the state around a store handle opened at startup.
    pub fn with_store(store: Arc<dyn NotificationStore>, mode: NamespaceMode) -> Self {
        Self::new(Ingestor::new(store, mode))
    }

    pub fn ingestor(&self) -> &Ingestor {
        &self.inner.ingestor
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router(app_state: AppState) -> axum::Router {
    use axum::routing::{get, post};

    axum::Router::new()
        .route(ProviderKind::Airtime.route(), post(airtime_handler))
        .route(ProviderKind::BillPayment.route(), post(bill_payment_handler))
        .route(ProviderKind::StkPush.route(), post(stk_push_handler))
        .route(ProviderKind::CustomerToBusiness.route(), post(c2b_handler))
        .route(
            ProviderKind::TransactionStatus.route(),
            post(transaction_status_handler),
        )
        .route(ProviderKind::Reversal.route(), post(reversal_handler))
        .route("/health", get(health_handler))
        .route("/", get(index_handler))
        .route("/{id}", get(service_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Serves the router on `listener` until `shutdown` is cancelled.
///
/// In-flight requests are allowed to finish; a request that has reached the
/// store is never cut off between its insert and its response.
pub async fn serve(
    listener: TcpListener,
    app_state: AppState,
    shutdown: CancellationToken,
) -> io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Listening");
    }
    axum::serve(listener, build_router(app_state))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;
    info!("Server stopped");
    Ok(())
}
