//! Diagnostic echo endpoints.
//!
//! `GET /` and `GET /{id}` echo the optional service id and `name` query
//! parameter back, which is enough to check routing through a proxy.

use axum::Json;
use axum::extract::{Path, Query};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct EchoParams {
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EchoResponse {
    #[serde(rename = "Hello")]
    pub hello: String,
}

fn echo(id: Option<i64>, name: Option<String>) -> EchoResponse {
    let id = id.map_or_else(|| "None".to_string(), |id| id.to_string());
    let name = name.unwrap_or_else(|| "None".to_string());
    EchoResponse {
        hello: format!("Service ID {id} Service Name: {name}"),
    }
}

/// `GET /`
pub async fn index_handler(Query(params): Query<EchoParams>) -> Json<EchoResponse> {
    Json(echo(None, params.name))
}

/// `GET /{id}`
pub async fn service_handler(
    Path(id): Path<i64>,
    Query(params): Query<EchoParams>,
) -> Json<EchoResponse> {
    Json(echo(Some(id), params.name))
}
