use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    middleware,
    routing::any,
    Router,
};
use log::warn;

use super::{access_log, client_ip, not_found, query_param};
use crate::auth::{ClientKeys, CredentialError};
use crate::error::ProxyError;

pub struct AppState {
    pub client_keys: ClientKeys,
    pub ip_headers: Vec<String>,
}

pub fn create_router(client_keys: ClientKeys, ip_headers: Vec<String>) -> Router {
    let state = Arc::new(AppState {
        client_keys,
        ip_headers,
    });

    Router::new()
        .route("/", any(whoiam))
        .fallback(not_found)
        .layer(middleware::from_fn(access_log))
        .with_state(state)
}

async fn whoiam(
    State(state): State<Arc<AppState>>,
    Query(query): Query<Vec<(String, String)>>,
    headers: HeaderMap,
) -> Result<String, ProxyError> {
    let id = query_param(&query, "id");
    state
        .client_keys
        .validate(id, query_param(&query, "key"))
        .map_err(|err| {
            warn!("Rejected id {:?}: {:?}", id, err);
            match err {
                CredentialError::InvalidId => ProxyError::Auth("Invalid ID"),
                CredentialError::KeyMismatch => ProxyError::Auth("Key Error"),
            }
        })?;

    Ok(client_ip(&headers, state.ip_headers.as_slice()).unwrap_or_else(|| "unknown".to_string()))
}
