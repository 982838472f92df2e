use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{any, post},
    Json, Router,
};
use log::{error, info, warn};
use serde_json::{Map, Value};
use time::{macros::format_description, OffsetDateTime};

use super::{access_log, not_found, query_param};
use crate::auth::{ClientKeys, CredentialError};
use crate::error::{Envelope, ProxyError};
use crate::provider::cloudflare::CloudflareClient;
use crate::provider::{RecordBody, RecordUpdate};

const SERVICE_NAME: &str = "cloudflare-dns-proxy";
const DEFAULT_TTL: u32 = 1;

pub struct AppState {
    pub client_keys: ClientKeys,
    pub upstream: CloudflareClient,
}

/// Incoming body, read loosely: a required field only has to be present
/// and truthy (not `null`, `false`, `0` or `""`), and every value is
/// forwarded as sent. `ttl` and `proxied` default only when absent, so an
/// explicit `null` reaches the provider unchanged.
struct DnsUpdateRequest(Map<String, Value>);

impl DnsUpdateRequest {
    fn parse(body: &[u8]) -> Result<Self, ProxyError> {
        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(fields)) => Ok(Self(fields)),
            Ok(Value::Null) => Err(ProxyError::Internal(
                "Cannot read properties of null".to_string(),
            )),
            // Arrays and scalars have none of the fields
            Ok(_) => Ok(Self(Map::new())),
            Err(e) => Err(ProxyError::Internal(e.to_string())),
        }
    }

    /// Checks required fields in order; the first missing one is reported.
    fn into_update(mut self) -> Result<RecordUpdate, ProxyError> {
        let api_token = self.required("api_token")?;
        let zone_id = self.required("zone_id")?;
        let record_id = self.required("record_id")?;
        let record_type = self.required("type")?;
        let name = self.required("name")?;
        let content = self.required("content")?;

        Ok(RecordUpdate {
            api_token: display_text(&api_token),
            zone_id: display_text(&zone_id),
            record_id: display_text(&record_id),
            record: RecordBody {
                record_type,
                name,
                content,
                ttl: self.0.remove("ttl").unwrap_or(Value::from(DEFAULT_TTL)),
                proxied: self.0.remove("proxied").unwrap_or(Value::Bool(false)),
            },
        })
    }

    fn required(&mut self, field: &'static str) -> Result<Value, ProxyError> {
        self.0
            .remove(field)
            .filter(is_truthy)
            .ok_or(ProxyError::MissingField(field))
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Strings without quotes, anything else as JSON text.
fn display_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn create_router(client_keys: ClientKeys, upstream: CloudflareClient) -> Router {
    let state = Arc::new(AppState {
        client_keys,
        upstream,
    });

    Router::new()
        .route("/health", any(health_check))
        .route("/update-dns", post(update_dns).fallback(method_not_allowed))
        .route("/", any(service_info))
        .fallback(not_found)
        .layer(middleware::from_fn(access_log))
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    let timestamp = OffsetDateTime::now_utc()
        .format(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
        ))
        .unwrap_or_default();

    Json(serde_json::json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "timestamp": timestamp,
    }))
}

async fn service_info() -> impl IntoResponse {
    Json(serde_json::json!({
        "service": SERVICE_NAME,
        "endpoints": {
            "health": "/health",
            "update_dns": "/update-dns",
        },
        "usage": "Send POST request to /update-dns with DNS data and client authentication",
    }))
}

async fn method_not_allowed() -> ProxyError {
    ProxyError::MethodNotAllowed
}

async fn update_dns(
    State(state): State<Arc<AppState>>,
    Query(query): Query<Vec<(String, String)>>,
    body: Bytes,
) -> Result<Response, ProxyError> {
    let client_id = query_param(&query, "client_id");
    state
        .client_keys
        .validate(client_id, query_param(&query, "client_key"))
        .map_err(|err| {
            warn!("Rejected client_id {:?}: {:?}", client_id, err);
            match err {
                CredentialError::InvalidId => ProxyError::Auth("Invalid client_id"),
                CredentialError::KeyMismatch => ProxyError::Auth("Invalid client_key"),
            }
        })?;

    let request = DnsUpdateRequest::parse(&body).inspect_err(|e| {
        if let ProxyError::Internal(description) = e {
            error!("Invalid update body: {}", description);
        }
    })?;
    let update = request.into_update()?;
    let name = display_text(&update.record.name);

    let result = state.upstream.update_record(&update).await.map_err(|e| {
        error!("DNS update for {} failed: {:#}", name, e);
        ProxyError::from(e)
    })?;

    if result.success {
        info!("DNS record {} updated to {}", name, display_text(&update.record.content));
        Ok((
            StatusCode::OK,
            Json(Envelope::ok(
                format!("DNS record updated successfully for {}", name),
                result.body,
            )),
        )
            .into_response())
    } else {
        warn!("Cloudflare rejected update for {}: {}", name, result.status);
        Err(ProxyError::Upstream {
            status: result.status,
            name,
            body: result.body,
        })
    }
}
