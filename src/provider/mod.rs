pub mod cloudflare;

use axum::http::StatusCode;
use serde::Serialize;
use serde_json::Value;

/// A fully validated record update, defaults already applied.
/// Holds the caller's API token, so it is deliberately not `Debug`.
#[derive(Clone)]
pub struct RecordUpdate {
    pub api_token: String,
    pub zone_id: String,
    pub record_id: String,
    pub record: RecordBody,
}

/// Body sent upstream. Zone and record ids only go into the path. Values
/// are forwarded exactly as the caller sent them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordBody {
    #[serde(rename = "type")]
    pub record_type: Value,
    pub name: Value,
    pub content: Value,
    pub ttl: Value,
    pub proxied: Value,
}

#[derive(Debug)]
pub struct UpstreamResult {
    pub status: StatusCode,
    pub success: bool,
    pub body: Value,
}
