pub mod dns_proxy;
pub mod whoiam;

use std::time::Instant;

use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use log::info;

use crate::config::DEFAULT_IP_HEADERS;
use crate::error::ProxyError;

async fn access_log(request: Request, next: Next) -> Response {
    let start = Instant::now();

    // Extract request info
    let method = request.method().clone();
    let uri = request.uri();
    let path = match uri.query() {
        Some(q) => format!("{}?{}", uri.path(), q),
        None => uri.path().to_string(),
    };
    let user_agent = request
        .headers()
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();
    let ip = client_ip(request.headers(), &DEFAULT_IP_HEADERS[..]).unwrap_or_else(|| "-".to_string());

    // Process request
    let response = next.run(request).await;

    // Extract response info
    let status = response.status().as_u16();
    let length = response
        .headers()
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");

    let duration = start.elapsed();

    // Access log format: method path "user-agent" ip status length duration
    info!(
        target: "access",
        "{} {} \"{}\" {} {} {} {:.3}ms",
        method, path, user_agent, ip, status, length, duration.as_secs_f64() * 1000.0
    );

    response
}

/// First non-empty header among `names`, reduced to its first comma-separated entry.
pub fn client_ip<S: AsRef<str>>(headers: &HeaderMap, names: &[S]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| headers.get(name.as_ref()))
        .filter_map(|value| value.to_str().ok())
        .find(|value| !value.is_empty())
        .map(|value| match value.split_once(',') {
            Some((first, _)) => first.trim().to_string(),
            None => value.to_string(),
        })
}

/// Value of the first `name` pair; repeated keys after it are ignored.
pub fn query_param<'a>(pairs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

async fn not_found() -> ProxyError {
    ProxyError::NotFound
}
