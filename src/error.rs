use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Every way a request can end other than a relayed upstream success.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Credential check failed; the message is service-specific
    #[error("{0}")]
    Auth(&'static str),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Not Found")]
    NotFound,

    /// Provider answered with a non-2xx status
    #[error("Failed to update DNS record for {name}")]
    Upstream {
        status: StatusCode,
        name: String,
        body: Value,
    },

    #[error("Internal server error")]
    Internal(String),
}

impl From<anyhow::Error> for ProxyError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{:#}", err))
    }
}

/// JSON wrapper used for everything relayed from, or failing around, the provider.
#[derive(Debug, Serialize)]
pub struct Envelope {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub payload: Payload,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Payload {
    Data(Value),
    Error(Value),
}

impl Envelope {
    pub fn ok(message: String, data: Value) -> Self {
        Self {
            success: true,
            message,
            payload: Payload::Data(data),
        }
    }

    pub fn failed(message: String, error: Value) -> Self {
        Self {
            success: false,
            message,
            payload: Payload::Error(error),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        match self {
            ProxyError::Auth(_) | ProxyError::MissingField(_) => {
                (StatusCode::BAD_REQUEST, message).into_response()
            }
            ProxyError::MethodNotAllowed => (StatusCode::METHOD_NOT_ALLOWED, message).into_response(),
            ProxyError::NotFound => (StatusCode::NOT_FOUND, message).into_response(),
            ProxyError::Upstream { status, body, .. } => {
                (status, Json(Envelope::failed(message, body))).into_response()
            }
            ProxyError::Internal(description) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(Envelope::failed(message, Value::String(description))),
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_carries_exactly_one_payload_key() {
        let ok = serde_json::to_value(Envelope::ok("done".into(), json!({"id": 1}))).unwrap();
        assert_eq!(ok, json!({"success": true, "message": "done", "data": {"id": 1}}));

        let failed = serde_json::to_value(Envelope::failed("nope".into(), Value::Null)).unwrap();
        assert_eq!(failed, json!({"success": false, "message": "nope", "error": null}));
    }

    #[test]
    fn status_codes_follow_error_kind() {
        let cases = [
            (ProxyError::Auth("Invalid client_id"), StatusCode::BAD_REQUEST),
            (ProxyError::MissingField("zone_id"), StatusCode::BAD_REQUEST),
            (ProxyError::MethodNotAllowed, StatusCode::METHOD_NOT_ALLOWED),
            (ProxyError::NotFound, StatusCode::NOT_FOUND),
            (ProxyError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (
                ProxyError::Upstream {
                    status: StatusCode::TOO_MANY_REQUESTS,
                    name: "a.example.com".into(),
                    body: json!({}),
                },
                StatusCode::TOO_MANY_REQUESTS,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn anyhow_chain_becomes_internal_description() {
        let err = anyhow::anyhow!("connection refused").context("Failed to send update request");
        match ProxyError::from(err) {
            ProxyError::Internal(description) => {
                assert_eq!(description, "Failed to send update request: connection refused")
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
