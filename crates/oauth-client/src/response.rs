//! Shared interpretation of authorization server responses
//!
//! Every network operation funnels its response through [`interpret`], so
//! callers get either a JSON payload or a structured `Error::OAuth`, never a
//! raw status code.

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::transport::HttpResponse;

/// Turn a completed response into a payload or a structured failure.
///
/// - JSON content types are parsed; unparseable JSON becomes `{}`.
/// - Anything else is wrapped as `{"error_description": <raw body>}`.
/// - A non-2xx status, or a payload with an `error` field, fails with the
///   payload's `error` as the kind (falling back to `default_kind`).
pub fn interpret(response: &HttpResponse, default_kind: &str) -> Result<Value> {
    let payload = parse_payload(response);

    let server_error = payload
        .get("error")
        .and_then(Value::as_str)
        .filter(|e| !e.is_empty());

    if !response.is_success() || server_error.is_some() {
        let kind = server_error.unwrap_or(default_kind);
        return Err(Error::oauth(kind, describe(&payload, response)));
    }

    Ok(payload)
}

fn parse_payload(response: &HttpResponse) -> Value {
    let is_json = response
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("json"));

    if is_json {
        serde_json::from_str(&response.body).unwrap_or_else(|_| Value::Object(Map::new()))
    } else {
        let mut wrapped = Map::new();
        wrapped.insert(
            "error_description".into(),
            Value::String(response.body.clone()),
        );
        Value::Object(wrapped)
    }
}

fn describe(payload: &Value, response: &HttpResponse) -> String {
    if let Some(description) = payload
        .get("error_description")
        .and_then(Value::as_str)
        .filter(|d| !d.trim().is_empty())
    {
        return description.to_owned();
    }
    if !response.body.trim().is_empty() {
        return response.body.clone();
    }
    let reason = reqwest::StatusCode::from_u16(response.status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("unknown status");
    format!("server returned {} {reason}", response.status)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            content_type: Some("application/json; charset=utf-8".into()),
            body: body.into(),
        }
    }

    fn text(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            content_type: Some("text/plain".into()),
            body: body.into(),
        }
    }

    #[test]
    fn successful_json_is_returned() {
        let payload = interpret(&json(200, r#"{"access_token":"A"}"#), "token_exchange_failed")
            .unwrap();
        assert_eq!(payload["access_token"], "A");
    }

    #[test]
    fn server_error_code_overrides_default_kind() {
        let err = interpret(
            &json(400, r#"{"error":"invalid_grant","error_description":"code expired"}"#),
            "token_exchange_failed",
        )
        .unwrap_err();
        assert_eq!(err.kind(), "invalid_grant");
        assert_eq!(err.description(), "code expired");
    }

    #[test]
    fn error_field_fails_even_with_2xx() {
        let err = interpret(&json(200, r#"{"error":"access_denied"}"#), "refresh_failed")
            .unwrap_err();
        assert_eq!(err.kind(), "access_denied");
    }

    #[test]
    fn non_success_without_error_field_uses_default_kind() {
        let err = interpret(&json(500, r#"{"message":"boom"}"#), "refresh_failed").unwrap_err();
        assert_eq!(err.kind(), "refresh_failed");
        assert!(err.description().contains("boom"));
    }

    #[test]
    fn malformed_json_becomes_empty_object() {
        let payload = interpret(&json(200, "{not json"), "token_exchange_failed").unwrap();
        assert_eq!(payload, Value::Object(Map::new()));

        let err = interpret(&json(502, ""), "token_exchange_failed").unwrap_err();
        assert_eq!(err.kind(), "token_exchange_failed");
        assert_eq!(err.description(), "server returned 502 Bad Gateway");
    }

    #[test]
    fn non_json_body_is_wrapped_as_description() {
        let err = interpret(&text(503, "upstream unavailable"), "userinfo_fetch_failed")
            .unwrap_err();
        assert_eq!(err.kind(), "userinfo_fetch_failed");
        assert_eq!(err.description(), "upstream unavailable");

        let payload = interpret(&text(200, ""), "revoke_failed").unwrap();
        assert_eq!(payload["error_description"], "");
    }

    #[test]
    fn missing_content_type_is_treated_as_text() {
        let response = HttpResponse {
            status: 401,
            content_type: None,
            body: r#"{"error":"invalid_token"}"#.into(),
        };
        let err = interpret(&response, "userinfo_fetch_failed").unwrap_err();
        assert_eq!(err.kind(), "userinfo_fetch_failed");
    }
}
