//! Unverified JWT inspection
//!
//! Decodes the header and payload of a token and summarises its timing and
//! identity claims. The signature is reported but never verified.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::errors::{AppError, AppResult};

const COMMON_CLAIMS: [&str; 7] = ["name", "email", "role", "scope", "permissions", "userId", "user_id"];

/// Decoded token plus derived information
#[derive(Debug, Clone, Serialize)]
pub struct TokenInspection {
    pub header: Value,
    pub payload: Value,
    pub signature: String,
    pub token_info: Map<String, Value>,
}

/// Inspect a token against the current time
pub fn inspect(token: &str) -> AppResult<TokenInspection> {
    inspect_at(token, Utc::now().timestamp())
}

/// Inspect a token against `now` (unix seconds)
pub fn inspect_at(token: &str, now: i64) -> AppResult<TokenInspection> {
    let token = token
        .trim()
        .replace("%2E", ".")
        .replace("%2F", "/")
        .replace("%2B", "+");

    let parts: Vec<&str> = token.split('.').collect();
    let [header_part, payload_part, signature_part] = parts.as_slice() else {
        return Err(AppError::validation(
            "Invalid JWT format. Token must have 3 parts separated by dots",
        ));
    };

    let header = decode_segment(header_part).map_err(|e| {
        AppError::validation(format!("Failed to decode JWT header: {e}"))
    })?;
    let payload = decode_segment(payload_part).map_err(|e| {
        AppError::validation(format!("Failed to decode JWT payload: {e}"))
    })?;

    let mut info = Map::new();

    if let Some(exp) = timestamp_claim(&payload, "exp") {
        info.insert(
            "expiration".into(),
            json!({
                "timestamp": exp,
                "datetime": rfc3339(exp),
                "is_expired": now > exp,
                "time_remaining": (exp - now).max(0),
            }),
        );
    }
    if let Some(nbf) = timestamp_claim(&payload, "nbf") {
        info.insert(
            "not_before".into(),
            json!({
                "timestamp": nbf,
                "datetime": rfc3339(nbf),
                "is_valid_now": now >= nbf,
            }),
        );
    }
    if let Some(iat) = timestamp_claim(&payload, "iat") {
        info.insert(
            "issued_at".into(),
            json!({
                "timestamp": iat,
                "datetime": rfc3339(iat),
                "time_ago": now - iat,
            }),
        );
    }

    for (claim, label) in [("sub", "subject"), ("iss", "issuer"), ("aud", "audience"), ("jti", "jwt_id")] {
        if let Some(value) = payload.get(claim) {
            info.insert(label.into(), value.clone());
        }
    }
    for (field, label) in [("alg", "algorithm"), ("typ", "token_type")] {
        if let Some(value) = header.get(field) {
            info.insert(label.into(), value.clone());
        }
    }

    info.insert(
        "structure".into(),
        json!({
            "header_length": header_part.len(),
            "payload_length": payload_part.len(),
            "signature_length": signature_part.len(),
            "total_length": token.len(),
        }),
    );

    let claims: Map<String, Value> = COMMON_CLAIMS
        .iter()
        .filter_map(|claim| payload.get(*claim).map(|v| (claim.to_string(), v.clone())))
        .collect();
    if !claims.is_empty() {
        info.insert("common_claims".into(), Value::Object(claims));
    }

    info.insert(
        "signature".into(),
        json!({
            "present": !signature_part.is_empty(),
            "length": signature_part.len(),
            "algorithm": header.get("alg").cloned().unwrap_or(json!("unknown")),
            "note": "Signature is present but not verified (no secret key provided)",
        }),
    );

    Ok(TokenInspection {
        header,
        payload,
        signature: signature_part.to_string(),
        token_info: info,
    })
}

fn decode_segment(segment: &str) -> Result<Value, String> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('='))
        .map_err(|e| e.to_string())?;
    serde_json::from_slice(&bytes).map_err(|e| e.to_string())
}

fn timestamp_claim(payload: &Value, claim: &str) -> Option<i64> {
    let value = payload.get(claim)?;
    value.as_i64().or_else(|| value.as_f64().map(|v| v as i64))
}

fn rfc3339(timestamp: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp(timestamp, 0).map(|dt| dt.to_rfc3339())
}
