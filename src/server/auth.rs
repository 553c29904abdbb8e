//! Shared-secret guard for the rendering routes.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use super::AppState;
use super::error::ApiError;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Proof that the caller presented the configured secret.
///
/// Accepts `Authorization: Bearer <secret>` or `X-Api-Key: <secret>`.
/// Always succeeds when no secret is configured.
#[derive(Debug, Clone, Copy)]
pub struct Authorized;

impl FromRequestParts<AppState> for Authorized {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(secret) = state.secret.as_deref() else {
            return Ok(Authorized);
        };

        let bearer = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        let api_key = parts
            .headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok());

        let presented = [bearer, api_key]
            .into_iter()
            .flatten()
            .any(|candidate| secrets_match(candidate.trim(), secret));
        if presented {
            Ok(Authorized)
        } else {
            tracing::warn!(path = %parts.uri.path(), "rejected request without valid credentials");
            Err(ApiError::Unauthorized)
        }
    }
}

/// Comparison whose running time does not depend on where the inputs differ.
fn secrets_match(candidate: &str, secret: &str) -> bool {
    let (a, b) = (candidate.as_bytes(), secret.as_bytes());
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secrets_match() {
        assert!(secrets_match("s3cret", "s3cret"));
        assert!(!secrets_match("s3cret", "s3cre"));
        assert!(!secrets_match("s3creT", "s3cret"));
        assert!(!secrets_match("", "s3cret"));
    }
}
