// src/middleware/session.rs

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{HeaderName, HeaderValue, request::Parts},
};
use uuid::Uuid;

pub const SESSION_HEADER: HeaderName = HeaderName::from_static("x-session-token");

/// Server-side session key for the two-step flows. Taken from the
/// `x-session-token` header, or freshly minted when the client has none.
/// Handlers echo it back so the client can continue the flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(pub String);

impl SessionToken {
    pub fn header(&self) -> [(HeaderName, HeaderValue); 1] {
        // Tokens are either uuids or values that already came in as a header.
        let value = HeaderValue::from_str(&self.0).unwrap_or_else(|_| HeaderValue::from_static(""));
        [(SESSION_HEADER, value)]
    }
}

impl<S> FromRequestParts<S> for SessionToken
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(&SESSION_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty() && value.len() <= 64)
            .map(str::to_owned)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        Ok(SessionToken(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[tokio::test]
    async fn existing_tokens_are_kept() {
        let request = Request::builder()
            .header("x-session-token", "abc-123")
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();
        let token = SessionToken::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(token, SessionToken("abc-123".into()));
    }

    #[tokio::test]
    async fn missing_tokens_are_minted() {
        let (mut parts, _) = Request::new(()).into_parts();
        let token = SessionToken::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(Uuid::parse_str(&token.0).is_ok());
    }
}
