//! Error types for Twitter authentication operations

/// Errors from OAuth 1.0a / OAuth 2.0 operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Non-2xx from the token endpoint. `body` is the raw response text.
    #[error("token endpoint returned {status}: {body}")]
    TokenEndpoint { status: u16, body: String },

    #[error("invalid token response: {0}")]
    InvalidTokenResponse(String),

    #[error("callback listener error: {0}")]
    Callback(String),

    #[error("state mismatch in authorization callback")]
    StateMismatch,

    #[error("authorization denied: {0}")]
    AuthorizationDenied(String),

    #[error("no authorization code received (timeout or user denied)")]
    NoCodeReceived,
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_endpoint_error_carries_status_and_raw_body() {
        let err = Error::TokenEndpoint {
            status: 400,
            body: r#"{"error":"invalid_request"}"#.into(),
        };
        assert_eq!(
            err.to_string(),
            r#"token endpoint returned 400: {"error":"invalid_request"}"#
        );
    }

    #[test]
    fn protocol_violations_have_specific_messages() {
        assert_eq!(
            Error::NoCodeReceived.to_string(),
            "no authorization code received (timeout or user denied)"
        );
        assert!(Error::StateMismatch.to_string().contains("state mismatch"));
        assert!(
            Error::AuthorizationDenied("access_denied".into())
                .to_string()
                .contains("access_denied")
        );
    }
}
