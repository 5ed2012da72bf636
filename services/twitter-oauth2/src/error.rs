//! Failures of the authorization and refresh flows

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("TWITTER_CLIENT_ID and TWITTER_CLIENT_SECRET must be set in .env")]
    MissingClientCredentials,

    #[error("TWITTER_OAUTH2_REFRESH_TOKEN not set. Run full flow first.")]
    MissingRefreshToken,

    #[error("Token exchange failed ({status}): {body}")]
    ExchangeFailed { status: u16, body: String },

    #[error("Token refresh failed ({status}): {body}")]
    RefreshFailed { status: u16, body: String },

    #[error("No authorization code received (timeout or user denied)")]
    NoCode,

    #[error("State mismatch! The callback did not come from this authorization request.")]
    StateMismatch,

    #[error("Authorization denied: {0}")]
    Denied(String),

    #[error(transparent)]
    Auth(twitter_auth::Error),

    #[error(transparent)]
    Store(#[from] common::Error),
}

impl Error {
    /// Map an error from the authorization-code leg.
    pub fn from_exchange(err: twitter_auth::Error) -> Self {
        match err {
            twitter_auth::Error::TokenEndpoint { status, body } => {
                Self::ExchangeFailed { status, body }
            }
            twitter_auth::Error::NoCodeReceived => Self::NoCode,
            twitter_auth::Error::StateMismatch => Self::StateMismatch,
            twitter_auth::Error::AuthorizationDenied(reason) => Self::Denied(reason),
            other => Self::Auth(other),
        }
    }

    /// Map an error from the refresh leg.
    pub fn from_refresh(err: twitter_auth::Error) -> Self {
        match err {
            twitter_auth::Error::TokenEndpoint { status, body } => {
                Self::RefreshFailed { status, body }
            }
            other => Self::Auth(other),
        }
    }

    /// Line printed to stderr before exiting 1.
    pub fn report(&self) -> String {
        match self {
            Self::ExchangeFailed { .. } | Self::RefreshFailed { .. } => self.to_string(),
            other => format!("Error: {other}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_endpoint_failures_keep_status_and_body() {
        let err = Error::from_exchange(twitter_auth::Error::TokenEndpoint {
            status: 400,
            body: r#"{"error":"invalid_request"}"#.into(),
        });
        assert_eq!(
            err.report(),
            r#"Token exchange failed (400): {"error":"invalid_request"}"#
        );

        let err = Error::from_refresh(twitter_auth::Error::TokenEndpoint {
            status: 401,
            body: "unauthorized_client".into(),
        });
        assert_eq!(err.report(), "Token refresh failed (401): unauthorized_client");
    }

    #[test]
    fn protocol_failures_get_error_prefix() {
        assert_eq!(
            Error::from_exchange(twitter_auth::Error::NoCodeReceived).report(),
            "Error: No authorization code received (timeout or user denied)"
        );
        assert!(
            Error::from_exchange(twitter_auth::Error::StateMismatch)
                .report()
                .starts_with("Error: State mismatch!")
        );
        assert_eq!(
            Error::MissingRefreshToken.report(),
            "Error: TWITTER_OAUTH2_REFRESH_TOKEN not set. Run full flow first."
        );
    }

    #[test]
    fn other_auth_errors_pass_through() {
        let err = Error::from_refresh(twitter_auth::Error::Http("connection reset".into()));
        assert!(matches!(err, Error::Auth(_)));
        assert_eq!(err.report(), "Error: HTTP request failed: connection reset");
    }
}
