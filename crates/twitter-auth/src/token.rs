//! OAuth 2.0 token exchange and refresh
//!
//! Handles the two token endpoint interactions:
//! 1. Authorization code exchange (end of the PKCE flow)
//! 2. Token refresh (operator-triggered, `twitter-oauth2 refresh`)
//!
//! Both POST a form to `TOKEN_ENDPOINT` with HTTP Basic auth carrying the
//! client id and secret (Twitter treats CLI apps as confidential clients).

use common::Secret;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::constants::TOKEN_ENDPOINT;
use crate::error::{Error, Result};

/// Response from the token endpoint for both exchange and refresh.
///
/// Only `access_token` is guaranteed; a refresh token is issued only when
/// `offline.access` was granted.
#[derive(Debug, Deserialize, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Seconds until the access token expires (delta, not absolute)
    #[serde(default)]
    pub expires_in: u64,
    #[serde(default)]
    pub scope: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

/// OAuth 2.0 client id and secret used for Basic auth.
#[derive(Debug, Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: Secret<String>,
}

/// Token endpoint client.
pub struct TokenClient {
    http: reqwest::Client,
    endpoint: String,
    credentials: ClientCredentials,
}

impl TokenClient {
    pub fn new(http: reqwest::Client, credentials: ClientCredentials) -> Self {
        Self {
            http,
            endpoint: TOKEN_ENDPOINT.to_owned(),
            credentials,
        }
    }

    /// Point at a different token endpoint (tests, mock servers).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn client_id(&self) -> &str {
        &self.credentials.client_id
    }

    /// Exchange an authorization code for tokens.
    ///
    /// `redirect_uri` must be the exact value sent in the authorization URL,
    /// and `verifier` the PKCE verifier whose challenge was sent there.
    pub async fn exchange_code(
        &self,
        code: &str,
        verifier: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse> {
        info!("exchanging authorization code for tokens");
        self.post(&[
            ("code", code),
            ("grant_type", "authorization_code"),
            ("client_id", &self.credentials.client_id),
            ("redirect_uri", redirect_uri),
            ("code_verifier", verifier),
        ])
        .await
    }

    /// Obtain a new access token from a refresh token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse> {
        info!("refreshing access token");
        self.post(&[
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
            ("client_id", &self.credentials.client_id),
        ])
        .await
    }

    async fn post(&self, form: &[(&str, &str)]) -> Result<TokenResponse> {
        debug!(endpoint = %self.endpoint, "POST token endpoint");
        let response = self
            .http
            .post(&self.endpoint)
            .basic_auth(
                &self.credentials.client_id,
                Some(self.credentials.client_secret.as_str()),
            )
            .form(form)
            .send()
            .await
            .map_err(|e| Error::Http(format!("token request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<no body>"));
            return Err(Error::TokenEndpoint {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| Error::InvalidTokenResponse(e.to_string()))
    }
}
