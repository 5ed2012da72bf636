//! Authenticated GETs against the Twitter API v2

use common::Secret;
use reqwest::header::AUTHORIZATION;
use serde_json::{Value, json};
use tracing::{debug, warn};
use twitter_auth::{OAuth1Credentials, percent_encode};

use crate::error::{Error, Result};

/// Production API origin.
pub const API_BASE_URL: &str = "https://api.twitter.com";

/// How a request proves who it is.
#[derive(Debug, Clone)]
pub enum Auth {
    /// App-only bearer token, or an OAuth 2.0 user access token
    Bearer(Secret<String>),
    /// OAuth 1.0a user context, signed per request
    OAuth1(OAuth1Credentials),
}

impl Auth {
    /// `Authorization` header value for a GET of `url` with `query`.
    fn header_value(&self, url: &str, query: &[(&str, &str)]) -> String {
        match self {
            Self::Bearer(token) => format!("Bearer {}", token.as_str()),
            Self::OAuth1(credentials) => credentials.sign("GET", url, query),
        }
    }
}

/// Thin wrapper over a shared `reqwest::Client` and the API origin.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `path` (e.g. `/2/tweets/123`) with `query` appended.
    ///
    /// The query is encoded with the same RFC 3986 rules the OAuth 1.0a
    /// signature uses, so signed and sent parameters always agree.
    ///
    /// A 2xx reply yields its parsed body. Any other status yields
    /// `{"error": <body>, "status": <code>}`, where `<body>` is the parsed JSON
    /// when the reply was JSON and the raw text otherwise. Only transport
    /// failures and undecodable 2xx bodies are `Err`.
    pub async fn get(&self, path: &str, query: &[(&str, &str)], auth: &Auth) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let full_url = if query.is_empty() {
            url.clone()
        } else {
            format!("{url}?{}", query_string(query))
        };

        debug!(url = %url, params = query.len(), "GET");
        let response = self
            .http
            .get(&full_url)
            .header(AUTHORIZATION, auth.header_value(&url, query))
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Http(format!("reading response body: {e}")))?;

        if status.is_success() {
            return serde_json::from_str(&body).map_err(|e| Error::Decode(e.to_string()));
        }

        warn!(status = status.as_u16(), path, "API returned error status");
        let error = serde_json::from_str::<Value>(&body).unwrap_or(Value::String(body));
        Ok(json!({ "error": error, "status": status.as_u16() }))
    }
}

/// `k=v&k=v` in the given order, keys and values percent-encoded.
pub fn query_string(query: &[(&str, &str)]) -> String {
    query
        .iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}
