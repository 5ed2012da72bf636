/// Errors from talking to the Twitter API.
///
/// HTTP error statuses are not represented here; see [`crate::ApiClient::get`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("request failed: {0}")]
    Http(String),

    #[error("invalid response body: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, Error>;
