//! Command failures and how each one is printed

use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

/// Everything a command can fail with. All of them exit 1; they differ only
/// in the JSON printed to stdout.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("{0}")]
    Usage(&'static str),

    #[error("{0}")]
    MissingCredentials(String),

    /// A lookup step failed; `details` is the response that lacked data
    #[error("{message}")]
    Lookup { message: String, details: Value },

    /// The API answered with `errors` and no `data`
    #[error("API returned errors")]
    ApiErrors(Value),

    /// The response carried neither `data` nor `errors`; printed whole
    #[error("API response carried no data")]
    NoData(Value),

    #[error(transparent)]
    Client(#[from] twitter_client::Error),
}

#[derive(Serialize)]
struct LookupBody<'a> {
    error: &'a str,
    details: &'a Value,
}

impl CommandError {
    /// Text printed to stdout for this failure.
    ///
    /// Argument and credential problems are a single compact line; anything
    /// carrying an API payload is pretty-printed.
    pub fn render(&self) -> String {
        match self {
            Self::Usage(_) | Self::MissingCredentials(_) => {
                json!({ "error": self.to_string() }).to_string()
            }
            Self::Lookup { message, details } => to_pretty(&LookupBody {
                error: message,
                details,
            }),
            Self::ApiErrors(errors) => to_pretty(&json!({ "error": errors })),
            Self::NoData(body) => to_pretty(body),
            Self::Client(e) => to_pretty(&json!({ "error": e.to_string() })),
        }
    }
}

/// Two-space indented JSON; non-ASCII is written as is.
pub fn to_pretty<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| json!({ "error": format!("serializing output: {e}") }).to_string())
}
