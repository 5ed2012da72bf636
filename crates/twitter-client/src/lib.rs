//! Twitter API v2 client and response reshaping
//!
//! [`ApiClient`] issues authenticated GETs against the v2 REST API and hands
//! back the JSON body. Non-2xx replies are not errors at this layer: they are
//! folded into an `{"error": ..., "status": ...}` object so callers can print
//! them verbatim. The [`format`] module turns raw tweet payloads into the
//! compact records the CLI prints.

mod client;
mod error;
pub mod format;

pub use client::{API_BASE_URL, ApiClient, Auth, query_string};
pub use error::{Error, Result};
pub use format::{
    FormattedTweet, Includes, Link, Meta, Metrics, Tweet, User, extract_tweet_id, format_tweet,
    has_more, users_map,
};
