//! The four sub-commands: fetch, check, reshape
//!
//! Each command validates its argument and credentials before any request is
//! made, then performs one or two GETs and returns a typed record for `main`
//! to print. Only the first page of any list is read.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use twitter_auth::percent_encode;
use twitter_client::{
    ApiClient, FormattedTweet, Includes, Meta, Tweet, User, extract_tweet_id, format_tweet,
    has_more, users_map,
};

use crate::config::Config;
use crate::error::CommandError;

pub const DEFAULT_MAX_RESULTS: i64 = 10;
const SEARCH_MIN_RESULTS: i64 = 10;
const SEARCH_MAX_RESULTS: i64 = 100;

const READ_TWEET_USAGE: &str = "Usage: read_tweet <tweet_url_or_id>";
const SEARCH_USAGE: &str = "Usage: search <query> [--max_results=10]";
const USER_TWEETS_USAGE: &str = "Usage: user_tweets <username> [--max_results=10]";

const LIST_TWEET_FIELDS: &str = "text,author_id,created_at,public_metrics,entities";

/// What a command needs to run.
pub struct Context {
    pub api: ApiClient,
    pub config: Config,
}

/// Any successful command result.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Output {
    Tweet(FormattedTweet),
    Search(SearchOutput),
    Bookmarks(BookmarksOutput),
    UserTweets(UserTweetsOutput),
}

#[derive(Debug, Serialize)]
pub struct SearchOutput {
    pub query: String,
    pub count: usize,
    pub tweets: Vec<FormattedTweet>,
    #[serde(skip_serializing_if = "is_false")]
    pub has_more: bool,
}

#[derive(Debug, Serialize)]
pub struct BookmarksOutput {
    pub bookmarks_count: usize,
    pub bookmarks: Vec<FormattedTweet>,
    #[serde(skip_serializing_if = "is_false")]
    pub has_more: bool,
}

#[derive(Debug, Serialize)]
pub struct UserTweetsOutput {
    pub user: String,
    pub description: String,
    pub followers: u64,
    pub count: usize,
    pub tweets: Vec<FormattedTweet>,
}

fn is_false(b: &bool) -> bool {
    !b
}

/// Top-level shape shared by every v2 response, plus the `error` key the
/// client uses to wrap non-2xx replies.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
struct Envelope<T> {
    data: Option<T>,
    includes: Option<Includes>,
    meta: Option<Meta>,
    errors: Option<Value>,
    error: Option<Value>,
}

impl<T: DeserializeOwned> Envelope<T> {
    fn decode(body: &Value) -> Result<Self, CommandError> {
        Self::deserialize(body)
            .map_err(|e| CommandError::Client(twitter_client::Error::Decode(e.to_string())))
    }

    /// Reject responses that have no `data` and say why: `errors` from the
    /// API, or a wrapped HTTP error status.
    fn check(mut self, body: &Value) -> Result<Self, CommandError> {
        if self.data.is_none() {
            if let Some(errors) = self.errors.take() {
                return Err(CommandError::ApiErrors(errors));
            }
            if self.error.is_some() {
                return Err(CommandError::NoData(body.clone()));
            }
        }
        Ok(self)
    }
}

/// Decode a single-object lookup; `None` when the response has no usable data.
fn lookup_data<T: DeserializeOwned>(body: &Value) -> Option<T> {
    Envelope::<T>::decode(body).ok().and_then(|e| e.data)
}

/// `search` page size: clamped into what the recent-search endpoint accepts.
pub fn clamp_search_results(requested: i64) -> i64 {
    requested.clamp(SEARCH_MIN_RESULTS, SEARCH_MAX_RESULTS)
}

fn format_all(tweets: Option<Vec<Tweet>>, users: &HashMap<String, User>) -> Vec<FormattedTweet> {
    tweets
        .unwrap_or_default()
        .iter()
        .map(|t| format_tweet(t, users))
        .collect()
}

/// Fetch one tweet by id or URL, with its author and any referenced tweets.
pub async fn read_tweet(ctx: &Context, input: Option<&str>) -> Result<FormattedTweet, CommandError> {
    let input = input.ok_or(CommandError::Usage(READ_TWEET_USAGE))?;
    let tweet_id = extract_tweet_id(input);
    let auth = ctx.config.bearer()?;

    info!(tweet_id = %tweet_id, "reading tweet");
    let body = ctx
        .api
        .get(
            &format!("/2/tweets/{}", percent_encode(&tweet_id)),
            &[
                (
                    "tweet.fields",
                    "text,author_id,created_at,public_metrics,entities,conversation_id,in_reply_to_user_id",
                ),
                (
                    "expansions",
                    "author_id,referenced_tweets.id,referenced_tweets.id.author_id",
                ),
                ("user.fields", "name,username,description"),
            ],
            &auth,
        )
        .await?;

    let envelope = Envelope::<Tweet>::decode(&body)?.check(&body)?;
    let Some(tweet) = envelope.data else {
        return Err(CommandError::NoData(body));
    };

    let users = users_map(envelope.includes.as_ref());
    let mut result = format_tweet(&tweet, &users);
    let referenced: Vec<FormattedTweet> = envelope
        .includes
        .iter()
        .flat_map(|inc| inc.tweets.iter())
        .map(|t| format_tweet(t, &users))
        .collect();
    if !referenced.is_empty() {
        result.referenced_tweets = Some(referenced);
    }
    Ok(result)
}

/// Recent search (last seven days).
pub async fn search(
    ctx: &Context,
    query: Option<&str>,
    max_results: i64,
) -> Result<SearchOutput, CommandError> {
    let query = query.ok_or(CommandError::Usage(SEARCH_USAGE))?;
    let max_results = clamp_search_results(max_results).to_string();
    let auth = ctx.config.bearer()?;

    info!(query, max_results = %max_results, "searching recent tweets");
    let body = ctx
        .api
        .get(
            "/2/tweets/search/recent",
            &[
                ("query", query),
                ("tweet.fields", LIST_TWEET_FIELDS),
                ("expansions", "author_id"),
                ("user.fields", "name,username"),
                ("max_results", &max_results),
            ],
            &auth,
        )
        .await?;

    let envelope = Envelope::<Vec<Tweet>>::decode(&body)?.check(&body)?;
    let users = users_map(envelope.includes.as_ref());
    let tweets = format_all(envelope.data, &users);
    Ok(SearchOutput {
        query: query.to_owned(),
        count: tweets.len(),
        tweets,
        has_more: has_more(envelope.meta.as_ref()),
    })
}

/// The authenticated user's bookmarks. Needs user-context auth.
pub async fn bookmarks(ctx: &Context, max_results: i64) -> Result<BookmarksOutput, CommandError> {
    let auth = ctx.config.bookmarks_auth()?;

    let me = ctx.api.get("/2/users/me", &[], &auth).await?;
    let Some(user) = lookup_data::<User>(&me) else {
        return Err(CommandError::Lookup {
            message: "Failed to get user info".into(),
            details: me,
        });
    };
    debug!(user_id = %user.id, "resolved authenticated user");

    let max_results = max_results.to_string();
    let body = ctx
        .api
        .get(
            &format!("/2/users/{}/bookmarks", percent_encode(&user.id)),
            &[
                ("tweet.fields", LIST_TWEET_FIELDS),
                ("expansions", "author_id"),
                ("user.fields", "name,username"),
                ("max_results", &max_results),
            ],
            &auth,
        )
        .await?;

    let envelope = Envelope::<Vec<Tweet>>::decode(&body)?.check(&body)?;
    let users = users_map(envelope.includes.as_ref());
    let bookmarks = format_all(envelope.data, &users);
    Ok(BookmarksOutput {
        bookmarks_count: bookmarks.len(),
        bookmarks,
        has_more: has_more(envelope.meta.as_ref()),
    })
}

/// Profile summary and recent tweets of one account.
pub async fn user_tweets(
    ctx: &Context,
    handle: Option<&str>,
    max_results: i64,
) -> Result<UserTweetsOutput, CommandError> {
    let handle = handle
        .ok_or(CommandError::Usage(USER_TWEETS_USAGE))?
        .trim_start_matches('@');
    let auth = ctx.config.bearer()?;

    let lookup = ctx
        .api
        .get(
            &format!("/2/users/by/username/{}", percent_encode(handle)),
            &[("user.fields", "name,description,public_metrics")],
            &auth,
        )
        .await?;
    let Some(user) = lookup_data::<User>(&lookup) else {
        return Err(CommandError::Lookup {
            message: format!("User @{handle} not found"),
            details: lookup,
        });
    };
    debug!(user_id = %user.id, handle, "resolved username");

    let max_results = max_results.to_string();
    let body = ctx
        .api
        .get(
            &format!("/2/users/{}/tweets", percent_encode(&user.id)),
            &[
                ("tweet.fields", LIST_TWEET_FIELDS),
                ("max_results", &max_results),
            ],
            &auth,
        )
        .await?;

    let envelope = Envelope::<Vec<Tweet>>::decode(&body)?.check(&body)?;
    let users = HashMap::from([(user.id.clone(), user.clone())]);
    let tweets = format_all(envelope.data, &users);
    Ok(UserTweetsOutput {
        user: format!("@{handle} ({})", user.name.as_deref().unwrap_or_default()),
        description: user.description.clone().unwrap_or_default(),
        followers: user.followers(),
        count: tweets.len(),
        tweets,
    })
}
