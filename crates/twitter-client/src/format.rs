//! Typed views of v2 payloads and the compact records printed by the CLI
//!
//! Incoming types are lenient: every field the API may omit is optional or
//! defaulted, so partial payloads still format. Outgoing types serialize in a
//! fixed field order and skip sections that have nothing to show.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

static TWEET_ID_IN_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:status|statuses)/(\d+)").expect("tweet id pattern is valid")
});

/// A tweet object as returned in `data` or `includes.tweets`.
#[derive(Debug, Clone, Deserialize)]
pub struct Tweet {
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub public_metrics: Option<Map<String, Value>>,
    #[serde(default)]
    pub entities: Option<Entities>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Entities {
    #[serde(default)]
    pub urls: Vec<UrlEntity>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UrlEntity {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub expanded_url: Option<String>,
    #[serde(default)]
    pub display_url: Option<String>,
}

/// A user object from `includes.users` or a user lookup.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub public_metrics: Option<Map<String, Value>>,
}

impl User {
    pub fn followers(&self) -> u64 {
        self.public_metrics
            .as_ref()
            .and_then(|m| m.get("followers_count"))
            .and_then(Value::as_u64)
            .unwrap_or(0)
    }
}

/// Expanded objects referenced from `data`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Includes {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub tweets: Vec<Tweet>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Meta {
    #[serde(default)]
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metrics {
    pub likes: u64,
    pub retweets: u64,
    pub replies: u64,
    pub impressions: u64,
    pub bookmarks: u64,
}

impl Metrics {
    fn from_public(metrics: &Map<String, Value>) -> Self {
        let count = |key: &str| metrics.get(key).and_then(Value::as_u64).unwrap_or(0);
        Self {
            likes: count("like_count"),
            retweets: count("retweet_count"),
            replies: count("reply_count"),
            impressions: count("impression_count"),
            bookmarks: count("bookmark_count"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub url: String,
    pub display: String,
}

/// Printable tweet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormattedTweet {
    pub id: String,
    pub author: String,
    pub text: String,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Metrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<Link>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referenced_tweets: Option<Vec<FormattedTweet>>,
}

/// Pull the numeric id out of a tweet URL; anything else comes back as is.
///
/// ```
/// use twitter_client::extract_tweet_id;
/// assert_eq!(extract_tweet_id("https://x.com/a/status/123?s=20"), "123");
/// assert_eq!(extract_tweet_id("123"), "123");
/// ```
pub fn extract_tweet_id(input: &str) -> String {
    TWEET_ID_IN_URL
        .captures(input)
        .and_then(|c| c.get(1))
        .map_or_else(|| input.to_owned(), |m| m.as_str().to_owned())
}

/// Index `includes.users` by user id.
pub fn users_map(includes: Option<&Includes>) -> HashMap<String, User> {
    includes
        .map(|inc| {
            inc.users
                .iter()
                .map(|u| (u.id.clone(), u.clone()))
                .collect()
        })
        .unwrap_or_default()
}

/// Reshape a tweet, resolving its author through `users`.
pub fn format_tweet(tweet: &Tweet, users: &HashMap<String, User>) -> FormattedTweet {
    let author = tweet.author_id.as_ref().and_then(|id| users.get(id));
    let handle = author.and_then(|u| u.username.as_deref()).unwrap_or("?");
    let name = author.and_then(|u| u.name.as_deref()).unwrap_or("?");

    let metrics = tweet
        .public_metrics
        .as_ref()
        .filter(|m| !m.is_empty())
        .map(Metrics::from_public);

    let links = tweet
        .entities
        .as_ref()
        .filter(|e| !e.urls.is_empty())
        .map(|e| {
            e.urls
                .iter()
                .map(|u| Link {
                    url: u
                        .expanded_url
                        .clone()
                        .or_else(|| u.url.clone())
                        .unwrap_or_default(),
                    display: u.display_url.clone().unwrap_or_default(),
                })
                .collect()
        });

    FormattedTweet {
        id: tweet.id.clone(),
        author: format!("@{handle} ({name})"),
        text: tweet.text.clone(),
        created_at: tweet.created_at.clone().unwrap_or_default(),
        metrics,
        links,
        referenced_tweets: None,
    }
}

/// Whether a list response has further pages.
pub fn has_more(meta: Option<&Meta>) -> bool {
    meta.and_then(|m| m.next_token.as_deref())
        .is_some_and(|t| !t.is_empty())
}
