//! Names of the credential variables read from the environment / `.env`

/// App-only bearer token (read_tweet, search, user_tweets)
pub const BEARER_TOKEN: &str = "TWITTER_BEARER_TOKEN";

/// OAuth 1.0a consumer key; doubles as the OAuth 2.0 client id fallback
pub const CONSUMER_KEY: &str = "TWITTER_CONSUMER_KEY";
/// OAuth 1.0a consumer secret; doubles as the OAuth 2.0 client secret fallback
pub const CONSUMER_SECRET: &str = "TWITTER_SECRET_KEY";
pub const ACCESS_TOKEN: &str = "TWITTER_ACCESS_TOKEN";
pub const ACCESS_TOKEN_SECRET: &str = "TWITTER_ACCESS_TOKEN_SECRET";

pub const CLIENT_ID: &str = "TWITTER_CLIENT_ID";
pub const CLIENT_SECRET: &str = "TWITTER_CLIENT_SECRET";

/// User access token minted by `twitter-oauth2`
pub const OAUTH2_USER_TOKEN: &str = "TWITTER_OAUTH2_USER_TOKEN";
pub const OAUTH2_REFRESH_TOKEN: &str = "TWITTER_OAUTH2_REFRESH_TOKEN";

/// Optional override of the REST API origin
pub const API_BASE_URL: &str = "TWITTER_API_BASE_URL";
