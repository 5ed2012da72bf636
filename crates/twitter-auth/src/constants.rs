//! Twitter/X OAuth endpoints and client settings
//!
//! The redirect URI must match one registered for the app in the developer
//! portal exactly, which is why the callback port is fixed.

use std::time::Duration;

/// Browser-facing authorization endpoint
pub const AUTHORIZE_ENDPOINT: &str = "https://x.com/i/oauth2/authorize";

/// Token endpoint for code exchange and token refresh
pub const TOKEN_ENDPOINT: &str = "https://api.twitter.com/2/oauth2/token";

/// Loopback port the callback listener binds to
pub const CALLBACK_PORT: u16 = 3000;

/// Path the authorization server redirects to
pub const CALLBACK_PATH: &str = "/callback";

/// Redirect URI registered for the app
pub const REDIRECT_URI: &str = "http://localhost:3000/callback";

/// Scopes requested for the user token.
/// `offline.access` is what makes the server issue a refresh token.
pub const SCOPES: &str = "tweet.read users.read bookmark.read offline.access";

/// How long the flow waits for the browser redirect
pub const CALLBACK_TIMEOUT: Duration = Duration::from_secs(120);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_uri_matches_port_and_path() {
        assert_eq!(
            REDIRECT_URI,
            format!("http://localhost:{CALLBACK_PORT}{CALLBACK_PATH}")
        );
    }

    #[test]
    fn scopes_cover_bookmark_reads_and_refresh() {
        let scopes: Vec<&str> = SCOPES.split(' ').collect();
        for required in ["tweet.read", "users.read", "bookmark.read", "offline.access"] {
            assert!(scopes.contains(&required), "missing scope {required}");
        }
    }
}
