//! OAuth 1.0a request signing (HMAC-SHA1) per RFC 5849
//!
//! Every request is signed individually: the oauth parameters and the
//! request's query parameters are percent-encoded, sorted by encoded key and
//! folded into a signature base string, which is then keyed-hashed with the
//! consumer secret and token secret. The server rebuilds the same string, so
//! any deviation in encoding or ordering yields a 401.
//!
//! Precondition: query parameter names must not collide with the reserved
//! `oauth_*` names. Such a collision is not handled; the merged map keeps
//! whichever value was inserted last and the server will reject the request.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use common::Secret;
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use sha1::Sha1;

/// RFC 3986 unreserved characters stay literal; everything else is `%XX`.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const OAUTH_VERSION: &str = "1.0";

type HmacSha1 = Hmac<Sha1>;

/// Percent-encode a string with the RFC 3986 unreserved set.
///
/// Also used to build query strings, so the parameters that are signed and
/// the parameters that are sent are encoded identically.
pub fn percent_encode(s: &str) -> String {
    utf8_percent_encode(s, UNRESERVED).to_string()
}

/// The four strings identifying the app and the user for OAuth 1.0a.
#[derive(Debug, Clone)]
pub struct OAuth1Credentials {
    pub consumer_key: String,
    pub consumer_secret: Secret<String>,
    pub token: String,
    pub token_secret: Secret<String>,
}

impl OAuth1Credentials {
    /// Build the `Authorization` header value for one request with a fresh
    /// nonce and the current time.
    ///
    /// `url` is the request URL without its query string; `query` holds the
    /// query parameters that will be sent (unencoded).
    pub fn sign(&self, method: &str, url: &str, query: &[(&str, &str)]) -> String {
        self.sign_with(method, url, query, &generate_nonce(), unix_timestamp())
    }

    /// Deterministic variant of [`sign`](Self::sign) with caller-supplied
    /// nonce and timestamp.
    pub fn sign_with(
        &self,
        method: &str,
        url: &str,
        query: &[(&str, &str)],
        nonce: &str,
        timestamp: u64,
    ) -> String {
        debug_assert!(
            query.iter().all(|(k, _)| !k.starts_with("oauth_")),
            "query parameters must not use reserved oauth_ names"
        );

        let mut oauth = oauth_params(&self.consumer_key, &self.token, nonce, timestamp);

        let base = signature_base_string(method, url, &oauth, query);
        let key = signing_key(self.consumer_secret.as_str(), self.token_secret.as_str());
        oauth.insert("oauth_signature", hmac_sha1_base64(&key, &base));

        authorization_header(&oauth)
    }
}

/// The six protocol parameters, before the signature is added.
fn oauth_params(
    consumer_key: &str,
    token: &str,
    nonce: &str,
    timestamp: u64,
) -> BTreeMap<&'static str, String> {
    BTreeMap::from([
        ("oauth_consumer_key", consumer_key.to_owned()),
        ("oauth_nonce", nonce.to_owned()),
        ("oauth_signature_method", SIGNATURE_METHOD.to_owned()),
        ("oauth_timestamp", timestamp.to_string()),
        ("oauth_token", token.to_owned()),
        ("oauth_version", OAUTH_VERSION.to_owned()),
    ])
}

/// Normalized parameter string: encode every key and value, sort by encoded
/// key (byte order), join as `k=v` pairs with `&`.
pub fn parameter_string<'a, I>(params: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let encoded: BTreeMap<String, String> = params
        .into_iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();

    encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// `METHOD&enc(url)&enc(parameter string)`.
///
/// Any query string left on `url` is ignored; the parameters it carried must
/// be passed in `query` to be covered by the signature.
pub fn signature_base_string(
    method: &str,
    url: &str,
    oauth: &BTreeMap<&'static str, String>,
    query: &[(&str, &str)],
) -> String {
    let base_url = url.split_once('?').map_or(url, |(base, _)| base);
    let params = parameter_string(
        oauth
            .iter()
            .map(|(k, v)| (*k, v.as_str()))
            .chain(query.iter().copied()),
    );

    format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        percent_encode(base_url),
        percent_encode(&params)
    )
}

/// `enc(consumer_secret)&enc(token_secret)`.
pub fn signing_key(consumer_secret: &str, token_secret: &str) -> String {
    format!(
        "{}&{}",
        percent_encode(consumer_secret),
        percent_encode(token_secret)
    )
}

fn hmac_sha1_base64(key: &str, data: &str) -> String {
    let mut mac = HmacSha1::new_from_slice(key.as_bytes()).expect("HMAC accepts any key length");
    mac.update(data.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}

/// `OAuth k="v", ...` over the oauth parameters, sorted by key.
fn authorization_header(oauth: &BTreeMap<&'static str, String>) -> String {
    let pairs = oauth
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("OAuth {pairs}")
}

/// 32 lowercase hex characters, unique per call.
fn generate_nonce() -> String {
    uuid::Uuid::new_v4().as_simple().to_string()
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    // Worked example from Twitter's "Creating a signature" guide.
    const CONSUMER_KEY: &str = "xvz1evFS4wEEPTGEFPHBog";
    const CONSUMER_SECRET: &str = "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw";
    const TOKEN: &str = "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb";
    const TOKEN_SECRET: &str = "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE";
    const NONCE: &str = "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg";
    const TIMESTAMP: u64 = 1318622958;
    const URL: &str = "https://api.twitter.com/1.1/statuses/update.json";
    const QUERY: &[(&str, &str)] = &[
        ("status", "Hello Ladies + Gentlemen, a signed OAuth request!"),
        ("include_entities", "true"),
    ];

    fn creds() -> OAuth1Credentials {
        OAuth1Credentials {
            consumer_key: CONSUMER_KEY.into(),
            consumer_secret: Secret::from(CONSUMER_SECRET),
            token: TOKEN.into(),
            token_secret: Secret::from(TOKEN_SECRET),
        }
    }

    #[test]
    fn percent_encode_keeps_only_unreserved() {
        assert_eq!(percent_encode("AZaz09-._~"), "AZaz09-._~");
        assert_eq!(percent_encode("a b+c,d!"), "a%20b%2Bc%2Cd%21");
        assert_eq!(percent_encode("https://x.com/"), "https%3A%2F%2Fx.com%2F");
        assert_eq!(percent_encode("é"), "%C3%A9");
    }

    #[test]
    fn parameter_string_sorts_by_encoded_key() {
        // "a b" encodes to "a%20b", which sorts before "a-b" ('%' < '-')
        let params = [("z", "1"), ("a-b", "2"), ("a b", "3"), ("A", "4")];
        assert_eq!(parameter_string(params), "A=4&a%20b=3&a-b=2&z=1");
    }

    #[test]
    fn base_string_matches_reference_example() {
        let oauth = oauth_params(CONSUMER_KEY, TOKEN, NONCE, TIMESTAMP);
        let base = signature_base_string("post", URL, &oauth, QUERY);
        assert_eq!(
            base,
            "POST&https%3A%2F%2Fapi.twitter.com%2F1.1%2Fstatuses%2Fupdate.json&\
             include_entities%3Dtrue%26oauth_consumer_key%3Dxvz1evFS4wEEPTGEFPHBog%26\
             oauth_nonce%3DkYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg%26\
             oauth_signature_method%3DHMAC-SHA1%26oauth_timestamp%3D1318622958%26\
             oauth_token%3D370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb%26\
             oauth_version%3D1.0%26status%3DHello%2520Ladies%2520%252B%2520\
             Gentlemen%252C%2520a%2520signed%2520OAuth%2520request%2521"
        );
    }

    #[test]
    fn signature_matches_reference_example() {
        let key = signing_key(CONSUMER_SECRET, TOKEN_SECRET);
        assert_eq!(
            key,
            "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw&LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE"
        );

        let header = creds().sign_with("POST", URL, QUERY, NONCE, TIMESTAMP);
        assert!(
            header.contains(r#"oauth_signature="hCtSmYh%2BiHYCEqBWrE7C7hYmtUk%3D""#),
            "got: {header}"
        );
    }

    #[test]
    fn header_lists_oauth_params_sorted() {
        let header = creds().sign_with("GET", URL, &[], NONCE, TIMESTAMP);
        assert!(header.starts_with("OAuth oauth_consumer_key=\"xvz1evFS4wEEPTGEFPHBog\", "));

        let keys: Vec<&str> = header
            .trim_start_matches("OAuth ")
            .split(", ")
            .map(|pair| pair.split('=').next().unwrap())
            .collect();
        assert_eq!(
            keys,
            vec![
                "oauth_consumer_key",
                "oauth_nonce",
                "oauth_signature",
                "oauth_signature_method",
                "oauth_timestamp",
                "oauth_token",
                "oauth_version",
            ]
        );
        assert!(!header.contains("include_entities"), "query params stay out of the header");
    }

    #[test]
    fn fixed_nonce_and_timestamp_are_deterministic() {
        let a = creds().sign_with("GET", URL, QUERY, "n", 1);
        let b = creds().sign_with("GET", URL, QUERY, "n", 1);
        assert_eq!(a, b);

        let other_nonce = creds().sign_with("GET", URL, QUERY, "m", 1);
        assert_ne!(a, other_nonce);
    }

    #[test]
    fn query_string_on_url_is_not_signed() {
        let oauth = oauth_params(CONSUMER_KEY, TOKEN, NONCE, TIMESTAMP);
        let with_query = signature_base_string("GET", &format!("{URL}?x=1"), &oauth, &[]);
        let without = signature_base_string("GET", URL, &oauth, &[]);
        assert_eq!(with_query, without);
    }

    #[test]
    fn fresh_nonces_are_32_hex_and_unique() {
        let a = generate_nonce();
        let b = generate_nonce();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(a, b);

        let h1 = creds().sign("GET", URL, &[]);
        let h2 = creds().sign("GET", URL, &[]);
        assert_ne!(h1, h2, "each call must carry its own nonce");
    }
}
