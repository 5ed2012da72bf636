//! PKCE (Proof Key for Code Exchange) implementation per RFC 7636
//!
//! The verifier stays in memory for the duration of one authorization flow
//! and is sent only with the token exchange; the challenge derived from it
//! goes into the authorization URL so the server can bind the code to us.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngExt;
use sha2::{Digest, Sha256};

use crate::constants::{AUTHORIZE_ENDPOINT, SCOPES};
use crate::oauth1::percent_encode;

/// Verifier plus its S256 challenge.
#[derive(Debug)]
pub struct PkcePair {
    pub verifier: String,
    pub challenge: String,
}

impl PkcePair {
    /// Fresh random verifier and its challenge.
    pub fn generate() -> Self {
        let verifier = generate_verifier();
        let challenge = compute_challenge(&verifier);
        Self {
            verifier,
            challenge,
        }
    }
}

/// Generate a cryptographically random PKCE code verifier.
///
/// 32 random bytes encoded as URL-safe base64 without padding: 43
/// characters, the RFC 7636 minimum.
pub fn generate_verifier() -> String {
    random_urlsafe::<32>()
}

/// Generate the opaque `state` value echoed back on the redirect.
pub fn generate_state() -> String {
    random_urlsafe::<16>()
}

fn random_urlsafe<const N: usize>() -> String {
    let mut bytes = [0u8; N];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Compute the S256 code challenge from a verifier.
///
/// `challenge = BASE64URL(SHA256(verifier))` with the `=` padding removed.
pub fn compute_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Build the authorization URL the user opens in the browser.
pub fn build_authorization_url(
    client_id: &str,
    redirect_uri: &str,
    state: &str,
    challenge: &str,
) -> String {
    format!(
        "{}?response_type=code&client_id={}&redirect_uri={}&scope={}&state={}&code_challenge={}&code_challenge_method=S256",
        AUTHORIZE_ENDPOINT,
        percent_encode(client_id),
        percent_encode(redirect_uri),
        percent_encode(SCOPES),
        percent_encode(state),
        challenge,
    )
}
