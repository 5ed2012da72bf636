//! Twitter/X authentication library
//!
//! Covers both ways the CLI tools authenticate:
//!
//! - OAuth 1.0a request signing (`oauth1::sign`) for user-context reads
//!   such as bookmarks.
//! - OAuth 2.0 authorization code flow with PKCE for minting a user access
//!   token:
//!   1. `pkce::PkcePair::generate()` + `pkce::generate_state()`
//!   2. `callback::CallbackListener::bind()` on the loopback redirect port
//!   3. User authorizes via `pkce::build_authorization_url()`
//!   4. The listener captures exactly one redirect (code or failure)
//!   5. `token::TokenClient::exchange_code()` trades the code for tokens
//!   6. Later, `token::TokenClient::refresh()` renews the access token
//!
//! `flow::authorize()` drives steps 1-5 through the pure state machine in
//! `flow::handle_event`.

pub mod callback;
pub mod constants;
pub mod error;
pub mod flow;
pub mod oauth1;
pub mod pkce;
pub mod token;

pub use callback::{CallbackListener, CallbackOutcome};
pub use constants::*;
pub use error::{Error, Result};
pub use flow::{AuthorizeOptions, authorize};
pub use oauth1::{OAuth1Credentials, percent_encode};
pub use pkce::{PkcePair, build_authorization_url, compute_challenge, generate_state, generate_verifier};
pub use token::{ClientCredentials, TokenClient, TokenResponse};
