//! OAuth 2.0 PKCE authorization flow
//!
//! Pure state machine: receives events, returns (new_state, action).
//! [`authorize`] executes the I/O implied by each action.
//!
//! ```text
//! Idle -> AwaitingRedirect -> CodeReceived -> Exchanged
//!                          \-> Failed | TimedOut
//! ```
//!
//! Only `CodeReceived` leads to a token exchange, so a forged or mismatched
//! redirect can never produce a stored token.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use tracing::{debug, info};

use crate::callback::{CallbackListener, CallbackOutcome};
use crate::constants::{CALLBACK_PATH, CALLBACK_PORT, CALLBACK_TIMEOUT};
use crate::error::{Error, Result};
use crate::pkce::{PkcePair, build_authorization_url, generate_state};
use crate::token::{TokenClient, TokenResponse};

/// Flow states.
#[derive(Debug, PartialEq, Eq)]
pub enum FlowState {
    /// PKCE pair generated, listener bound, browser not yet opened
    Idle,
    /// Browser opened, waiting for the one redirect
    AwaitingRedirect,
    /// Valid code captured, exchange in progress
    CodeReceived,
    /// Redirect carried an error or a mismatched state
    Failed { reason: String },
    /// No redirect within the bounded wait
    TimedOut,
    /// Tokens issued (terminal)
    Exchanged,
}

/// Events that drive state transitions.
#[derive(Debug)]
pub enum FlowEvent {
    BrowserOpened,
    CallbackReceived(CallbackOutcome),
    WaitExpired,
    TokensIssued,
}

/// Actions the caller should execute after a transition.
#[derive(Debug)]
pub enum FlowAction {
    /// Block on the callback listener
    WaitForCallback,
    /// Trade the code for tokens
    ExchangeCode { code: String },
    /// Hand the tokens to the caller for persistence
    PersistTokens,
    /// Stop the flow with this error
    Abort(Error),
    /// No-op
    None,
}

/// Handle a state transition. Pure function: no I/O.
pub fn handle_event(state: FlowState, event: FlowEvent) -> (FlowState, FlowAction) {
    match (state, event) {
        (FlowState::Idle, FlowEvent::BrowserOpened) => {
            (FlowState::AwaitingRedirect, FlowAction::WaitForCallback)
        }

        (FlowState::AwaitingRedirect, FlowEvent::CallbackReceived(outcome)) => match outcome {
            CallbackOutcome::Code(code) => {
                (FlowState::CodeReceived, FlowAction::ExchangeCode { code })
            }
            CallbackOutcome::StateMismatch => (
                FlowState::Failed {
                    reason: "state mismatch".into(),
                },
                FlowAction::Abort(Error::StateMismatch),
            ),
            CallbackOutcome::Denied(error) => (
                FlowState::Failed {
                    reason: error.clone(),
                },
                FlowAction::Abort(Error::AuthorizationDenied(error)),
            ),
        },

        (FlowState::AwaitingRedirect, FlowEvent::WaitExpired) => {
            (FlowState::TimedOut, FlowAction::Abort(Error::NoCodeReceived))
        }

        (FlowState::CodeReceived, FlowEvent::TokensIssued) => {
            (FlowState::Exchanged, FlowAction::PersistTokens)
        }

        // Anything else leaves the state untouched
        (state, _) => (state, FlowAction::None),
    }
}

/// Settings for one authorization run.
#[derive(Debug, Clone)]
pub struct AuthorizeOptions {
    /// Where the callback listener binds
    pub bind_addr: SocketAddr,
    /// Redirect URI sent to the server. `None` derives
    /// `http://localhost:<bound port>/callback`.
    pub redirect_uri: Option<String>,
    /// Bounded wait for the redirect
    pub timeout: Duration,
}

impl Default for AuthorizeOptions {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, CALLBACK_PORT)),
            redirect_uri: None,
            timeout: CALLBACK_TIMEOUT,
        }
    }
}

/// Run the authorization code flow up to and including the token exchange.
///
/// `open_browser` receives the authorization URL once the listener is bound.
/// It must not block; the redirect is awaited afterwards.
pub async fn authorize<F>(
    tokens: &TokenClient,
    options: &AuthorizeOptions,
    open_browser: F,
) -> Result<TokenResponse>
where
    F: FnOnce(&str),
{
    let pkce = PkcePair::generate();
    let expected_state = generate_state();

    let listener = CallbackListener::bind(options.bind_addr, expected_state.clone()).await?;
    let redirect_uri = options.redirect_uri.clone().unwrap_or_else(|| {
        format!(
            "http://localhost:{}{CALLBACK_PATH}",
            listener.local_addr().port()
        )
    });

    let url = build_authorization_url(
        tokens.client_id(),
        &redirect_uri,
        &expected_state,
        &pkce.challenge,
    );
    debug!(%url, "authorization URL");

    let mut state = FlowState::Idle;
    open_browser(&url);

    let (new_state, action) = handle_event(state, FlowEvent::BrowserOpened);
    state = new_state;
    match action {
        FlowAction::WaitForCallback => {}
        other => {
            return Err(Error::Callback(format!(
                "unexpected action after BrowserOpened: {other:?}"
            )));
        }
    }

    info!(
        redirect_uri = %redirect_uri,
        timeout_secs = options.timeout.as_secs(),
        "waiting for authorization callback"
    );
    let event = match listener.wait(options.timeout).await? {
        Some(outcome) => FlowEvent::CallbackReceived(outcome),
        None => FlowEvent::WaitExpired,
    };

    let (new_state, action) = handle_event(state, event);
    state = new_state;
    let code = match action {
        FlowAction::ExchangeCode { code } => code,
        FlowAction::Abort(e) => return Err(e),
        other => {
            return Err(Error::Callback(format!(
                "unexpected action after callback: {other:?}"
            )));
        }
    };

    info!("authorization code received");
    let issued = tokens
        .exchange_code(&code, &pkce.verifier, &redirect_uri)
        .await?;
    drop(pkce);

    match handle_event(state, FlowEvent::TokensIssued) {
        (FlowState::Exchanged, FlowAction::PersistTokens) => Ok(issued),
        (state, action) => Err(Error::Callback(format!(
            "unexpected transition after token exchange: {state:?} / {action:?}"
        ))),
    }
}
