//! Single-use loopback listener for the OAuth 2.0 redirect
//!
//! The authorization server redirects the browser to
//! `http://localhost:3000/callback?code=...&state=...`. The listener answers
//! the first request on that path, reports its outcome through a oneshot
//! channel and is then shut down by [`CallbackListener::wait`]. Requests that
//! arrive after the outcome was taken get 409 and change nothing.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use tokio::net::TcpListener;
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::constants::CALLBACK_PATH;
use crate::error::{Error, Result};

/// How long a stopping listener may take to finish its last response.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

const SUCCESS_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Twitter authorization</title></head>
<body style="font-family: system-ui; text-align: center; padding-top: 80px;">
<h1>Authorization successful!</h1>
<p>You can close this tab.</p>
</body>
</html>"#;

/// What the redirect told us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// `code` present and `state` matched
    Code(String),
    /// `code` present but `state` did not match the one we generated
    StateMismatch,
    /// No `code`; carries the server's `error` (and description, if any)
    Denied(String),
}

type OutcomeSender = Arc<Mutex<Option<oneshot::Sender<CallbackOutcome>>>>;

#[derive(Clone)]
struct CallbackState {
    expected_state: Arc<str>,
    sender: OutcomeSender,
}

/// Build the router serving `CALLBACK_PATH`.
///
/// The first request takes the sender out of the slot, so at most one
/// outcome is ever reported.
pub fn build_callback_router(
    expected_state: String,
    sender: oneshot::Sender<CallbackOutcome>,
) -> Router {
    let state = CallbackState {
        expected_state: expected_state.into(),
        sender: Arc::new(Mutex::new(Some(sender))),
    };
    Router::new()
        .route(CALLBACK_PATH, get(handle_callback))
        .with_state(state)
}

async fn handle_callback(
    State(state): State<CallbackState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let Some(sender) = state.sender.lock().await.take() else {
        debug!("ignoring repeat callback request");
        return (StatusCode::CONFLICT, "callback already handled").into_response();
    };

    let outcome = classify(&state.expected_state, &params);
    let response = outcome_response(&outcome);
    if sender.send(outcome).is_err() {
        warn!("callback outcome dropped, flow is no longer waiting");
    }
    response
}

/// Decide the outcome of a redirect from its query parameters.
pub fn classify(expected_state: &str, params: &HashMap<String, String>) -> CallbackOutcome {
    match params.get("code") {
        Some(code) => {
            let received = params.get("state").map(String::as_str).unwrap_or_default();
            if received == expected_state {
                CallbackOutcome::Code(code.clone())
            } else {
                CallbackOutcome::StateMismatch
            }
        }
        None => {
            let error = params
                .get("error")
                .cloned()
                .unwrap_or_else(|| "unknown".to_owned());
            match params.get("error_description") {
                Some(desc) => CallbackOutcome::Denied(format!("{error}: {desc}")),
                None => CallbackOutcome::Denied(error),
            }
        }
    }
}

fn outcome_response(outcome: &CallbackOutcome) -> Response {
    match outcome {
        CallbackOutcome::Code(_) => Html(SUCCESS_PAGE).into_response(),
        CallbackOutcome::StateMismatch => {
            (StatusCode::BAD_REQUEST, "State mismatch!").into_response()
        }
        CallbackOutcome::Denied(error) => {
            (StatusCode::BAD_REQUEST, format!("Error: {error}")).into_response()
        }
    }
}

/// A running callback server awaiting its one redirect.
pub struct CallbackListener {
    local_addr: SocketAddr,
    outcome: oneshot::Receiver<CallbackOutcome>,
    shutdown: oneshot::Sender<()>,
    server: JoinHandle<std::io::Result<()>>,
}

impl CallbackListener {
    /// Bind `addr` and start serving the callback route.
    pub async fn bind(addr: SocketAddr, expected_state: String) -> Result<Self> {
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            Error::Callback(format!(
                "failed to bind callback listener on {addr}: {e}. Make sure no other process is using this port."
            ))
        })?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| Error::Callback(format!("reading listener address: {e}")))?;

        let (outcome_tx, outcome_rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let app = build_callback_router(expected_state, outcome_tx);

        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        info!(addr = %local_addr, "callback listener started");
        Ok(Self {
            local_addr,
            outcome: outcome_rx,
            shutdown: shutdown_tx,
            server,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Wait up to `timeout` for the redirect, then stop the server.
    ///
    /// Returns `Ok(None)` when the wait expired without any redirect.
    pub async fn wait(self, timeout: Duration) -> Result<Option<CallbackOutcome>> {
        let result = tokio::time::timeout(timeout, self.outcome).await;

        let _ = self.shutdown.send(());
        match tokio::time::timeout(DRAIN_TIMEOUT, self.server).await {
            Ok(Ok(Ok(()))) => debug!("callback listener stopped"),
            Ok(Ok(Err(e))) => warn!(error = %e, "callback listener error during shutdown"),
            Ok(Err(e)) => warn!(error = %e, "callback listener task panicked"),
            Err(_) => warn!(
                drain_timeout_secs = DRAIN_TIMEOUT.as_secs(),
                "callback listener did not stop in time"
            ),
        }

        match result {
            Ok(Ok(outcome)) => Ok(Some(outcome)),
            Ok(Err(_)) => Err(Error::Callback(
                "callback listener stopped without reporting".into(),
            )),
            Err(_) => Ok(None),
        }
    }
}
