//! Deadline enforcement for request continuations.
//!
//! A continuation races a role-derived timer; whichever finishes first
//! writes the single response through a [`Responder`]. The responded flag is
//! compare-and-swap, so the race can never produce zero or two responses.
//!
//! This is a soft timeout: when the timer wins, the continuation keeps
//! running and its eventual response attempt is silently discarded.
//! Downstream work is never cancelled. Known limitation, kept on purpose —
//! changing it means threading a cancellation token through the
//! continuation chain.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use tokio::sync::oneshot;
use tracing::debug;

use crate::auth::Role;
use crate::error::GatewayError;
use crate::safety::{query_timeout_for, DEFAULT_TIMEOUT};

/// Transport-neutral response. The HTTP collaborator maps `status` onto its
/// wire format.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayResponse {
    pub status: u16,
    pub body: Value,
}

impl GatewayResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "error": message.into() }),
        }
    }

    /// Build from a taxonomy error, using its status mapping and message.
    pub fn from_error(error: &GatewayError) -> Self {
        Self::error(error.status_code(), error.to_string())
    }
}

struct ResponderInner {
    responded: AtomicBool,
    tx: Mutex<Option<oneshot::Sender<GatewayResponse>>>,
}

/// Write-once response handle shared between a continuation and its timer.
#[derive(Clone)]
pub struct Responder {
    inner: Arc<ResponderInner>,
}

impl Responder {
    fn new(tx: oneshot::Sender<GatewayResponse>) -> Self {
        Self {
            inner: Arc::new(ResponderInner {
                responded: AtomicBool::new(false),
                tx: Mutex::new(Some(tx)),
            }),
        }
    }

    /// Attempt to write the response. Returns true iff this call won the
    /// flag; losers' responses are dropped.
    pub fn respond(&self, response: GatewayResponse) -> bool {
        if self
            .inner
            .responded
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(status = response.status, "late response discarded");
            return false;
        }
        if let Some(tx) = self.inner.tx.lock().expect("responder lock poisoned").take() {
            // Receiver may be gone if the caller stopped waiting; the flag
            // still guarantees single-write semantics.
            let _ = tx.send(response);
        }
        true
    }

    pub fn has_responded(&self) -> bool {
        self.inner.responded.load(Ordering::Acquire)
    }
}

/// Race `continuation` against the role's deadline and return the single
/// winning response.
///
/// The continuation receives a [`Responder`] and is expected to eventually
/// call [`Responder::respond`] exactly once. `role` of `None` applies
/// [`DEFAULT_TIMEOUT`].
pub async fn wrap_with_timeout<F, Fut>(role: Option<Role>, continuation: F) -> GatewayResponse
where
    F: FnOnce(Responder) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    let timeout = role.map(query_timeout_for).unwrap_or(DEFAULT_TIMEOUT);
    let (tx, rx) = oneshot::channel();
    let responder = Responder::new(tx);

    tokio::spawn(continuation(responder.clone()));

    let guard = responder.clone();
    tokio::spawn(async move {
        tokio::time::sleep(timeout).await;
        let deadline_exceeded = GatewayError::Timeout(timeout.as_millis() as u64);
        if guard.respond(GatewayResponse::from_error(&deadline_exceeded)) {
            debug!(timeout_ms = timeout.as_millis() as u64, "request timed out");
        }
    });

    // The timer task always fires eventually, so exactly one send happens.
    rx.await
        .unwrap_or_else(|_| GatewayResponse::error(500, "response channel closed"))
}

// ============================================================================
// Tests
// ============================================================================
