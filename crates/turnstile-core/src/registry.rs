//! Pending-request bookkeeping.
//!
//! Maps correlation tokens to suspended calls while a platform request is in
//! flight. Pure bookkeeping: no platform calls happen here.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::debug;

use crate::continuation::Continuation;
use crate::permissions::PermissionSet;

/// Correlation token matching an asynchronous platform callback back to the
/// negotiation that issued the request.
///
/// Tokens are strictly increasing across the process lifetime and never
/// reused or reset, so concurrent requests cannot collide even when their
/// permission sets overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    /// Raw integer handed to the platform request API.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered request waiting for its platform callback.
#[derive(Debug)]
pub struct PendingRequest {
    /// The subset of permissions actually requested.
    pub permissions: PermissionSet,
    /// The suspended call to resume once the callback arrives.
    pub continuation: Continuation,
}

/// Registry of in-flight permission requests.
///
/// Token allocation is a single atomic increment; the token → request map is
/// mutex-guarded so call sites can register while callback delivery removes.
/// An entry whose callback never arrives persists until the process ends;
/// there is no cancellation primitive.
#[derive(Default)]
pub struct PendingRegistry {
    next_token: AtomicU64,
    pending: Mutex<HashMap<u64, PendingRequest>>,
}

impl PendingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a suspended call and return the token the platform callback
    /// must echo back.
    pub fn register(&self, permissions: PermissionSet, continuation: Continuation) -> RequestToken {
        let token = RequestToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        debug!(
            %token,
            permissions = %permissions,
            method = continuation.label(),
            "parked suspended call"
        );
        self.pending
            .lock()
            .insert(token.0, PendingRequest { permissions, continuation });
        token
    }

    /// Remove and return the request stored under `token`.
    ///
    /// Removal is destructive, so a duplicate callback for the same token
    /// finds nothing the second time. An unknown token is not an error;
    /// spurious platform callbacks must be tolerated.
    pub fn resolve(&self, token: RequestToken) -> Option<PendingRequest> {
        let removed = self.pending.lock().remove(&token.0);
        if removed.is_none() {
            debug!(%token, "no pending request for token");
        }
        removed
    }

    /// Number of requests still waiting for a callback.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }
}

impl fmt::Debug for PendingRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRegistry")
            .field("pending_count", &self.pending_count())
            .finish()
    }
}
