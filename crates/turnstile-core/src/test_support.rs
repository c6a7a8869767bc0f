//! In-crate fakes for exercising the negotiation pipeline without a
//! platform.
//!
//! Used by this crate's own tests and available to downstream crates that
//! need a scripted permission surface.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::engine::RationaleEvent;
use crate::permissions::{GrantStatus, PermissionSet};
use crate::registry::RequestToken;
use crate::traits::{PermissionQuery, PermissionRequester, RationaleListener};

/// Scripted permission surface.
///
/// Grant status and rationale recommendations are fixed up front with the
/// builder methods; every dialog request and every status query is recorded
/// so tests can assert on exactly what the negotiation touched.
#[derive(Debug, Default)]
pub struct ScriptedEnvironment {
    granted: Mutex<HashSet<String>>,
    explain: HashSet<String>,
    requests: Mutex<Vec<(PermissionSet, RequestToken)>>,
    queries: AtomicUsize,
}

impl ScriptedEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `name` as already granted.
    pub fn grant(self, name: &str) -> Self {
        self.granted.lock().insert(name.to_string());
        self
    }

    /// Recommend a rationale before asking for `name` again.
    pub fn explain(mut self, name: &str) -> Self {
        self.explain.insert(name.to_string());
        self
    }

    /// Flip `name` to granted after construction, emulating the user
    /// accepting a dialog mid-test.
    pub fn set_granted(&self, name: &str) {
        self.granted.lock().insert(name.to_string());
    }

    /// Dialog requests fired so far, in order.
    pub fn requests(&self) -> Vec<(PermissionSet, RequestToken)> {
        self.requests.lock().clone()
    }

    /// Number of status and rationale queries answered so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

impl PermissionQuery for ScriptedEnvironment {
    fn status(&self, name: &str) -> GrantStatus {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.granted.lock().contains(name) {
            GrantStatus::Granted
        } else {
            GrantStatus::Denied
        }
    }

    fn should_explain(&self, name: &str) -> bool {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.explain.contains(name)
    }
}

impl PermissionRequester for ScriptedEnvironment {
    fn request(&self, names: &PermissionSet, token: RequestToken) {
        self.requests.lock().push((names.clone(), token));
    }
}

/// Listener that stores every rationale event it receives.
#[derive(Debug, Default)]
pub struct RecordingListener {
    events: Mutex<Vec<RationaleEvent>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the events received so far, handing back their retry handles.
    pub fn drain(&self) -> Vec<RationaleEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Number of events currently held.
    pub fn event_count(&self) -> usize {
        self.events.lock().len()
    }
}

impl RationaleListener for RecordingListener {
    fn on_show_rationale(&self, event: RationaleEvent) {
        self.events.lock().push(event);
    }
}
