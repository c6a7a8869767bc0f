//! Suspended-call representation.
//!
//! A [`Continuation`] reifies "the original intercepted call plus everything
//! needed to execute it once unblocked" as a single-use closure. Resuming
//! takes the continuation by value, so the consume-exactly-once rule is
//! enforced by move semantics rather than runtime checks.

use std::fmt;

use serde_json::Value;

use crate::permissions::PermissionSet;

type CallBody = Box<dyn FnOnce() -> anyhow::Result<Value> + Send>;

/// Single-use resumable representation of a suspended call.
pub struct Continuation {
    label: String,
    body: CallBody,
}

impl Continuation {
    /// Wrap the original call body. `label` names the intercepted method and
    /// only appears in log output.
    pub fn new<F>(label: impl Into<String>, body: F) -> Self
    where
        F: FnOnce() -> anyhow::Result<Value> + Send + 'static,
    {
        Self {
            label: label.into(),
            body: Box::new(body),
        }
    }

    /// Name of the method this continuation belongs to.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Run the original call, consuming the continuation.
    pub(crate) fn resume(self) -> anyhow::Result<Value> {
        (self.body)()
    }
}

impl fmt::Debug for Continuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Continuation")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Annotation metadata attached to an intercepted call site.
#[derive(Debug, Clone, Default)]
pub struct CallSite {
    /// Name of the intercepted method, for diagnostics.
    pub method: String,
    /// Permissions declared on the method, in declaration order. `None`
    /// means the interception layer found no metadata at all.
    pub declared: Option<PermissionSet>,
}

impl CallSite {
    pub fn new(method: impl Into<String>, declared: PermissionSet) -> Self {
        Self {
            method: method.into(),
            declared: Some(declared),
        }
    }

    /// A call site whose method carries no permission metadata. Negotiating
    /// one fails; the constructor exists so interception layers can surface
    /// the misconfiguration instead of panicking.
    pub fn without_metadata(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            declared: None,
        }
    }
}

/// One trapped invocation: call-site metadata plus the suspended call.
///
/// Consumed by a single negotiation attempt. A rationale round-trip hands the
/// whole value back through [`RetryHandle`](crate::engine::RetryHandle).
#[derive(Debug)]
pub struct InterceptedCall {
    pub site: CallSite,
    pub continuation: Continuation,
}

impl InterceptedCall {
    /// Convenience constructor wrapping the call body on the spot.
    pub fn new<F>(method: impl Into<String>, declared: PermissionSet, body: F) -> Self
    where
        F: FnOnce() -> anyhow::Result<Value> + Send + 'static,
    {
        let method = method.into();
        let continuation = Continuation::new(method.clone(), body);
        Self {
            site: CallSite::new(method, declared),
            continuation,
        }
    }

    pub fn from_parts(site: CallSite, continuation: Continuation) -> Self {
        Self { site, continuation }
    }
}
