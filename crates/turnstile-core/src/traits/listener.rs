//! Rationale callback capability.

use crate::engine::RationaleEvent;

/// Capability a call target implements to receive rationale callbacks.
///
/// When a negotiation finds denied permissions that deserve an explanation,
/// the engine hands the target a [`RationaleEvent`] instead of going to the
/// platform dialog directly. A target lacking this capability makes such a
/// negotiation fail with
/// [`NegotiationError::ListenerRequired`](crate::error::NegotiationError::ListenerRequired)
/// rather than silently skipping the rationale step.
pub trait RationaleListener: Send + Sync {
    /// Show the user why the event's permissions are needed.
    ///
    /// Once the user has seen the explanation, redeem the event's retry
    /// handle through
    /// [`NegotiationEngine::retry`](crate::engine::NegotiationEngine::retry)
    /// to continue the negotiation. Dropping the event abandons the
    /// intercepted call.
    fn on_show_rationale(&self, event: RationaleEvent);
}
