//! Negotiation engine.
//!
//! Orchestrates one negotiation attempt per intercepted call: classify the
//! declared permissions, then either hand the target a rationale event,
//! park the call and fire a platform request, or run the call on the spot.
//! The asynchronous half is [`NegotiationEngine::on_permission_result`],
//! which correlates a platform callback back to its suspended call and
//! resumes it.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::classify::classify;
use crate::continuation::{CallSite, InterceptedCall};
use crate::error::{NegotiationError, Result};
use crate::permissions::PermissionSet;
use crate::registry::{PendingRegistry, RequestToken};
use crate::traits::{PermissionEnvironment, RationaleListener};

/// Where a negotiation attempt left the intercepted call.
#[derive(Debug)]
pub enum Outcome {
    /// Everything was granted; the original call ran synchronously and this
    /// is its result.
    Proceeded(Value),
    /// A rationale event was delivered to the target; the call did not run.
    /// Re-entry happens through the event's retry handle.
    Explaining,
    /// A platform request was fired; the call is parked under `token` until
    /// the callback arrives.
    Requesting {
        /// Correlation token the platform callback must echo back.
        token: RequestToken,
    },
}

/// Restartable negotiation handed to the rationale listener.
///
/// Redeem through [`NegotiationEngine::retry`]. The re-entered negotiation
/// classifies the full declared set afresh with the rationale step
/// suppressed; it does not skip past classification.
#[derive(Debug)]
pub struct RetryHandle {
    call: InterceptedCall,
}

/// Rationale notification: the denied permissions that deserve an
/// explanation, plus the handle that restarts the negotiation once the user
/// has seen it.
///
/// Ephemeral: the core does not retain it after delivery. Dropping it
/// abandons the intercepted call.
#[derive(Debug)]
pub struct RationaleEvent {
    /// The permissions to explain, in declaration order.
    pub permissions: PermissionSet,
    /// Restarts the negotiation with the rationale step suppressed.
    pub retry: RetryHandle,
}

/// Drives permission negotiation for intercepted calls.
///
/// The pending-call registry is injected so hosts can scope in-flight state
/// explicitly instead of leaning on process globals, and so tests can
/// observe it.
pub struct NegotiationEngine {
    registry: Arc<PendingRegistry>,
}

impl Default for NegotiationEngine {
    fn default() -> Self {
        Self::new(Arc::new(PendingRegistry::new()))
    }
}

impl NegotiationEngine {
    pub fn new(registry: Arc<PendingRegistry>) -> Self {
        Self { registry }
    }

    /// Registry this engine parks suspended calls in.
    pub fn registry(&self) -> &PendingRegistry {
        &self.registry
    }

    /// Negotiate permissions for one intercepted call.
    ///
    /// Exactly one of three things happens:
    /// - every declared permission is already granted (or the declared set is
    ///   empty): the original call runs now and [`Outcome::Proceeded`]
    ///   carries its result;
    /// - some denied permission deserves a rationale: the `listener` receives
    ///   a [`RationaleEvent`] and [`Outcome::Explaining`] is returned without
    ///   running the call; a missing listener is the hard error
    ///   [`NegotiationError::ListenerRequired`];
    /// - otherwise the denied permissions are requested from the platform and
    ///   [`Outcome::Requesting`] is returned; the call stays parked until
    ///   [`on_permission_result`](Self::on_permission_result) is invoked with
    ///   the same token.
    pub fn negotiate<E: PermissionEnvironment>(
        &self,
        call: InterceptedCall,
        env: &E,
        listener: Option<&dyn RationaleListener>,
    ) -> Result<Outcome> {
        self.negotiate_inner(call, env, listener, false)
    }

    /// Re-enter a negotiation after the user has seen the rationale.
    ///
    /// Classification runs afresh over the full declared set with the
    /// rationale step suppressed, so the attempt either proceeds directly or
    /// escalates to a platform request. It can never return to
    /// [`Outcome::Explaining`].
    pub fn retry<E: PermissionEnvironment>(
        &self,
        handle: RetryHandle,
        env: &E,
        listener: Option<&dyn RationaleListener>,
    ) -> Result<Outcome> {
        self.negotiate_inner(handle.call, env, listener, true)
    }

    fn negotiate_inner<E: PermissionEnvironment>(
        &self,
        call: InterceptedCall,
        env: &E,
        listener: Option<&dyn RationaleListener>,
        skip_rationale: bool,
    ) -> Result<Outcome> {
        let InterceptedCall { site, continuation } = call;
        let CallSite { method, declared } = site;
        let declared = declared.ok_or_else(|| NegotiationError::MissingAnnotation {
            method: method.clone(),
        })?;

        debug!(method = %method, required = declared.len(), skip_rationale, "negotiating");

        let partition = classify(&declared, env, skip_rationale)?;

        if !partition.explain.is_empty() {
            let Some(listener) = listener else {
                return Err(NegotiationError::ListenerRequired {
                    permissions: partition.explain,
                });
            };
            debug!(method = %method, permissions = %partition.explain, "showing rationale");
            let retry = RetryHandle {
                call: InterceptedCall::from_parts(
                    CallSite::new(method, declared),
                    continuation,
                ),
            };
            listener.on_show_rationale(RationaleEvent {
                permissions: partition.explain,
                retry,
            });
            return Ok(Outcome::Explaining);
        }

        if !partition.ask.is_empty() {
            let token = self.registry.register(partition.ask.clone(), continuation);
            debug!(method = %method, %token, permissions = %partition.ask, "requesting from platform");
            env.request(&partition.ask, token);
            return Ok(Outcome::Requesting { token });
        }

        debug!(method = %method, "all permissions granted, proceeding");
        let value = continuation
            .resume()
            .map_err(NegotiationError::OriginalCallFailed)?;
        Ok(Outcome::Proceeded(value))
    }

    /// Deliver a platform grant result for `token`.
    ///
    /// The suspended call resumes exactly once whether or not the permissions
    /// were ultimately granted; the resumed call re-checks grant status
    /// itself if it cares. A token the registry does not know (a spurious or
    /// duplicate callback) is logged and ignored, yielding `Ok(None)`.
    pub fn on_permission_result(
        &self,
        token: RequestToken,
        names: &PermissionSet,
        granted: &[bool],
    ) -> Result<Option<Value>> {
        for (name, flag) in names.iter().zip(granted) {
            debug!(%token, permission = name, granted = *flag, "grant result");
        }

        let Some(pending) = self.registry.resolve(token) else {
            warn!(%token, "grant result for unknown token, ignoring");
            return Ok(None);
        };

        debug!(%token, method = pending.continuation.label(), "resuming suspended call");
        let value = pending
            .continuation
            .resume()
            .map_err(NegotiationError::OriginalCallFailed)?;
        Ok(Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use serde_json::json;

    use crate::test_support::{RecordingListener, ScriptedEnvironment};

    fn engine() -> NegotiationEngine {
        NegotiationEngine::default()
    }

    #[test]
    fn already_granted_permissions_proceed_synchronously() {
        let env = ScriptedEnvironment::new().grant("STORAGE");
        let engine = engine();
        let call = InterceptedCall::new("saveNote", PermissionSet::new(["STORAGE"]), || {
            Ok(json!("saved"))
        });

        let outcome = engine.negotiate(call, &env, None).unwrap();

        assert!(matches!(outcome, Outcome::Proceeded(value) if value == json!("saved")));
        assert_eq!(engine.registry().pending_count(), 0);
        assert!(env.requests().is_empty());
    }

    #[test]
    fn empty_declared_set_proceeds_vacuously() {
        let env = ScriptedEnvironment::new();
        let engine = engine();
        let call = InterceptedCall::new("noop", PermissionSet::default(), || Ok(json!(1)));

        let outcome = engine.negotiate(call, &env, None).unwrap();

        assert!(matches!(outcome, Outcome::Proceeded(_)));
    }

    #[test]
    fn missing_metadata_is_a_hard_error() {
        let env = ScriptedEnvironment::new();
        let engine = engine();
        let call = InterceptedCall::from_parts(
            CallSite::without_metadata("mystery"),
            crate::continuation::Continuation::new("mystery", || Ok(Value::Null)),
        );

        let err = engine.negotiate(call, &env, None).unwrap_err();

        assert!(matches!(
            err,
            NegotiationError::MissingAnnotation { method } if method == "mystery"
        ));
    }

    #[test]
    fn denied_permissions_without_rationale_are_requested() {
        let env = ScriptedEnvironment::new();
        let engine = engine();
        let call = InterceptedCall::new(
            "recordClip",
            PermissionSet::new(["CAMERA", "MIC"]),
            || Ok(Value::Null),
        );

        let outcome = engine.negotiate(call, &env, None).unwrap();

        let Outcome::Requesting { token } = outcome else {
            panic!("expected a platform request");
        };
        let requests = env.requests();
        assert_eq!(requests, vec![(PermissionSet::new(["CAMERA", "MIC"]), token)]);
        assert_eq!(engine.registry().pending_count(), 1);
    }

    #[test]
    fn rationale_needed_without_listener_fails_and_never_runs_the_call() {
        let ran = Arc::new(AtomicUsize::new(0));
        let ran_probe = Arc::clone(&ran);
        let env = ScriptedEnvironment::new().explain("CAMERA");
        let engine = engine();
        let call = InterceptedCall::new("openCamera", PermissionSet::new(["CAMERA"]), move || {
            ran_probe.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Null)
        });

        let err = engine.negotiate(call, &env, None).unwrap_err();

        assert!(matches!(err, NegotiationError::ListenerRequired { .. }));
        assert_eq!(ran.load(Ordering::SeqCst), 0);
        assert_eq!(engine.registry().pending_count(), 0);
    }

    #[test]
    fn rationale_goes_to_the_listener_and_halts_the_call() {
        let env = ScriptedEnvironment::new().explain("CAMERA");
        let listener = RecordingListener::new();
        let engine = engine();
        let call =
            InterceptedCall::new("openCamera", PermissionSet::new(["CAMERA"]), || Ok(Value::Null));

        let outcome = engine.negotiate(call, &env, Some(&listener)).unwrap();

        assert!(matches!(outcome, Outcome::Explaining));
        let events = listener.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].permissions, PermissionSet::new(["CAMERA"]));
        assert!(env.requests().is_empty(), "rationale halts before any request");
        assert_eq!(engine.registry().pending_count(), 0);
    }

    #[test]
    fn retry_suppresses_the_rationale_and_escalates_to_a_request() {
        let env = ScriptedEnvironment::new().explain("CAMERA");
        let listener = RecordingListener::new();
        let engine = engine();
        let call =
            InterceptedCall::new("openCamera", PermissionSet::new(["CAMERA"]), || Ok(Value::Null));

        assert!(matches!(
            engine.negotiate(call, &env, Some(&listener)).unwrap(),
            Outcome::Explaining
        ));
        let event = listener.drain().remove(0);

        let outcome = engine.retry(event.retry, &env, Some(&listener)).unwrap();

        let Outcome::Requesting { token } = outcome else {
            panic!("retry should escalate to a platform request");
        };
        assert_eq!(env.requests(), vec![(PermissionSet::new(["CAMERA"]), token)]);
        assert_eq!(listener.event_count(), 0, "rationale shown at most once");
    }

    #[test]
    fn callback_resumes_the_parked_call_exactly_once() {
        let ran = Arc::new(AtomicUsize::new(0));
        let ran_probe = Arc::clone(&ran);
        let env = ScriptedEnvironment::new();
        let engine = engine();
        let call = InterceptedCall::new("recordClip", PermissionSet::new(["MIC"]), move || {
            ran_probe.fetch_add(1, Ordering::SeqCst);
            Ok(json!("recorded"))
        });

        let Outcome::Requesting { token } = engine.negotiate(call, &env, None).unwrap() else {
            panic!("expected a platform request");
        };

        let names = PermissionSet::new(["MIC"]);
        let first = engine.on_permission_result(token, &names, &[true]).unwrap();
        assert_eq!(first, Some(json!("recorded")));
        assert_eq!(ran.load(Ordering::SeqCst), 1);

        let second = engine.on_permission_result(token, &names, &[true]).unwrap();
        assert_eq!(second, None, "duplicate callbacks find nothing");
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn callback_resumes_even_when_permissions_were_denied() {
        let env = ScriptedEnvironment::new();
        let engine = engine();
        let call =
            InterceptedCall::new("recordClip", PermissionSet::new(["MIC"]), || Ok(json!("ran")));

        let Outcome::Requesting { token } = engine.negotiate(call, &env, None).unwrap() else {
            panic!("expected a platform request");
        };

        let resumed = engine
            .on_permission_result(token, &PermissionSet::new(["MIC"]), &[false])
            .unwrap();
        assert_eq!(resumed, Some(json!("ran")));
    }

    #[test]
    fn failure_inside_the_original_call_is_wrapped() {
        let env = ScriptedEnvironment::new().grant("STORAGE");
        let engine = engine();
        let call = InterceptedCall::new("saveNote", PermissionSet::new(["STORAGE"]), || {
            Err(anyhow::anyhow!("disk full"))
        });

        let err = engine.negotiate(call, &env, None).unwrap_err();

        assert!(matches!(err, NegotiationError::OriginalCallFailed(_)));
    }

    #[test]
    fn failure_during_resumption_is_wrapped_too() {
        let env = ScriptedEnvironment::new();
        let engine = engine();
        let call = InterceptedCall::new("recordClip", PermissionSet::new(["MIC"]), || {
            Err(anyhow::anyhow!("mic unplugged"))
        });

        let Outcome::Requesting { token } = engine.negotiate(call, &env, None).unwrap() else {
            panic!("expected a platform request");
        };

        let err = engine
            .on_permission_result(token, &PermissionSet::new(["MIC"]), &[true])
            .unwrap_err();
        assert!(matches!(err, NegotiationError::OriginalCallFailed(_)));
    }
}
