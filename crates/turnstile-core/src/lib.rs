//! Runtime permission negotiation for intercepted calls.
//!
//! Client applications on platforms with runtime-granted capabilities
//! (location, storage, camera, ...) cannot simply call a guarded method: the
//! grant decision may arrive asynchronously, long after the call was made.
//! This crate bridges that gap. An interception layer hands the
//! [`NegotiationEngine`] a trapped call plus the permissions its declaration
//! requires; the engine partitions them into already-granted,
//! needs-rationale, and ask-directly, then either runs the call, delivers a
//! rationale event to the target, or parks the call in a [`PendingRegistry`]
//! and fires a platform request. When the platform's callback eventually
//! arrives it is correlated back by token and the call resumes exactly once.
//!
//! The platform surface and the target's rationale hook are capability
//! traits (see [`traits`]); this crate contains no platform bindings, no
//! interception mechanism, and no UI.
//!
//! ```
//! use std::sync::Arc;
//!
//! use serde_json::json;
//! use turnstile_core::test_support::ScriptedEnvironment;
//! use turnstile_core::{
//!     InterceptedCall, NegotiationEngine, Outcome, PendingRegistry, PermissionSet,
//! };
//!
//! let env = ScriptedEnvironment::new().grant("android.permission.CAMERA");
//! let engine = NegotiationEngine::new(Arc::new(PendingRegistry::new()));
//!
//! let call = InterceptedCall::new(
//!     "openCamera",
//!     PermissionSet::new(["android.permission.CAMERA"]),
//!     || Ok(json!("camera opened")),
//! );
//!
//! match engine.negotiate(call, &env, None).unwrap() {
//!     Outcome::Proceeded(value) => assert_eq!(value, json!("camera opened")),
//!     other => panic!("unexpected outcome: {other:?}"),
//! }
//! ```

pub mod classify;
pub mod continuation;
pub mod engine;
pub mod error;
pub mod permissions;
pub mod registry;
pub mod test_support;
pub mod traits;

pub use classify::classify;
pub use continuation::{CallSite, Continuation, InterceptedCall};
pub use engine::{NegotiationEngine, Outcome, RationaleEvent, RetryHandle};
pub use error::{NegotiationError, Result};
pub use permissions::{GrantStatus, Partition, PermissionSet};
pub use registry::{PendingRegistry, PendingRequest, RequestToken};
pub use traits::{
    PermissionEnvironment, PermissionQuery, PermissionRequester, RationaleListener,
};
