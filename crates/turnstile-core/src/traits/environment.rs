//! Platform permission capabilities.

use crate::permissions::{GrantStatus, PermissionSet};
use crate::registry::RequestToken;

/// Read side of the platform permission surface.
///
/// Implementations must be cheap and callable from whatever thread the
/// intercepted call runs on.
pub trait PermissionQuery: Send + Sync {
    /// Current grant status for `name`.
    fn status(&self, name: &str) -> GrantStatus;

    /// Whether the platform recommends showing a rationale before asking
    /// for `name` again.
    fn should_explain(&self, name: &str) -> bool;
}

/// Write side of the platform permission surface.
pub trait PermissionRequester: Send + Sync {
    /// Show the platform's permission dialog for `names`.
    ///
    /// Fire-and-forget: the grant decision arrives later through
    /// [`on_permission_result`](crate::engine::NegotiationEngine::on_permission_result)
    /// carrying the same token.
    fn request(&self, names: &PermissionSet, token: RequestToken);
}

/// Full platform permission surface: query plus request.
///
/// Blanket-implemented, so any type providing both halves qualifies.
pub trait PermissionEnvironment: PermissionQuery + PermissionRequester {}

impl<T: PermissionQuery + PermissionRequester> PermissionEnvironment for T {}
