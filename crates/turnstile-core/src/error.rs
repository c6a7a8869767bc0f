//! Error types for permission negotiation.

use thiserror::Error;

use crate::permissions::PermissionSet;

/// Result type alias for negotiation operations.
pub type Result<T> = std::result::Result<T, NegotiationError>;

/// Errors raised while negotiating runtime permissions.
///
/// Every variant is surfaced synchronously to whoever drove the failing step.
/// The one condition the crate tolerates silently is a callback for a token
/// it no longer knows, which is logged and ignored.
#[derive(Debug, Error)]
pub enum NegotiationError {
    /// A declared permission name is blank or malformed. Raised before any
    /// platform query is made.
    #[error("invalid permission name: {0:?}")]
    InvalidPermissionName(String),

    /// The intercepted method carries no permission metadata. Indicates a
    /// miswired interception layer.
    #[error("method `{method}` declares no permission requirements")]
    MissingAnnotation {
        /// Name of the intercepted method.
        method: String,
    },

    /// A rationale must be shown but the call target exposes no
    /// [`RationaleListener`](crate::traits::RationaleListener).
    #[error("permissions [{permissions}] need a rationale but the target has no rationale listener")]
    ListenerRequired {
        /// The permissions whose rationale could not be delivered.
        permissions: PermissionSet,
    },

    /// The original call ran and failed. The underlying error is preserved,
    /// never swallowed.
    #[error("proceeding with the original call failed")]
    OriginalCallFailed(#[source] anyhow::Error),
}
