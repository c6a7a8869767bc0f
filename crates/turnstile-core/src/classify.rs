//! Permission classification.
//!
//! Splits a requested permission set into already-granted, needs-rationale,
//! and ask-directly parts. Deterministic, and side-effect-free beyond the
//! status queries themselves; never touches the platform request API.

use tracing::debug;

use crate::error::{NegotiationError, Result};
use crate::permissions::{Partition, PermissionSet};
use crate::traits::PermissionQuery;

/// Split `requested` by current grant status.
///
/// Every name is validated up front: a blank name or one containing
/// whitespace aborts with [`NegotiationError::InvalidPermissionName`] before
/// a single platform query is made. Valid names are then checked in
/// declaration order. Granted names land in `granted`; denied names land in
/// `explain` when the platform recommends a rationale, otherwise in `ask`.
///
/// `skip_rationale` is the retry mode: a user who already saw the rationale
/// and chose to ask again is not shown it twice, so denied names go straight
/// to `ask` even when the platform would recommend an explanation.
pub fn classify(
    requested: &PermissionSet,
    env: &dyn PermissionQuery,
    skip_rationale: bool,
) -> Result<Partition> {
    for name in requested.iter() {
        if !is_valid_name(name) {
            return Err(NegotiationError::InvalidPermissionName(name.to_string()));
        }
    }

    let mut partition = Partition::default();
    for name in requested.iter() {
        let status = env.status(name);
        debug!(permission = name, granted = status.is_granted(), "grant status");
        if status.is_granted() {
            partition.granted.push(name);
            continue;
        }

        let explain = env.should_explain(name);
        debug!(permission = name, show_rationale = explain, "rationale recommendation");
        if explain && !skip_rationale {
            partition.explain.push(name);
        } else {
            partition.ask.push(name);
        }
    }

    Ok(partition)
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(char::is_whitespace)
}
