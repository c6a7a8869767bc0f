//! Permission domain types.
//!
//! Pure value types shared across the negotiation pipeline: the grant status
//! the platform reports for a name, the ordered set of names declared on a
//! call site, and the three-way partition computed for each negotiation
//! attempt. Kept free of implementation logic so hosts can ship them over
//! event channels unchanged.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Grant status the platform reports for a single permission name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantStatus {
    /// The user has granted this permission.
    Granted,
    /// The permission is not currently granted.
    Denied,
}

impl GrantStatus {
    /// Whether this status represents a grant.
    pub fn is_granted(self) -> bool {
        matches!(self, GrantStatus::Granted)
    }
}

/// Ordered set of distinct permission names.
///
/// Construction de-duplicates while preserving first-occurrence order, so
/// iteration always matches declaration order. Emptiness is legal; an empty
/// set negotiates vacuously. Name validity is checked at negotiation time,
/// before any platform query, not at construction; declared metadata is
/// carried verbatim until then.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(Vec<String>);

impl PermissionSet {
    /// Build a set from any iterator of names, dropping duplicates.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::default();
        for name in names {
            set.push(name);
        }
        set
    }

    /// Append a name unless it is already present.
    pub(crate) fn push(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.0.contains(&name) {
            self.0.push(name);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }

    /// Names in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for PermissionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(", "))
    }
}

impl<S: Into<String>> FromIterator<S> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Three-way split of a requested permission set.
///
/// The parts are pairwise disjoint and together reconstruct the input set.
/// Grant status can change between attempts, so a partition is computed fresh
/// for every negotiation attempt and never cached.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    /// Already granted; nothing to negotiate.
    pub granted: PermissionSet,
    /// Denied, and the platform recommends showing a rationale before asking
    /// again.
    pub explain: PermissionSet,
    /// Denied; request directly.
    pub ask: PermissionSet,
}

impl Partition {
    /// Whether every requested permission is already granted.
    pub fn all_granted(&self) -> bool {
        self.explain.is_empty() && self.ask.is_empty()
    }
}
