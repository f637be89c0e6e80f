//! Error types reported by the tree's public operations.

use thiserror::Error;

/// Errors reported by [`crate::Tree`] operations.
///
/// Most failure modes in this crate are programmer errors (a reserved
/// TID bit set, a corrupt node invariant) and are caught with
/// `debug_assert!` rather than surfaced here — see spec §7. The only
/// operation that has a well-defined, reportable failure is `remove`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArtError {
    /// The key was absent, or present with a different TID than the one
    /// given to `remove`.
    #[error("key not present in the tree, or TID mismatch on remove")]
    NotFound,
}
