//! Coordinate frame identities.
//!
//! A [`CartesianFrame3D`] is an opaque token identifying a right-handed
//! Cartesian coordinate frame. Tokens are generated from a process-wide
//! monotonic counter; equality is the only meaningful operation. Spatial
//! quantities carry frame tokens and check them when combined — a mismatch
//! is a programming error, reported by a debug assertion.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_FRAME_ID: AtomicU64 = AtomicU64::new(0);

/// An opaque coordinate frame identity.
///
/// Two frames are the same frame iff they compare equal. Every call to
/// [`CartesianFrame3D::new`] yields a fresh, distinct frame.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CartesianFrame3D {
    id: u64,
}

impl CartesianFrame3D {
    /// Create a fresh frame, distinct from every existing one.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: NEXT_FRAME_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// The raw token value. Only useful for diagnostics.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Default for CartesianFrame3D {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CartesianFrame3D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame#{}", self.id)
    }
}

impl fmt::Display for CartesianFrame3D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame#{}", self.id)
    }
}

/// Assert that two spatial quantities are expressed in the same frame.
///
/// Frame checks are design-level invariants: a failure means the caller
/// combined quantities from different frames, which is a bug, not a
/// recoverable condition. Checked in debug builds only.
#[inline]
#[track_caller]
pub fn check_frame(expected: CartesianFrame3D, actual: CartesianFrame3D) {
    debug_assert!(
        expected == actual,
        "frame mismatch: expected {expected:?}, got {actual:?}"
    );
}
