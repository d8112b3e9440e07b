//! Protocol event timestamps
//!
//! Display servers stamp input and property events with a 32-bit millisecond
//! clock that wraps roughly every 49.7 days. Focus assignments must be ordered
//! by these stamps, never by call order, so comparisons here use serial-number
//! arithmetic instead of plain integer ordering.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A display-server event timestamp (milliseconds, wrapping at 2^32).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub u32);

impl Timestamp {
    /// "Now" from the caller's point of view. Resolved by the focus manager to
    /// the latest known event time before any ordering check.
    pub const CURRENT: Timestamp = Timestamp(0);

    pub fn new(millis: u32) -> Self {
        Self(millis)
    }

    pub fn is_current(self) -> bool {
        self == Self::CURRENT
    }

    /// Returns true if `self` happened strictly before `other`, accounting for
    /// clock wraparound.
    pub fn is_before(self, other: Timestamp) -> bool {
        (other.0.wrapping_sub(self.0) as i32) > 0
    }

    /// Returns the later of the two stamps under wraparound ordering.
    pub fn latest(self, other: Timestamp) -> Timestamp {
        if self.is_before(other) {
            other
        } else {
            self
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

impl From<u32> for Timestamp {
    fn from(millis: u32) -> Self {
        Self(millis)
    }
}
