//! Identity types for queued writes.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

const SUFFIX_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 9;
const PREFIX: &str = "offline";

/// Identifier of a queued write, generated on the device at enqueue time.
///
/// Format: `offline_<unix-millis>_<9 base36 chars>`. There is no server-assigned
/// identifier yet when a write is queued, so uniqueness comes from the
/// timestamp plus a random suffix (36^9 combinations per millisecond).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalId(String);

impl LocalId {
    /// Generate a fresh id stamped with the current time.
    pub fn generate() -> Self {
        Self::generate_at(crate::unix_millis())
    }

    /// Generate a fresh id stamped with the given unix milliseconds.
    pub fn generate_at(millis: u64) -> Self {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
            .collect();
        Self(format!("{PREFIX}_{millis}_{suffix}"))
    }

    /// Wrap an existing id string (e.g. read back from storage or typed by a user).
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LocalId {
    fn from(id: &str) -> Self {
        Self::from_string(id)
    }
}

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LocalId({})", self.0)
    }
}
