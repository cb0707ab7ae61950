//! Internal id generation for stored entities.
//!
//! Every entity the store records carries a `u64` id that stays stable across
//! external renames. Ids are allocated by a process-wide generator that must
//! be monotonic and unique; uniqueness across processes comes from seeding
//! the counter with the wall clock at startup.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Allocates internal ids for new entities.
///
/// Implementations must be monotonic and unique process-wide; the generator
/// is shared across all dispatchers in the process.
pub trait IdGenerator: Send + Sync {
    /// Returns the next id.
    fn next_id(&self) -> u64;
}

/// Bits reserved below the timestamp seed for per-process allocations.
const SEQUENCE_BITS: u32 = 20;

/// Monotonic id generator seeded from the wall clock.
///
/// The high bits carry the epoch-millisecond seed taken at construction, the
/// low bits a per-process sequence, so two processes started at different
/// milliseconds never collide and ids within a process strictly increase.
#[derive(Debug)]
pub struct MonotonicIdGenerator {
    next: AtomicU64,
}

impl MonotonicIdGenerator {
    /// Creates a generator seeded from the current time.
    #[must_use]
    pub fn new() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        // Truncation keeps the id positive; the seed only needs to differ
        // between process starts, not encode the full epoch.
        #[allow(clippy::cast_possible_truncation)]
        let seed = ((millis as u64) << SEQUENCE_BITS) & (u64::MAX >> 1);
        Self::starting_at(seed)
    }

    /// Creates a generator starting at the given id. Intended for tests that
    /// need deterministic ids.
    #[must_use]
    pub const fn starting_at(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
        }
    }
}

impl Default for MonotonicIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for MonotonicIdGenerator {
    fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}
