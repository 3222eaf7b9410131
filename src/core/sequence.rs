//! # Sequence Generation
//!
//! Correlation identifiers for packets. Zero is reserved as the "unassigned"
//! sentinel, so generators never hand it out.
//!
//! The header builder takes any [`Sequencer`]; by default it uses the
//! process-wide [`global_sequence`], which is safe to call from any thread.

use std::sync::atomic::{AtomicU32, Ordering};

/// Source of non-zero sequence numbers.
pub trait Sequencer: Send + Sync {
    /// Next sequence number. Never returns zero.
    fn next(&self) -> u32;
}

/// Lock-free counter that wraps from `u32::MAX` back to `1`.
#[derive(Debug, Default)]
pub struct AtomicSequence {
    current: AtomicU32,
}

impl AtomicSequence {
    pub const fn new() -> Self {
        Self::starting_after(0)
    }

    /// Counter whose first `next()` returns `last + 1` (or `1` on wrap).
    pub const fn starting_after(last: u32) -> Self {
        Self {
            current: AtomicU32::new(last),
        }
    }

    /// Last value handed out, or the starting point if none was.
    pub fn current(&self) -> u32 {
        self.current.load(Ordering::Acquire)
    }
}

impl Sequencer for AtomicSequence {
    fn next(&self) -> u32 {
        let step = |cur: u32| if cur == u32::MAX { 1 } else { cur + 1 };
        // fetch_update retries on contention, so concurrent callers never share a value.
        match self
            .current
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| Some(step(cur)))
        {
            Ok(prev) | Err(prev) => step(prev),
        }
    }
}

static GLOBAL_SEQUENCE: AtomicSequence = AtomicSequence::new();

/// Process-wide generator used when a header is built without one.
pub fn global_sequence() -> &'static AtomicSequence {
    &GLOBAL_SEQUENCE
}
