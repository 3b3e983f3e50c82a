//! Thread-safe context counter for correlating primary messages with replies.
//!
//! # What is a context? (for beginners)
//!
//! Every primary (request) message carries a 32-bit *context* value, called
//! the "system bytes" in HSMS terms.  The equipment copies that value into
//! its reply, so the sender can pair the reply with the request that is
//! still waiting for it.  Two outstanding requests on the same connection
//! must therefore never share a context.
//!
//! A context of `0` is reserved to mean "not set", so the counter never hands
//! it out, not even after wrapping around at `u32::MAX`.
//!
//! # Thread safety
//!
//! The counter is a single `AtomicU32`.  `fetch_update` performs the
//! read-modify-write as one indivisible step, so builders on different
//! threads can draw contexts from the same counter without a lock and
//! without ever receiving the same value twice (until the 2^32 - 1 values
//! wrap around).

use std::sync::atomic::{AtomicU32, Ordering};

/// Process-wide counter used by builders that were not given a
/// connection-scoped one.
static PROCESS_CONTEXTS: ContextCounter = ContextCounter::starting_at(1);

/// A thread-safe, monotonically increasing source of message contexts.
///
/// Contexts start at the configured value (1 by default) and increment by 1
/// with each call to [`next`](ContextCounter::next).  The counter wraps from
/// `u32::MAX` back to 1, skipping the reserved value 0.
///
/// # Examples
///
/// ```rust
/// use hsms_core::message::ContextCounter;
///
/// let counter = ContextCounter::new();
/// assert_eq!(counter.next(), 1);
/// assert_eq!(counter.next(), 2);
/// ```
#[derive(Debug)]
pub struct ContextCounter {
    inner: AtomicU32,
}

impl ContextCounter {
    /// Creates a new counter whose first context is 1.
    pub const fn new() -> Self {
        Self::starting_at(1)
    }

    /// Creates a counter whose first context is `start`.
    ///
    /// A `start` of 0 is treated as 1.
    pub const fn starting_at(start: u32) -> Self {
        let start = if start == 0 { 1 } else { start };
        Self {
            inner: AtomicU32::new(start),
        }
    }

    /// Returns the process-wide counter.
    pub fn process() -> &'static ContextCounter {
        &PROCESS_CONTEXTS
    }

    /// Returns the next context and atomically advances the counter.
    ///
    /// Never returns 0.
    pub fn next(&self) -> u32 {
        // The closure always returns Some, so fetch_update cannot fail.
        match self
            .inner
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| {
                Some(Self::successor(v))
            }) {
            Ok(previous) | Err(previous) => previous,
        }
    }

    /// Returns the context the next call to [`next`](Self::next) will hand out.
    ///
    /// Useful for diagnostics only; another thread may advance the counter
    /// before the caller acts on the value.
    pub fn current(&self) -> u32 {
        self.inner.load(Ordering::Relaxed)
    }

    fn successor(value: u32) -> u32 {
        match value.wrapping_add(1) {
            0 => 1,
            n => n,
        }
    }
}

impl Default for ContextCounter {
    fn default() -> Self {
        Self::new()
    }
}
