use core::{fmt::Display, mem};

use log::{error, info, warn};
use parking_lot::Mutex;

use crate::error::Error;

pub const DEFAULT_STATS_BUFFER_CAPACITY: usize = 1024;

#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct StatsSnapshot {
    pub successful: u64,
    pub failed: u64,
    pub error_messages: Vec<String>,
    pub dropped_messages: u64,
}

impl StatsSnapshot {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.successful == 0 && self.failed == 0
    }
}

struct Counters {
    successful: u64,
    failed: u64,
    error_messages: Vec<String>,
    dropped_messages: u64,
}

/// Attestation outcomes accumulated between flushes.
///
/// Recording an outcome only touches memory. All output happens in [`AttestationStats::flush`].
pub struct AttestationStats {
    capacity: usize,
    counters: Mutex<Counters>,
}

impl Default for AttestationStats {
    fn default() -> Self {
        Self::new(DEFAULT_STATS_BUFFER_CAPACITY)
    }
}

impl AttestationStats {
    /// At most `capacity` error messages are kept between flushes.
    /// Failures past that are still counted.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            counters: Mutex::new(Counters {
                successful: 0,
                failed: 0,
                error_messages: Vec::with_capacity(capacity),
                dropped_messages: 0,
            }),
        }
    }

    pub fn record_success(&self) {
        self.counters.lock().successful += 1;
    }

    pub fn record_failure(&self, error: &Error, context: impl Display) {
        let message = format!("{error}: {context}");

        let mut counters = self.counters.lock();

        counters.failed += 1;

        if counters.error_messages.len() < self.capacity {
            counters.error_messages.push(message);
        } else {
            counters.dropped_messages += 1;
        }
    }

    /// Resets all counters and logs what they held.
    pub fn flush(&self) -> StatsSnapshot {
        let snapshot = {
            let mut counters = self.counters.lock();

            StatsSnapshot {
                successful: mem::take(&mut counters.successful),
                failed: mem::take(&mut counters.failed),
                error_messages: mem::replace(
                    &mut counters.error_messages,
                    Vec::with_capacity(self.capacity),
                ),
                dropped_messages: mem::take(&mut counters.dropped_messages),
            }
        };

        if !snapshot.is_empty() {
            info!(
                "attestations since last flush: {} successful, {} failed",
                snapshot.successful, snapshot.failed,
            );
        }

        for message in &snapshot.error_messages {
            error!("attestation failed: {message}");
        }

        if snapshot.dropped_messages > 0 {
            warn!(
                "{} attestation error messages were dropped because the buffer was full",
                snapshot.dropped_messages,
            );
        }

        snapshot
    }
}
