use std::sync::Arc;

use anyhow::Result;
use log::{debug, error};
use prometheus_metrics::Metrics;
use tokio::sync::watch::{self, Receiver, Sender};
use tokio_util::sync::CancellationToken;
use types::{
    config::Config as ChainConfig,
    phase0::{
        consts::GENESIS_SLOT,
        primitives::{Slot, UnixSeconds},
    },
};

/// Highest slot in which a valid block has been observed.
///
/// Subscribers only ever see the latest value. A slow subscriber never delays
/// [`SlotFeed::record_observed_slot`].
pub struct SlotFeed {
    sender: Sender<Slot>,
}

impl Default for SlotFeed {
    fn default() -> Self {
        let (sender, _) = watch::channel(GENESIS_SLOT);
        Self { sender }
    }
}

impl SlotFeed {
    /// Returns `true` if `slot` is higher than every slot recorded before it.
    pub fn record_observed_slot(&self, slot: Slot) -> bool {
        self.sender.send_if_modified(|highest_slot| {
            if slot <= *highest_slot {
                return false;
            }

            *highest_slot = slot;
            true
        })
    }

    #[must_use]
    pub fn highest_slot(&self) -> Slot {
        *self.sender.borrow()
    }

    #[must_use]
    pub fn subscribe(&self) -> Receiver<Slot> {
        self.sender.subscribe()
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GateOutcome {
    AlreadyObserved,
    DeadlinePassed,
    BlockObserved,
    DeadlineReached,
    Cancelled,
    FeedClosed,
}

/// Delays attesting until a block for the slot arrives or a third of the slot has passed.
pub struct SlotGate {
    config: Arc<ChainConfig>,
    genesis_time: UnixSeconds,
    slot_rx: Receiver<Slot>,
    attest_timely: bool,
    metrics: Option<Arc<Metrics>>,
}

impl SlotGate {
    #[must_use]
    pub const fn new(
        config: Arc<ChainConfig>,
        genesis_time: UnixSeconds,
        slot_rx: Receiver<Slot>,
        attest_timely: bool,
        metrics: Option<Arc<Metrics>>,
    ) -> Self {
        Self {
            config,
            genesis_time,
            slot_rx,
            attest_timely,
            metrics,
        }
    }

    /// Fails only if the attestation deadline for `slot` cannot be represented.
    pub async fn wait_until_ready(
        &self,
        slot: Slot,
        cancel: &CancellationToken,
    ) -> Result<GateOutcome> {
        let mut slot_rx = self.slot_rx.clone();

        if *slot_rx.borrow_and_update() >= slot {
            return Ok(GateOutcome::AlreadyObserved);
        }

        let Some(remaining) =
            clock::remaining_until_attestation_deadline(&self.config, self.genesis_time, slot)?
        else {
            return Ok(GateOutcome::DeadlinePassed);
        };

        let _timer = self
            .metrics
            .as_ref()
            .map(|metrics| metrics.validator_attest_gate_wait_times.start_timer());

        let deadline = tokio::time::sleep(remaining);

        tokio::pin!(deadline);

        loop {
            tokio::select! {
                () = &mut deadline => return Ok(GateOutcome::DeadlineReached),
                () = cancel.cancelled() => return Ok(GateOutcome::Cancelled),
                result = slot_rx.changed() => {
                    if result.is_err() {
                        error!("slot feed closed while waiting to attest in slot {slot}");
                        return Ok(GateOutcome::FeedClosed);
                    }

                    let observed_slot = *slot_rx.borrow_and_update();

                    if self.attest_timely && observed_slot >= slot {
                        debug!("block observed in slot {observed_slot}, attesting in slot {slot}");
                        return Ok(GateOutcome::BlockObserved);
                    }
                }
            }
        }
    }
}
