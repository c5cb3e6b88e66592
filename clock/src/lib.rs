//! Slot timing for the Ethereum Beacon Chain.
//!
//! # Implementation
//!
//! Slot ticks are implemented using [`Interval`]. The API of [`Interval`] uses [`Instant`]s, which
//! are opaque. There is no way to directly convert a Unix timestamp to an [`Instant`], so
//! [`slot_ticks`] samples both clocks at once and assumes they correspond to the same point in time.
//!
//! An [`Interval`] may produce items late, but the delays do not accumulate.
//!
//! [`Instant`]:  tokio::time::Instant
//! [`Interval`]: tokio::time::Interval

use core::time::Duration;
use std::{
    error::Error,
    time::{Instant, SystemTime, SystemTimeError},
};

use anyhow::Result;
use futures::stream::{Stream, StreamExt as _};
use thiserror::Error;
use tokio_stream::wrappers::IntervalStream;
use types::{
    config::Config,
    phase0::{
        consts::{GENESIS_SLOT, INTERVALS_PER_SLOT},
        primitives::{Slot, UnixSeconds},
    },
};

#[cfg(test)]
mod fake_time;

pub trait InstantLike: Sized {
    fn checked_add(self, duration: Duration) -> Option<Self>;
}

pub trait SystemTimeLike: Copy {
    type Error: Error + Send + Sync + 'static;

    const UNIX_EPOCH: Self;

    fn duration_since(self, earlier: Self) -> Result<Duration, Self::Error>;
}

impl InstantLike for Instant {
    fn checked_add(self, duration: Duration) -> Option<Self> {
        Self::checked_add(&self, duration)
    }
}

impl SystemTimeLike for SystemTime {
    type Error = SystemTimeError;

    const UNIX_EPOCH: Self = Self::UNIX_EPOCH;

    fn duration_since(self, earlier: Self) -> Result<Duration, Self::Error> {
        Self::duration_since(&self, earlier)
    }
}

#[derive(Debug, Error)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub enum ClockError {
    #[error("time of next slot overflowed")]
    NextInstantOverflow,
    #[error("ran out of slots")]
    RanOutOfSlots,
    #[error("start time of slot {slot} overflowed")]
    SlotTimeOverflow { slot: Slot },
}

/// Time at which `slot` starts, measured from the Unix epoch.
pub fn slot_start_time(config: &Config, genesis_time: UnixSeconds, slot: Slot) -> Result<Duration> {
    let slots_since_genesis = u32::try_from(slot - GENESIS_SLOT)
        .map_err(|_| ClockError::SlotTimeOverflow { slot })?;

    let time = slot_duration(config)
        .checked_mul(slots_since_genesis)
        .and_then(|genesis_to_slot| Duration::from_secs(genesis_time).checked_add(genesis_to_slot))
        .ok_or(ClockError::SlotTimeOverflow { slot })?;

    Ok(time)
}

/// Time by which attestations for `slot` should be published, measured from the Unix epoch.
///
/// This is one interval (a third of a slot) after the start of the slot.
pub fn attestation_deadline(
    config: &Config,
    genesis_time: UnixSeconds,
    slot: Slot,
) -> Result<Duration> {
    let slot_start_time = slot_start_time(config, genesis_time, slot)?;
    let interval = slot_duration(config) / INTERVALS_PER_SLOT.get();

    slot_start_time
        .checked_add(interval)
        .ok_or_else(|| ClockError::SlotTimeOverflow { slot }.into())
}

/// Returns [`None`] if the attestation deadline for `slot` has already passed.
pub fn remaining_until_attestation_deadline(
    config: &Config,
    genesis_time: UnixSeconds,
    slot: Slot,
) -> Result<Option<Duration>> {
    let deadline = attestation_deadline(config, genesis_time, slot)?;
    remaining_until(SystemTime::now(), deadline)
}

/// Yields the number of every slot as it starts.
///
/// If called exactly at the start of a slot, the first item is that slot.
pub fn slot_ticks(
    config: &Config,
    genesis_time: UnixSeconds,
) -> Result<impl Stream<Item = Result<Slot>>> {
    // We assume the `Instant` and `SystemTime` obtained here correspond to the same point in time.
    let now_instant = Instant::now();
    let now_system_time = SystemTime::now();

    let slot_duration = slot_duration(config);

    let (mut next_slot, next_instant) =
        next_slot_with_instant(slot_duration, now_instant, now_system_time, genesis_time)?;

    let interval = tokio::time::interval_at(next_instant.into(), slot_duration);

    Ok(IntervalStream::new(interval).map(move |_| {
        let current_slot = next_slot;
        next_slot = current_slot
            .checked_add(1)
            .ok_or(ClockError::RanOutOfSlots)?;
        Ok(current_slot)
    }))
}

fn remaining_until<S: SystemTimeLike>(now: S, target: Duration) -> Result<Option<Duration>> {
    let unix_epoch_to_now = now.duration_since(S::UNIX_EPOCH)?;

    Ok(target
        .checked_sub(unix_epoch_to_now)
        .filter(|remaining| !remaining.is_zero()))
}

fn next_slot_with_instant<I: InstantLike, S: SystemTimeLike>(
    slot_duration: Duration,
    now_instant: I,
    now_system_time: S,
    genesis_time: UnixSeconds,
) -> Result<(Slot, I)> {
    let unix_epoch_to_now = now_system_time.duration_since(S::UNIX_EPOCH)?;
    let unix_epoch_to_genesis = Duration::from_secs(genesis_time);

    // `Instant`s cannot be moved backwards on some platforms, so only `Duration`s are subtracted.
    let (next_slot, now_to_next_slot) = if unix_epoch_to_now <= unix_epoch_to_genesis {
        (GENESIS_SLOT, unix_epoch_to_genesis - unix_epoch_to_now)
    } else {
        let genesis_to_now = unix_epoch_to_now - unix_epoch_to_genesis;

        // `Duration` does not implement `Div<Duration>` or `Rem<Duration>`,
        // so we have to do arithmetic on nanoseconds.
        let nanos_per_slot = slot_duration.as_nanos();
        let slots_since_genesis = u64::try_from(genesis_to_now.as_nanos() / nanos_per_slot)?;
        let nanos_into_slot = u64::try_from(genesis_to_now.as_nanos() % nanos_per_slot)?;

        let current_slot = GENESIS_SLOT + slots_since_genesis;

        if nanos_into_slot == 0 {
            (current_slot, Duration::ZERO)
        } else {
            let next_slot = current_slot
                .checked_add(1)
                .ok_or(ClockError::RanOutOfSlots)?;

            (
                next_slot,
                slot_duration - Duration::from_nanos(nanos_into_slot),
            )
        }
    };

    let next_instant = now_instant
        .checked_add(now_to_next_slot)
        .ok_or(ClockError::NextInstantOverflow)?;

    Ok((next_slot, next_instant))
}

const fn slot_duration(config: &Config) -> Duration {
    config.slot_duration_ms
}
