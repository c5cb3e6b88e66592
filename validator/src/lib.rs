pub use crate::{
    attestation_builder::{AttestationBuilder, SubmittedAttestation},
    attestation_pipeline::AttestationPipeline,
    attestation_stats::{AttestationStats, StatsSnapshot, DEFAULT_STATS_BUFFER_CAPACITY},
    duties::{AttesterDuties, AttesterDuty},
    duty_lock::{DutyLockKey, DutyLocks, DutyRole},
    error::Error,
    slot_gate::{GateOutcome, SlotFeed, SlotGate},
    traits::{NodeClient, ProtectionStore, RemoteSigner},
    validator_config::ValidatorConfig,
};

mod attestation_builder;
mod attestation_pipeline;
mod attestation_stats;
mod duties;
mod duty_lock;
mod error;
mod slot_gate;
mod traits;
mod validator_config;

#[cfg(test)]
mod fakes;
