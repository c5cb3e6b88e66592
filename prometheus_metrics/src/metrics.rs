use anyhow::Result;
use log::warn;
use prometheus::{histogram_opts, opts, Histogram, IntCounter, IntCounterVec, IntGaugeVec};
use types::phase0::primitives::Slot;

#[derive(Debug)]
pub struct Metrics {
    // Attestation duties
    pub validator_attest_times: Histogram,
    pub validator_attest_gate_wait_times: Histogram,
    pub validator_attest_slashing_protector_times: Histogram,
    pub validator_attestation_successes: IntCounter,
    pub validator_attestation_failures: IntCounterVec,

    // Per account
    pub validator_account_attestations: IntCounterVec,
    pub validator_account_last_attested_slot: IntGaugeVec,

    // Web3Signer
    pub web3signer_sign_times: Histogram,
}

impl Metrics {
    pub fn new() -> Result<Self> {
        Ok(Self {
            // Attestation duties
            validator_attest_times: Histogram::with_opts(histogram_opts!(
                "VALIDATOR_ATTEST_TIMES",
                "Attest duty times",
            ))?,

            validator_attest_gate_wait_times: Histogram::with_opts(histogram_opts!(
                "VALIDATOR_ATTEST_GATE_WAIT_TIMES",
                "Time spent waiting for a block or the attestation deadline",
            ))?,

            validator_attest_slashing_protector_times: Histogram::with_opts(histogram_opts!(
                "VALIDATOR_ATTEST_SLASHING_PROTECTOR_TIMES",
                "Slashing protection times when attesting",
            ))?,

            validator_attestation_successes: IntCounter::new(
                "VALIDATOR_ATTESTATION_SUCCESSES",
                "Number of attestations submitted and recorded",
            )?,

            validator_attestation_failures: IntCounterVec::new(
                opts!(
                    "VALIDATOR_ATTESTATION_FAILURES",
                    "Number of failed attestation duties by failure kind",
                ),
                &["kind"],
            )?,

            // Per account
            validator_account_attestations: IntCounterVec::new(
                opts!(
                    "VALIDATOR_ACCOUNT_ATTESTATIONS",
                    "Attestation duty outcomes per validator public key",
                ),
                &["public_key", "result"],
            )?,

            validator_account_last_attested_slot: IntGaugeVec::new(
                opts!(
                    "VALIDATOR_ACCOUNT_LAST_ATTESTED_SLOT",
                    "Slot of the last attestation submitted per validator public key",
                ),
                &["public_key"],
            )?,

            // Web3Signer
            web3signer_sign_times: Histogram::with_opts(histogram_opts!(
                "WEB3SIGNER_SIGN_TIMES",
                "Web3Signer sign times",
            ))?,
        })
    }

    pub fn register_with_default_metrics(&self) -> Result<()> {
        let default_registry = prometheus::default_registry();

        default_registry.register(Box::new(self.validator_attest_times.clone()))?;
        default_registry.register(Box::new(self.validator_attest_gate_wait_times.clone()))?;
        default_registry.register(Box::new(
            self.validator_attest_slashing_protector_times.clone(),
        ))?;
        default_registry.register(Box::new(self.validator_attestation_successes.clone()))?;
        default_registry.register(Box::new(self.validator_attestation_failures.clone()))?;
        default_registry.register(Box::new(self.validator_account_attestations.clone()))?;
        default_registry.register(Box::new(
            self.validator_account_last_attested_slot.clone(),
        ))?;
        default_registry.register(Box::new(self.web3signer_sign_times.clone()))?;

        Ok(())
    }

    // Attestation duties
    pub fn register_attestation_success(&self) {
        self.validator_attestation_successes.inc();
    }

    pub fn register_attestation_failure(&self, kind: &str) {
        match self
            .validator_attestation_failures
            .get_metric_with_label_values(&[kind])
        {
            Ok(counter) => counter.inc(),
            Err(error) => warn!("unable to register attestation failure for {kind}: {error:?}"),
        }
    }

    // Per account
    pub fn register_account_attestation(&self, public_key: &str, result: &str) {
        match self
            .validator_account_attestations
            .get_metric_with_label_values(&[public_key, result])
        {
            Ok(counter) => counter.inc(),
            Err(error) => {
                warn!("unable to register account attestation for {public_key}: {error:?}")
            }
        }
    }

    pub fn set_account_last_attested_slot(&self, public_key: &str, slot: Slot) {
        match self
            .validator_account_last_attested_slot
            .get_metric_with_label_values(&[public_key])
        {
            Ok(gauge) => gauge.set(slot as i64),
            Err(error) => {
                warn!("unable to set last attested slot for {public_key}: {error:?}")
            }
        }
    }

    #[cfg(test)]
    fn attestation_failures(&self, kind: &str) -> u64 {
        self.validator_attestation_failures
            .with_label_values(&[kind])
            .get()
    }
}
