use core::future::Future;
use std::sync::Arc;

use bls::{PublicKeyBytes, SignatureBytes};
use log::{debug, warn};
use prometheus_metrics::Metrics;
use signer::{ForkInfo, SigningMessage, SigningRequest};
use slashing_protection::SlashingValidationOutcome;
use ssz::{BitList, BitVector};
use tokio_util::sync::CancellationToken;
use typenum::Unsigned;
use types::{
    combined::Attestation,
    config::Config as ChainConfig,
    electra::containers::Attestation as ElectraAttestation,
    nonstandard::Phase,
    phase0::{
        containers::{
            Attestation as Phase0Attestation, AttestationData,
            IndexedAttestation as Phase0IndexedAttestation,
        },
        primitives::{Slot, ValidatorIndex, H256},
    },
    preset::Preset,
};

use crate::{
    duties::{AttesterDuties, AttesterDuty},
    error::Error,
    traits::{NodeClient, ProtectionStore, RemoteSigner},
};

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SubmittedAttestation<P: Preset> {
    pub validator_index: ValidatorIndex,
    pub attestation: Attestation<P>,
    pub attestation_root: H256,
}

/// Produces a signed attestation for one attester duty and submits it.
pub struct AttestationBuilder<P: Preset> {
    chain_config: Arc<ChainConfig>,
    genesis_validators_root: H256,
    duties: Arc<AttesterDuties>,
    node_client: Arc<dyn NodeClient<P>>,
    signer: Arc<dyn RemoteSigner>,
    protection_store: Arc<dyn ProtectionStore>,
    metrics: Option<Arc<Metrics>>,
}

impl<P: Preset> AttestationBuilder<P> {
    #[must_use]
    pub fn new(
        chain_config: Arc<ChainConfig>,
        genesis_validators_root: H256,
        duties: Arc<AttesterDuties>,
        node_client: Arc<dyn NodeClient<P>>,
        signer: Arc<dyn RemoteSigner>,
        protection_store: Arc<dyn ProtectionStore>,
        metrics: Option<Arc<Metrics>>,
    ) -> Self {
        Self {
            chain_config,
            genesis_validators_root,
            duties,
            node_client,
            signer,
            protection_store,
            metrics,
        }
    }

    #[must_use]
    pub const fn chain_config(&self) -> &Arc<ChainConfig> {
        &self.chain_config
    }

    #[must_use]
    pub const fn protection_store(&self) -> &Arc<dyn ProtectionStore> {
        &self.protection_store
    }

    /// Returns `Ok(None)` if the validator has no committee to attest with in `slot`.
    ///
    /// Nothing is submitted unless every step before submission succeeds.
    /// A vote rejected by slashing protection is never submitted.
    pub async fn build_and_submit(
        &self,
        slot: Slot,
        public_key: PublicKeyBytes,
        cancel: &CancellationToken,
    ) -> Result<Option<SubmittedAttestation<P>>, Error> {
        let duty = self.duties.duty(public_key)?;

        if duty.committee.is_empty() {
            debug!(
                "validator {} has an empty committee in slot {slot}; not attesting",
                duty.validator_index,
            );

            return Ok(None);
        }

        let data = or_cancelled(
            cancel,
            self.node_client
                .attestation_data(slot, duty.committee_index),
        )
        .await?
        .map_err(|error| Error::DataUnavailable { error })?;

        let phase = self.chain_config.phase_at_slot::<P>(slot);

        let (domain, signing_root) = helper_functions::signing::attestation_signing_root::<P>(
            &self.chain_config,
            self.genesis_validators_root,
            &data,
        );

        let request = SigningRequest {
            public_key,
            signing_root,
            domain,
            message: SigningMessage::from(data),
            fork_info: Some(ForkInfo::new(
                &self.chain_config,
                self.genesis_validators_root,
                data.target.epoch,
            )),
        };

        let signature = or_cancelled(cancel, self.signer.sign(request))
            .await?
            .map_err(|error| Error::SigningFailed { error })?;

        let position = duty
            .position_in_committee()
            .ok_or_else(|| Error::CommitteeMismatch {
                validator_index: duty.validator_index,
                committee: duty.committee.clone(),
            })?;

        // TODO: Check Electra attestations once `SlashingProtector` accepts Electra indexed
        //       attestations. Until then they are submitted unchecked.
        if !phase.has_committee_bits() {
            let indexed_attestation = Phase0IndexedAttestation {
                attesting_indices: vec![duty.validator_index],
                data,
                signature,
            };

            self.check_slashing_protection(&indexed_attestation, public_key, signing_root, cancel)
                .await?;
        }

        let attestation = build_attestation::<P>(&duty, position, data, signature, phase)?;

        let attestation_root = match &attestation {
            Attestation::Phase0(attestation) => {
                or_cancelled(cancel, self.node_client.submit_attestation(attestation)).await?
            }
            Attestation::Electra(attestation) => {
                or_cancelled(
                    cancel,
                    self.node_client.submit_electra_attestation(attestation),
                )
                .await?
            }
        }
        .map_err(|error| Error::SubmitFailed { error })?;

        // The attestation is already out. Bookkeeping is not cancelled past this point.
        self.protection_store
            .save_submitted_attestation(data, public_key, false)
            .await
            .map_err(|error| Error::BookkeepingFailed { error })?;

        features::log!(
            LogAttestationDetails,
            "attestation submitted \
             (validator index: {}, phase: {phase}, attestation root: {attestation_root:?}, \
             attestation: {attestation:?})",
            duty.validator_index,
        );

        Ok(Some(SubmittedAttestation {
            validator_index: duty.validator_index,
            attestation,
            attestation_root,
        }))
    }

    async fn check_slashing_protection(
        &self,
        attestation: &Phase0IndexedAttestation,
        public_key: PublicKeyBytes,
        signing_root: H256,
        cancel: &CancellationToken,
    ) -> Result<(), Error> {
        let timer = self
            .metrics
            .as_ref()
            .map(|metrics| metrics.validator_attest_slashing_protector_times.start_timer());

        let result = or_cancelled(
            cancel,
            self.protection_store
                .check_and_record(attestation, public_key, signing_root),
        )
        .await?;

        prometheus_metrics::stop_and_record(timer);

        // A store that cannot answer is treated the same as one that rejects the vote.
        match result.map_err(|error| Error::SlashableRejected { error })? {
            SlashingValidationOutcome::Accept => Ok(()),
            SlashingValidationOutcome::Ignore => {
                debug!(
                    "attestation for slot {} was already signed by {public_key:?}; \
                     submitting it again",
                    attestation.data.slot,
                );

                Ok(())
            }
            SlashingValidationOutcome::Reject(error) => {
                warn!("slashing protection rejected attestation signed by {public_key:?}");

                features::warn_if!(
                    LogSlashableAttestationDetails,
                    "slashable attestation (public key: {public_key:?}, \
                     signing root: {signing_root:?}, attestation: {attestation:?}, error: {error})",
                );

                Err(Error::SlashableRejected {
                    error: error.into(),
                })
            }
        }
    }
}

fn build_attestation<P: Preset>(
    duty: &AttesterDuty,
    position: usize,
    data: AttestationData,
    signature: SignatureBytes,
    phase: Phase,
) -> Result<Attestation<P>, Error> {
    if !phase.has_committee_bits() {
        return Ok(Attestation::Phase0(Phase0Attestation {
            aggregation_bits: single_bit_list(duty.committee.len(), position)?,
            data,
            signature,
        }));
    }

    let mut committee_bits = BitVector::default();

    committee_bits
        .set(
            usize::try_from(duty.committee_index).unwrap_or(usize::MAX),
            true,
        )
        .map_err(|error| Error::MalformedDuty { error })?;

    Ok(Attestation::Electra(ElectraAttestation {
        aggregation_bits: single_bit_list(duty.committee.len(), position)?,
        data,
        signature,
        committee_bits,
    }))
}

fn single_bit_list<N: Unsigned>(length: usize, position: usize) -> Result<BitList<N>, Error> {
    let mut bits = BitList::with_length(length).map_err(|error| Error::MalformedDuty { error })?;

    bits.set(position, true)
        .map_err(|error| Error::MalformedDuty { error })?;

    Ok(bits)
}

/// Resolves to [`Error::Cancelled`] as soon as `cancel` fires, even if `future` is also ready.
async fn or_cancelled<T>(
    cancel: &CancellationToken,
    future: impl Future<Output = T> + Send,
) -> Result<T, Error> {
    tokio::select! {
        biased;

        () = cancel.cancelled() => Err(Error::Cancelled),
        output = future => Ok(output),
    }
}
