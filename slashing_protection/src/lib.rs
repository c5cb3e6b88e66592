use core::mem;
use std::collections::{BTreeMap, HashMap};

use bls::PublicKeyBytes;
use log::{debug, info};
use thiserror::Error;
use types::phase0::{
    containers::{AttestationData, IndexedAttestation},
    primitives::{Epoch, H256},
};

pub use crate::submitted::{
    SubmittedAttestationGroup, SubmittedAttestations, SubmittedHistoryError,
    DEFAULT_SUBMITTED_HISTORY_CAPACITY,
};

mod submitted;

pub const DEFAULT_SLASHING_PROTECTION_HISTORY_LIMIT: u64 = 256;

#[derive(Debug, Error)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub enum SlashingValidationError {
    #[error(
        "double vote \
         (attestation: {attestation:?}, matching attestation: {matching_attestation:?})"
    )]
    DoubleVote {
        attestation: AttestationProposal,
        matching_attestation: AttestationProposal,
    },
    #[error(
        "attestation surrounds a previous one \
         (attestation: {attestation:?}, surrounded attestation: {surrounded_attestation:?})"
    )]
    SurroundingVote {
        attestation: AttestationProposal,
        surrounded_attestation: AttestationProposal,
    },
    #[error(
        "attestation is surrounded by a previous one \
         (attestation: {attestation:?}, surrounding attestation: {surrounding_attestation:?})"
    )]
    SurroundedVote {
        attestation: AttestationProposal,
        surrounding_attestation: AttestationProposal,
    },
    #[error(
        "attestation source precedes signed history \
         (attestation: {attestation:?}, min source epoch: {min_source_epoch})"
    )]
    PastSource {
        attestation: AttestationProposal,
        min_source_epoch: Epoch,
    },
    #[error(
        "attestation target precedes signed history \
         (attestation: {attestation:?}, min target epoch: {min_target_epoch})"
    )]
    PastTarget {
        attestation: AttestationProposal,
        min_target_epoch: Epoch,
    },
}

#[derive(Debug)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub enum SlashingValidationOutcome {
    Accept,
    /// The same vote was already signed. Signing it again is not slashable.
    Ignore,
    Reject(SlashingValidationError),
}

impl SlashingValidationOutcome {
    #[must_use]
    pub const fn is_slashing_violation(&self) -> bool {
        match self {
            Self::Accept | Self::Ignore => false,
            Self::Reject(_) => true,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct AttestationProposal {
    pub source_epoch: Epoch,
    pub target_epoch: Epoch,
    pub signing_root: H256,
}

impl AttestationProposal {
    const fn surrounds(self, other: Self) -> bool {
        self.source_epoch < other.source_epoch && self.target_epoch > other.target_epoch
    }
}

/// Highest source and target epochs among the pruned votes of one public key.
///
/// A vote with a source at or above `source_epoch` and a target above `target_epoch` can neither
/// conflict with nor surround any vote that was pruned.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
struct Watermark {
    source_epoch: Epoch,
    target_epoch: Epoch,
}

impl Watermark {
    fn raise(&mut self, pruned: &BTreeMap<Epoch, AttestationProposal>) {
        for proposal in pruned.values() {
            self.source_epoch = self.source_epoch.max(proposal.source_epoch);
            self.target_epoch = self.target_epoch.max(proposal.target_epoch);
        }
    }
}

/// Signed attestation history kept in memory.
///
/// Votes are indexed by target epoch per public key. Each target can only hold one vote because
/// a second vote with a different signing root would be a double vote.
/// Pruned votes leave a watermark behind so that nothing below them can be signed again.
pub struct SlashingProtector {
    attestations: HashMap<PublicKeyBytes, BTreeMap<Epoch, AttestationProposal>>,
    watermarks: HashMap<PublicKeyBytes, Watermark>,
    history_limit: u64,
    pruned_up_to_epoch: Epoch,
    submitted: SubmittedAttestations,
}

impl Default for SlashingProtector {
    fn default() -> Self {
        Self::in_memory(
            DEFAULT_SLASHING_PROTECTION_HISTORY_LIMIT,
            DEFAULT_SUBMITTED_HISTORY_CAPACITY,
        )
    }
}

impl SlashingProtector {
    #[must_use]
    pub fn in_memory(history_limit: u64, submitted_capacity: usize) -> Self {
        Self {
            attestations: HashMap::new(),
            watermarks: HashMap::new(),
            history_limit,
            pruned_up_to_epoch: 0,
            submitted: SubmittedAttestations::new(submitted_capacity),
        }
    }

    /// Checks `attestation` against the history of `public_key` and records it if it is safe.
    ///
    /// Only the source and target checkpoints of `attestation` take part in the check.
    /// `signing_root` identifies the exact vote so that signing it again can be told apart from
    /// a double vote.
    pub fn validate_and_store_own_attestation(
        &mut self,
        attestation: &IndexedAttestation,
        public_key: PublicKeyBytes,
        signing_root: H256,
    ) -> SlashingValidationOutcome {
        let proposal = AttestationProposal {
            source_epoch: attestation.data.source.epoch,
            target_epoch: attestation.data.target.epoch,
            signing_root,
        };

        self.prune(proposal.target_epoch);
        self.validate_and_store_attestation_proposal(proposal, public_key)
    }

    pub fn validate_and_store_attestation_proposal(
        &mut self,
        attestation: AttestationProposal,
        public_key: PublicKeyBytes,
    ) -> SlashingValidationOutcome {
        let watermark = self.watermarks.get(&public_key).copied();
        let history = self.attestations.entry(public_key).or_default();

        let outcome = Self::validate_attestation_proposal(attestation, history, watermark);

        if let Some(outcome) = outcome {
            return outcome;
        }

        history.insert(attestation.target_epoch, attestation);

        SlashingValidationOutcome::Accept
    }

    fn validate_attestation_proposal(
        attestation: AttestationProposal,
        history: &BTreeMap<Epoch, AttestationProposal>,
        watermark: Option<Watermark>,
    ) -> Option<SlashingValidationOutcome> {
        if let Some(matching_attestation) = history.get(&attestation.target_epoch).copied() {
            if matching_attestation == attestation {
                return Some(SlashingValidationOutcome::Ignore);
            }

            let error = SlashingValidationError::DoubleVote {
                attestation,
                matching_attestation,
            };

            return Some(SlashingValidationOutcome::Reject(error));
        }

        let error = if let Some(surrounded_attestation) = history
            .values()
            .copied()
            .find(|recorded| attestation.surrounds(*recorded))
        {
            SlashingValidationError::SurroundingVote {
                attestation,
                surrounded_attestation,
            }
        } else if let Some(surrounding_attestation) = history
            .values()
            .copied()
            .find(|recorded| recorded.surrounds(attestation))
        {
            SlashingValidationError::SurroundedVote {
                attestation,
                surrounding_attestation,
            }
        } else if let Some(min_source_epoch) = history
            .values()
            .map(|recorded| recorded.source_epoch)
            .min()
            .into_iter()
            .chain(watermark.map(|watermark| watermark.source_epoch))
            .max()
            .filter(|min_source_epoch| attestation.source_epoch < *min_source_epoch)
        {
            SlashingValidationError::PastSource {
                attestation,
                min_source_epoch,
            }
        } else if let Some(min_target_epoch) = history
            .keys()
            .next()
            .copied()
            .into_iter()
            .chain(watermark.map(|watermark| watermark.target_epoch.saturating_add(1)))
            .max()
            .filter(|min_target_epoch| attestation.target_epoch < *min_target_epoch)
        {
            SlashingValidationError::PastTarget {
                attestation,
                min_target_epoch,
            }
        } else {
            return None;
        };

        Some(SlashingValidationOutcome::Reject(error))
    }

    /// Removes votes with targets more than `history_limit` epochs before `current_epoch`.
    ///
    /// The removed votes raise the watermark of their public key. Does nothing until `current_epoch` moves past the epoch last pruned at.
    pub fn prune(&mut self, current_epoch: Epoch) {
        let Some(prune_up_to_epoch) = current_epoch.checked_sub(self.history_limit) else {
            return;
        };

        if prune_up_to_epoch <= self.pruned_up_to_epoch {
            return;
        }

        debug!("pruning slashing protection history up to epoch {prune_up_to_epoch}");

        for (public_key, history) in &mut self.attestations {
            let retained = history.split_off(&prune_up_to_epoch);
            let pruned = mem::replace(history, retained);

            if !pruned.is_empty() {
                self.watermarks.entry(*public_key).or_default().raise(&pruned);
            }
        }

        self.attestations.retain(|_, history| !history.is_empty());
        self.submitted.prune(prune_up_to_epoch);
        self.pruned_up_to_epoch = prune_up_to_epoch;

        info!("slashing protection history pruned up to epoch {prune_up_to_epoch}");
    }

    pub fn save_submitted_attestation(
        &mut self,
        data: AttestationData,
        public_key: PublicKeyBytes,
        is_aggregate: bool,
    ) -> Result<(), SubmittedHistoryError> {
        self.submitted.save(data, public_key, is_aggregate)
    }

    pub fn drain_submitted_attestations(&mut self) -> Vec<SubmittedAttestationGroup> {
        self.submitted.drain()
    }

    #[must_use]
    pub fn count_attestations(&self, public_key: PublicKeyBytes) -> usize {
        self.attestations.get(&public_key).map_or(0, BTreeMap::len)
    }
}
