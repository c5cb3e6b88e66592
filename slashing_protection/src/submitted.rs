use std::collections::HashMap;

use bls::PublicKeyBytes;
use itertools::Itertools as _;
use log::warn;
use ssz::SszHash as _;
use thiserror::Error;
use types::phase0::{
    containers::AttestationData,
    primitives::{Epoch, H256},
};

pub const DEFAULT_SUBMITTED_HISTORY_CAPACITY: usize = 1 << 14;

#[derive(Debug, Error)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub enum SubmittedHistoryError {
    #[error("submitted attestation history is full (capacity: {capacity})")]
    Full { capacity: usize },
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SubmittedAttestationGroup {
    pub data: AttestationData,
    /// Submitters of `data` mapped to whether they submitted it as an aggregate.
    pub submitters: HashMap<PublicKeyBytes, bool>,
}

/// Attestations submitted to the network, grouped by the root of their data.
pub struct SubmittedAttestations {
    groups: HashMap<H256, SubmittedAttestationGroup>,
    len: usize,
    capacity: usize,
}

impl SubmittedAttestations {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            groups: HashMap::new(),
            len: 0,
            capacity,
        }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn save(
        &mut self,
        data: AttestationData,
        public_key: PublicKeyBytes,
        is_aggregate: bool,
    ) -> Result<(), SubmittedHistoryError> {
        let root = data.hash_tree_root();

        if let Some(saved_as_aggregate) = self
            .groups
            .get_mut(&root)
            .and_then(|group| group.submitters.get_mut(&public_key))
        {
            warn!(
                "attestation submitted again \
                 (public key: {public_key:?}, slot: {}, committee index: {})",
                data.slot, data.index,
            );

            *saved_as_aggregate |= is_aggregate;

            return Ok(());
        }

        if self.len >= self.capacity {
            return Err(SubmittedHistoryError::Full {
                capacity: self.capacity,
            });
        }

        self.groups
            .entry(root)
            .or_insert_with(|| SubmittedAttestationGroup {
                data,
                submitters: HashMap::new(),
            })
            .submitters
            .insert(public_key, is_aggregate);

        self.len += 1;

        Ok(())
    }

    pub fn drain(&mut self) -> Vec<SubmittedAttestationGroup> {
        self.len = 0;

        self.groups
            .drain()
            .map(|(_, group)| group)
            .sorted_by_key(|group| (group.data.slot, group.data.index))
            .collect()
    }

    pub fn prune(&mut self, prune_up_to_epoch: Epoch) {
        self.groups
            .retain(|_, group| group.data.target.epoch >= prune_up_to_epoch);

        self.len = self.groups.values().map(|group| group.submitters.len()).sum();
    }
}
