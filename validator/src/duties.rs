use std::{collections::HashMap, sync::Arc};

use arc_swap::ArcSwapOption;
use bls::PublicKeyBytes;
use types::phase0::primitives::{CommitteeIndex, Slot, ValidatorIndex};

use crate::error::Error;

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AttesterDuty {
    pub public_key: PublicKeyBytes,
    pub validator_index: ValidatorIndex,
    pub committee_index: CommitteeIndex,
    pub committee: Vec<ValidatorIndex>,
    pub slot: Slot,
}

impl AttesterDuty {
    /// Position of the validator in its committee.
    ///
    /// This is also the index of its bit in `aggregation_bits`.
    #[must_use]
    pub fn position_in_committee(&self) -> Option<usize> {
        self.committee
            .iter()
            .position(|index| *index == self.validator_index)
    }
}

/// Attester duties for the current epoch, keyed by public key.
///
/// Duties are replaced as a whole when they are refetched.
/// Readers never block writers or each other.
#[derive(Default)]
pub struct AttesterDuties {
    duties: ArcSwapOption<HashMap<PublicKeyBytes, AttesterDuty>>,
}

impl AttesterDuties {
    pub fn replace(&self, duties: impl IntoIterator<Item = AttesterDuty>) {
        let duties = duties
            .into_iter()
            .map(|duty| (duty.public_key, duty))
            .collect::<HashMap<_, _>>();

        self.duties.store(Some(Arc::new(duties)));
    }

    pub fn clear(&self) {
        self.duties.store(None);
    }

    pub fn duty(&self, public_key: PublicKeyBytes) -> Result<AttesterDuty, Error> {
        let guard = self.duties.load();

        let Some(duties) = guard.as_ref().filter(|duties| !duties.is_empty()) else {
            return Err(Error::NoDuty);
        };

        duties
            .get(&public_key)
            .cloned()
            .ok_or(Error::UnknownKey { public_key })
    }
}
