use core::num::NonZeroU32;

use hex_literal::hex;
use nonzero_ext::nonzero;

use crate::phase0::primitives::{DomainType, Epoch, Slot, H32};

pub const DOMAIN_BEACON_ATTESTER: DomainType = H32(hex!("01000000"));
pub const FAR_FUTURE_EPOCH: Epoch = Epoch::MAX;
pub const GENESIS_EPOCH: Epoch = 0;
pub const GENESIS_SLOT: Slot = 0;

/// Attestations are due one interval into the slot.
pub const INTERVALS_PER_SLOT: NonZeroU32 = nonzero!(3_u32);
