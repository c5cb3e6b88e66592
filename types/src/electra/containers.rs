use bls::SignatureBytes;
use ssz::{BitList, BitVector};

use crate::{phase0::containers::AttestationData, preset::Preset};

#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct Attestation<P: Preset> {
    pub aggregation_bits: BitList<P::MaxAttestersPerSlot>,
    pub data: AttestationData,
    pub signature: SignatureBytes,
    pub committee_bits: BitVector<P::MaxCommitteesPerSlot>,
}
