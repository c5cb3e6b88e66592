use derive_more::From;

use crate::{
    electra::containers::Attestation as ElectraAttestation,
    phase0::containers::Attestation as Phase0Attestation, preset::Preset,
};

#[derive(Clone, PartialEq, Eq, Debug, From)]
pub enum Attestation<P: Preset> {
    Phase0(Phase0Attestation<P>),
    Electra(ElectraAttestation<P>),
}
