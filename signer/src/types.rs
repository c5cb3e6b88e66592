use bls::PublicKeyBytes;
use derive_more::From;
use serde::Serialize;
use types::{
    config::Config,
    phase0::{
        containers::{AttestationData, Fork},
        primitives::{Domain, Epoch, H256},
    },
};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct ForkInfo {
    pub fork: Fork,
    pub genesis_validators_root: H256,
}

impl ForkInfo {
    #[must_use]
    pub fn new(config: &Config, genesis_validators_root: H256, epoch: Epoch) -> Self {
        Self {
            fork: config.fork_at_epoch(epoch),
            genesis_validators_root,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, From, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SigningMessage {
    Attestation(AttestationData),
}

/// Everything a remote signer needs to produce one signature.
///
/// `domain` is already folded into `signing_root`. It is carried along so that signers can check
/// what kind of object they are asked to sign without recomputing it.
#[derive(Clone, Copy, Debug)]
pub struct SigningRequest {
    pub public_key: PublicKeyBytes,
    pub signing_root: H256,
    pub domain: Domain,
    pub message: SigningMessage,
    pub fork_info: Option<ForkInfo>,
}
