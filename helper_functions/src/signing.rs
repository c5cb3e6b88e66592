use ssz::SszHash;
use types::{
    config::Config,
    phase0::{
        consts::DOMAIN_BEACON_ATTESTER,
        containers::AttestationData,
        primitives::{Domain, DomainType, Epoch, H256},
    },
    preset::Preset,
};

use crate::misc;

/// Objects signed with the fork version in effect at [`SignForSingleFork::epoch`].
pub trait SignForSingleFork<P: Preset>: SszHash {
    const DOMAIN_TYPE: DomainType;

    fn epoch(&self) -> Epoch;

    fn domain(&self, config: &Config, genesis_validators_root: H256) -> Domain {
        let fork_version = config.version_at_epoch(self.epoch());
        misc::compute_domain(Self::DOMAIN_TYPE, fork_version, genesis_validators_root)
    }

    fn signing_root(&self, config: &Config, genesis_validators_root: H256) -> H256 {
        misc::compute_signing_root(self, self.domain(config, genesis_validators_root))
    }
}

/// <https://github.com/ethereum/consensus-specs/blob/dev/specs/phase0/validator.md#aggregate-signature>
impl<P: Preset> SignForSingleFork<P> for AttestationData {
    const DOMAIN_TYPE: DomainType = DOMAIN_BEACON_ATTESTER;

    fn epoch(&self) -> Epoch {
        self.target.epoch
    }
}

/// Computes the attester domain and signing root for `data`.
///
/// The domain is taken at the target epoch of `data` regardless of its slot.
#[must_use]
pub fn attestation_signing_root<P: Preset>(
    config: &Config,
    genesis_validators_root: H256,
    data: &AttestationData,
) -> (Domain, H256) {
    let domain = SignForSingleFork::<P>::domain(data, config, genesis_validators_root);
    let signing_root = misc::compute_signing_root(data, domain);

    (domain, signing_root)
}
