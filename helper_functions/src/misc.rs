use ssz::SszHash as _;
use typenum::Unsigned as _;
use types::{
    phase0::{
        containers::{ForkData, SigningData},
        primitives::{Domain, DomainType, Epoch, Slot, Version, H256},
    },
    preset::Preset,
};

#[must_use]
pub fn compute_epoch_at_slot<P: Preset>(slot: Slot) -> Epoch {
    slot / P::SlotsPerEpoch::U64
}

// > Return the 32-byte fork data root for the ``current_version`` and ``genesis_validators_root``.
// > This is used primarily in signature domains to avoid collisions across forks/chains.
#[must_use]
pub fn compute_fork_data_root(current_version: Version, genesis_validators_root: H256) -> H256 {
    ForkData {
        current_version,
        genesis_validators_root,
    }
    .hash_tree_root()
}

#[must_use]
pub fn compute_domain(
    domain_type: DomainType,
    fork_version: Version,
    genesis_validators_root: H256,
) -> Domain {
    let fork_data_root = compute_fork_data_root(fork_version, genesis_validators_root);
    let split_at = DomainType::len_bytes();

    let mut domain = Domain::zero();
    domain[..split_at].copy_from_slice(domain_type.as_bytes());
    domain[split_at..].copy_from_slice(&fork_data_root[..Domain::len_bytes() - split_at]);
    domain
}

#[must_use]
pub fn compute_signing_root(object: &(impl ssz::SszHash + ?Sized), domain: Domain) -> H256 {
    SigningData {
        object_root: object.hash_tree_root(),
        domain,
    }
    .hash_tree_root()
}
