use ssz::{SszHash, H256};

use crate::phase0::containers::{AttestationData, Checkpoint, ForkData, SigningData};

impl SszHash for AttestationData {
    fn hash_tree_root(&self) -> H256 {
        ssz::merkleize_fields(&[
            self.slot.hash_tree_root(),
            self.index.hash_tree_root(),
            self.beacon_block_root,
            self.source.hash_tree_root(),
            self.target.hash_tree_root(),
        ])
    }
}

impl SszHash for Checkpoint {
    fn hash_tree_root(&self) -> H256 {
        ssz::merkleize_fields(&[self.epoch.hash_tree_root(), self.root])
    }
}

impl SszHash for ForkData {
    fn hash_tree_root(&self) -> H256 {
        ssz::merkleize_fields(&[
            self.current_version.hash_tree_root(),
            self.genesis_validators_root,
        ])
    }
}

impl SszHash for SigningData {
    fn hash_tree_root(&self) -> H256 {
        ssz::merkleize_fields(&[self.object_root, self.domain])
    }
}
