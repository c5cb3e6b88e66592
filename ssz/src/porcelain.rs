use ethereum_types::{H256, H32};

pub trait SszHash {
    fn hash_tree_root(&self) -> H256;
}

impl SszHash for u64 {
    fn hash_tree_root(&self) -> H256 {
        let mut chunk = H256::zero();
        chunk[..core::mem::size_of::<Self>()].copy_from_slice(&self.to_le_bytes());
        chunk
    }
}

impl SszHash for H32 {
    fn hash_tree_root(&self) -> H256 {
        let mut chunk = H256::zero();
        chunk[..Self::len_bytes()].copy_from_slice(self.as_bytes());
        chunk
    }
}

impl SszHash for H256 {
    fn hash_tree_root(&self) -> H256 {
        *self
    }
}
