use ethereum_types::H256;

use crate::{
    consts::BYTES_PER_CHUNK,
    hashing::{hash_256_256, ZERO_HASHES},
};

/// Merkleizes `chunks` into a tree with room for `limit` leaves.
///
/// Missing leaves are filled in from [`ZERO_HASHES`].
/// Passing more than `limit` chunks produces the root of a taller tree.
#[must_use]
pub fn merkleize_chunks(chunks: impl IntoIterator<Item = H256>, limit: usize) -> H256 {
    let mut layer = chunks.into_iter().collect::<Vec<_>>();
    let depth = depth_for(limit.max(layer.len()));

    if layer.is_empty() {
        return ZERO_HASHES[depth];
    }

    for zero_hash in ZERO_HASHES.iter().take(depth) {
        if layer.len() % 2 == 1 {
            layer.push(*zero_hash);
        }

        layer = layer
            .chunks_exact(2)
            .map(|pair| hash_256_256(pair[0], pair[1]))
            .collect();
    }

    layer[0]
}

#[must_use]
pub fn merkleize_bytes(bytes: impl AsRef<[u8]>, limit_in_chunks: usize) -> H256 {
    let chunks = bytes.as_ref().chunks(BYTES_PER_CHUNK).map(|partial_chunk| {
        let mut chunk = H256::zero();
        chunk[..partial_chunk.len()].copy_from_slice(partial_chunk);
        chunk
    });

    merkleize_chunks(chunks, limit_in_chunks)
}

/// Computes the root of a container from the roots of its fields.
#[must_use]
pub fn merkleize_fields(field_roots: &[H256]) -> H256 {
    merkleize_chunks(field_roots.iter().copied(), field_roots.len())
}

/// [`mix_in_length`](https://github.com/ethereum/consensus-specs/blob/dev/ssz/simple-serialize.md#merkleization)
#[must_use]
pub fn mix_in_length(root: H256, length: usize) -> H256 {
    let mut hash_of_length = H256::zero();
    hash_of_length[..core::mem::size_of::<u64>()].copy_from_slice(&(length as u64).to_le_bytes());
    hash_256_256(root, hash_of_length)
}

const fn depth_for(leaves: usize) -> usize {
    leaves.next_power_of_two().trailing_zeros() as usize
}
