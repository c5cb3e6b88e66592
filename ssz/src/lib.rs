//! The subset of [SimpleSerialize] needed to hash and encode attestations.
//!
//! [SimpleSerialize]: https://github.com/ethereum/consensus-specs/blob/dev/ssz/simple-serialize.md

pub use ethereum_types::H256;

pub use crate::{
    bit_list::BitList,
    bit_vector::BitVector,
    error::BitError,
    hashing::{hash_256_256, ZERO_HASHES},
    merkle::{merkleize_bytes, merkleize_chunks, merkleize_fields, mix_in_length},
    porcelain::SszHash,
};

mod bit_list;
mod bit_vector;
mod consts;
mod error;
mod hashing;
mod merkle;
mod porcelain;
