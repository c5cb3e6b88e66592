use core::{
    fmt::{Debug, Formatter, Result as FmtResult},
    marker::PhantomData,
};

use bitvec::{boxed::BitBox, order::Lsb0, vec::BitVec};
use derivative::Derivative;
use derive_more::Deref;
use ethereum_types::H256;
use static_assertions::assert_eq_size;
use typenum::{Unsigned, U2048};

use crate::{
    consts::BITS_PER_CHUNK,
    error::BitError,
    merkle,
    porcelain::SszHash,
};

#[derive(Deref, Derivative)]
#[derivative(
    Clone(bound = ""),
    PartialEq(bound = ""),
    Eq(bound = ""),
    Default(bound = "")
)]
pub struct BitList<N> {
    // SSZ encoding relies on `Lsb0` ordering within each byte.
    #[deref]
    bits: BitBox<u8, Lsb0>,
    #[derivative(PartialEq = "ignore")]
    phantom: PhantomData<N>,
}

// The `U2048` is in reference to `MaxValidatorsPerCommittee`.
assert_eq_size!(BitList<U2048>, [usize; 2]);

// `bitvec` formats itself with brackets and commas.
impl<N> Debug for BitList<N> {
    fn fmt(&self, formatter: &mut Formatter) -> FmtResult {
        formatter.write_str("0b")?;

        for bit in self.iter().by_vals() {
            formatter.write_str(if bit { "1" } else { "0" })?;
        }

        Ok(())
    }
}

impl<N: Unsigned> SszHash for BitList<N> {
    fn hash_tree_root(&self) -> H256 {
        let chunk_limit = N::USIZE.div_ceil(BITS_PER_CHUNK);
        let root = merkle::merkleize_bytes(self.bits.as_raw_slice(), chunk_limit);
        merkle::mix_in_length(root, self.len())
    }
}

impl<N: Unsigned> BitList<N> {
    pub fn with_length(length: usize) -> Result<Self, BitError> {
        if length > N::USIZE {
            return Err(BitError::ListTooLong {
                maximum: N::USIZE,
                actual: length,
            });
        }

        Ok(Self {
            bits: BitVec::repeat(false, length).into_boxed_bitslice(),
            phantom: PhantomData,
        })
    }
}

impl<N> BitList<N> {
    pub fn set(&mut self, index: usize, value: bool) -> Result<(), BitError> {
        let length = self.len();

        if index >= length {
            return Err(BitError::IndexOutOfBounds { index, length });
        }

        self.bits.set(index, value);

        Ok(())
    }
}
