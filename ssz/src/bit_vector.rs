use core::{
    fmt::{Debug, Formatter, Result as FmtResult},
    marker::PhantomData,
};

use bitvec::{boxed::BitBox, order::Lsb0, vec::BitVec};
use derivative::Derivative;
use derive_more::Deref;
use ethereum_types::H256;
use typenum::Unsigned;

use crate::{consts::BITS_PER_CHUNK, error::BitError, merkle, porcelain::SszHash};

/// A bit vector whose length is always `N`.
#[derive(Deref, Derivative)]
#[derivative(Clone(bound = ""), PartialEq(bound = ""), Eq(bound = ""))]
pub struct BitVector<N> {
    #[deref]
    bits: BitBox<u8, Lsb0>,
    #[derivative(PartialEq = "ignore")]
    phantom: PhantomData<N>,
}

impl<N: Unsigned> Default for BitVector<N> {
    fn default() -> Self {
        Self {
            bits: BitVec::repeat(false, N::USIZE).into_boxed_bitslice(),
            phantom: PhantomData,
        }
    }
}

impl<N> Debug for BitVector<N> {
    fn fmt(&self, formatter: &mut Formatter) -> FmtResult {
        formatter.write_str("0b")?;

        for bit in self.iter().by_vals() {
            formatter.write_str(if bit { "1" } else { "0" })?;
        }

        Ok(())
    }
}

impl<N: Unsigned> SszHash for BitVector<N> {
    fn hash_tree_root(&self) -> H256 {
        merkle::merkleize_bytes(
            self.bits.as_raw_slice(),
            N::USIZE.div_ceil(BITS_PER_CHUNK),
        )
    }
}

impl<N> BitVector<N> {
    pub fn set(&mut self, index: usize, value: bool) -> Result<(), BitError> {
        let length = self.len();

        if index >= length {
            return Err(BitError::IndexOutOfBounds { index, length });
        }

        self.bits.set(index, value);

        Ok(())
    }
}
