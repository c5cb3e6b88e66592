use fixed_hash::construct_fixed_hash;
use impl_serde::impl_fixed_hash_serde;

construct_fixed_hash! {
    #[derive(derive_more::AsRef)]
    pub struct SignatureBytes(96);
}

impl_fixed_hash_serde!(SignatureBytes, 96);

