//! Byte representations of BLS public keys and signatures.
//!
//! Keys never leave the remote signer, so only the compressed encodings are needed here.

pub use crate::{
    public_key_bytes::{PublicKeyBytes, COMPRESSED_SIZE},
    signature_bytes::SignatureBytes,
};

mod public_key_bytes;
mod signature_bytes;
