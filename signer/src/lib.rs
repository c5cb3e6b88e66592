pub use crate::{
    types::{ForkInfo, SigningMessage, SigningRequest},
    web3signer::{Config as Web3SignerConfig, Web3Signer},
};

mod types;
mod web3signer {
    pub use api::{Config, Web3Signer};

    mod api;
    mod types;
}
