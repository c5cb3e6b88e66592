use anyhow::Error as AnyhowError;
use bls::PublicKeyBytes;
use itertools::Itertools as _;
use log::Level;
use ssz::BitError;
use strum::IntoStaticStr;
use thiserror::Error;
use types::phase0::primitives::ValidatorIndex;

/// Reasons an attestation duty can be abandoned.
///
/// None of these reach the caller of [`AttestationPipeline::run`].
/// They are logged, counted and then dropped.
///
/// [`AttestationPipeline::run`]: crate::AttestationPipeline::run
#[derive(Debug, Error, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Error {
    #[error("no attester duties are known yet")]
    NoDuty,
    #[error("public key {public_key:?} is not in attester duties")]
    UnknownKey { public_key: PublicKeyBytes },
    #[error("could not request attestation data to sign: {error:?}")]
    DataUnavailable { error: AnyhowError },
    #[error("could not compute domain and signing root for attestation: {error}")]
    DomainError { error: AnyhowError },
    #[error("could not sign attestation: {error:?}")]
    SigningFailed { error: AnyhowError },
    #[error(
        "validator {validator_index} not found in committee [{}]",
        .committee.iter().format(", "),
    )]
    CommitteeMismatch {
        validator_index: ValidatorIndex,
        committee: Vec<ValidatorIndex>,
    },
    #[error("attester duty does not fit in attestation bitfields: {error}")]
    MalformedDuty { error: BitError },
    #[error("failed attestation slashing protection check: {error}")]
    SlashableRejected { error: AnyhowError },
    #[error("could not submit attestation to beacon node: {error:?}")]
    SubmitFailed { error: AnyhowError },
    #[error("could not save submitted attestation: {error}")]
    BookkeepingFailed { error: AnyhowError },
    #[error("could not construct duty lock key from public key of length {length}")]
    LockKeyError { length: usize },
    #[error("attestation duty was cancelled")]
    Cancelled,
}

impl Error {
    /// Failures after a successful submission and cancellations are not safety problems.
    #[must_use]
    pub const fn log_level(&self) -> Level {
        match self {
            Self::BookkeepingFailed { .. } | Self::Cancelled => Level::Warn,
            _ => Level::Error,
        }
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.into()
    }
}
