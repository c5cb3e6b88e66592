use core::{fmt::Debug, hash::Hash};

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use typenum::{NonZero, Prod, Unsigned, U2048, U32, U4, U64, U8};

#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Debug,
    AsRefStr,
    Display,
    EnumString,
    Deserialize,
    Serialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PresetName {
    #[default]
    Mainnet,
    Minimal,
}

/// Compile-time configuration variables.
///
/// Only the ones that shape attestations and slot arithmetic are included.
pub trait Preset: Copy + Eq + Ord + Hash + Default + Debug + Send + Sync + 'static {
    type SlotsPerEpoch: Unsigned + NonZero + Eq + Debug + Send + Sync;
    type MaxCommitteesPerSlot: Unsigned + NonZero + Eq + Debug + Send + Sync;
    type MaxValidatorsPerCommittee: Unsigned + NonZero + Eq + Debug + Send + Sync;
    type MaxAttestersPerSlot: Unsigned + NonZero + Eq + Debug + Send + Sync;

    const NAME: PresetName;
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug)]
pub struct Mainnet;

impl Preset for Mainnet {
    type SlotsPerEpoch = U32;
    type MaxCommitteesPerSlot = U64;
    type MaxValidatorsPerCommittee = U2048;
    type MaxAttestersPerSlot = Prod<U2048, U64>;

    const NAME: PresetName = PresetName::Mainnet;
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug)]
pub struct Minimal;

impl Preset for Minimal {
    type SlotsPerEpoch = U8;
    type MaxCommitteesPerSlot = U4;
    type MaxValidatorsPerCommittee = U2048;
    type MaxAttestersPerSlot = Prod<U2048, U4>;

    const NAME: PresetName = PresetName::Minimal;
}
