use core::{cmp::Ordering, time::Duration};
use std::borrow::Cow;

use derivative::Derivative;
use enum_iterator::Sequence as _;
use hex_literal::hex;
use serde::Deserialize;
use serde_with::{formats::Flexible, As, DurationMilliSeconds};
use typenum::Unsigned as _;

use crate::{
    nonstandard::Phase,
    phase0::{
        consts::{FAR_FUTURE_EPOCH, GENESIS_EPOCH},
        containers::Fork,
        primitives::{Epoch, Slot, Version, H32},
    },
    preset::{Preset, PresetName},
};

/// Configuration variables customizable at runtime.
///
/// Field names follow the [configurations in `consensus-specs`](https://github.com/ethereum/consensus-specs/tree/dev/configs).
/// Unknown fields are ignored so that full network configuration files can be loaded as is.
#[derive(Clone, Debug, Derivative, Deserialize)]
#[derivative(Default)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Config {
    // Meta
    #[derivative(Default(value = "Cow::Borrowed(\"default\")"))]
    pub config_name: Cow<'static, str>,
    pub preset_base: PresetName,

    // Forking
    #[derivative(Default(value = "H32(hex!(\"00000000\"))"))]
    pub genesis_fork_version: Version,
    #[derivative(Default(value = "FAR_FUTURE_EPOCH"))]
    #[serde(with = "serde_utils::string_or_native")]
    pub altair_fork_epoch: Epoch,
    #[derivative(Default(value = "H32(hex!(\"01000000\"))"))]
    pub altair_fork_version: Version,
    #[derivative(Default(value = "FAR_FUTURE_EPOCH"))]
    #[serde(with = "serde_utils::string_or_native")]
    pub bellatrix_fork_epoch: Epoch,
    #[derivative(Default(value = "H32(hex!(\"02000000\"))"))]
    pub bellatrix_fork_version: Version,
    #[derivative(Default(value = "FAR_FUTURE_EPOCH"))]
    #[serde(with = "serde_utils::string_or_native")]
    pub capella_fork_epoch: Epoch,
    #[derivative(Default(value = "H32(hex!(\"03000000\"))"))]
    pub capella_fork_version: Version,
    #[derivative(Default(value = "FAR_FUTURE_EPOCH"))]
    #[serde(with = "serde_utils::string_or_native")]
    pub deneb_fork_epoch: Epoch,
    #[derivative(Default(value = "H32(hex!(\"04000000\"))"))]
    pub deneb_fork_version: Version,
    #[derivative(Default(value = "FAR_FUTURE_EPOCH"))]
    #[serde(with = "serde_utils::string_or_native")]
    pub electra_fork_epoch: Epoch,
    #[derivative(Default(value = "H32(hex!(\"05000000\"))"))]
    pub electra_fork_version: Version,
    #[derivative(Default(value = "FAR_FUTURE_EPOCH"))]
    #[serde(with = "serde_utils::string_or_native")]
    pub fulu_fork_epoch: Epoch,
    #[derivative(Default(value = "H32(hex!(\"06000000\"))"))]
    pub fulu_fork_version: Version,

    // Time parameters
    #[derivative(Default(value = "Duration::from_millis(12000)"))]
    #[serde(with = "As::<DurationMilliSeconds<String, Flexible>>")]
    pub slot_duration_ms: Duration,
}

impl Config {
    /// [Mainnet configuration](https://github.com/eth-clients/mainnet/blob/main/metadata/config.yaml).
    #[must_use]
    pub fn mainnet() -> Self {
        Self {
            config_name: Cow::Borrowed("mainnet"),
            altair_fork_epoch: 74240,
            bellatrix_fork_epoch: 144_896,
            capella_fork_epoch: 194_048,
            deneb_fork_epoch: 269_568,
            electra_fork_epoch: 364_032,
            ..Self::default()
        }
    }

    /// [Minimal configuration](https://github.com/ethereum/consensus-specs/blob/dev/configs/minimal.yaml).
    #[must_use]
    pub fn minimal() -> Self {
        Self {
            config_name: Cow::Borrowed("minimal"),
            preset_base: PresetName::Minimal,
            genesis_fork_version: H32(hex!("00000001")),
            altair_fork_version: H32(hex!("01000001")),
            bellatrix_fork_version: H32(hex!("02000001")),
            capella_fork_version: H32(hex!("03000001")),
            deneb_fork_version: H32(hex!("04000001")),
            electra_fork_version: H32(hex!("05000001")),
            fulu_fork_version: H32(hex!("06000001")),
            slot_duration_ms: Duration::from_millis(6000),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn start_and_stay_in(mut self, phase: Phase) -> Self {
        self.config_name = Cow::Owned(format!("{phase}-{}", self.config_name));
        self.upgrade_once(phase, GENESIS_EPOCH)
    }

    #[must_use]
    pub fn upgrade_once(mut self, post_phase: Phase, fork_epoch: Epoch) -> Self {
        for (phase, field) in self.fork_epochs_mut() {
            *field = match phase.cmp(&post_phase) {
                Ordering::Less => GENESIS_EPOCH,
                Ordering::Equal => fork_epoch,
                Ordering::Greater => FAR_FUTURE_EPOCH,
            };
        }

        self
    }

    #[must_use]
    pub const fn version(&self, phase: Phase) -> Version {
        match phase {
            Phase::Phase0 => self.genesis_fork_version,
            Phase::Altair => self.altair_fork_version,
            Phase::Bellatrix => self.bellatrix_fork_version,
            Phase::Capella => self.capella_fork_version,
            Phase::Deneb => self.deneb_fork_version,
            Phase::Electra => self.electra_fork_version,
            Phase::Fulu => self.fulu_fork_version,
        }
    }

    #[must_use]
    pub fn version_at_epoch(&self, epoch: Epoch) -> Version {
        self.version(self.phase_at_epoch(epoch))
    }

    #[must_use]
    pub fn phase_at_epoch(&self, epoch: Epoch) -> Phase {
        self.fork_epochs()
            .take_while(|(_, fork_epoch)| *fork_epoch <= epoch)
            .map(|(phase, _)| phase)
            .last()
            .unwrap_or(Phase::Phase0)
    }

    #[must_use]
    pub const fn fork_epoch(&self, phase: Phase) -> Epoch {
        match phase {
            Phase::Phase0 => GENESIS_EPOCH,
            Phase::Altair => self.altair_fork_epoch,
            Phase::Bellatrix => self.bellatrix_fork_epoch,
            Phase::Capella => self.capella_fork_epoch,
            Phase::Deneb => self.deneb_fork_epoch,
            Phase::Electra => self.electra_fork_epoch,
            Phase::Fulu => self.fulu_fork_epoch,
        }
    }

    /// The `Fork` a beacon state at `epoch` would contain.
    #[must_use]
    pub fn fork_at_epoch(&self, epoch: Epoch) -> Fork {
        let phase = self.phase_at_epoch(epoch);
        let previous_phase = phase.previous().unwrap_or(phase);

        Fork {
            previous_version: self.version(previous_phase),
            current_version: self.version(phase),
            epoch: self.fork_epoch(phase),
        }
    }

    #[must_use]
    pub fn phase_at_slot<P: Preset>(&self, slot: Slot) -> Phase {
        self.phase_at_epoch(slot / P::SlotsPerEpoch::U64)
    }

    fn fork_epochs(&self) -> impl Iterator<Item = (Phase, Epoch)> {
        // The type annotation keeps this in sync with `Phase`.
        let fields: [_; Phase::CARDINALITY - 1] = [
            self.altair_fork_epoch,
            self.bellatrix_fork_epoch,
            self.capella_fork_epoch,
            self.deneb_fork_epoch,
            self.electra_fork_epoch,
            self.fulu_fork_epoch,
        ];

        enum_iterator::all().skip(1).zip(fields)
    }

    fn fork_epochs_mut(&mut self) -> impl Iterator<Item = (Phase, &mut Epoch)> {
        let fields: [_; Phase::CARDINALITY - 1] = [
            &mut self.altair_fork_epoch,
            &mut self.bellatrix_fork_epoch,
            &mut self.capella_fork_epoch,
            &mut self.deneb_fork_epoch,
            &mut self.electra_fork_epoch,
            &mut self.fulu_fork_epoch,
        ];

        enum_iterator::all().skip(1).zip(fields)
    }
}
