use core::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{bail, Result};
use async_trait::async_trait;
use bls::SignatureBytes;
use helper_functions::misc;
use parking_lot::Mutex;
use signer::SigningRequest;
use types::{
    combined::Attestation,
    electra::containers::Attestation as ElectraAttestation,
    phase0::{
        containers::{Attestation as Phase0Attestation, AttestationData, Checkpoint},
        primitives::{CommitteeIndex, Epoch, Slot, H256},
    },
    preset::Preset,
};

use crate::traits::{NodeClient, RemoteSigner};

pub const SIGNATURE: SignatureBytes = SignatureBytes::repeat_byte(0x55);
pub const ATTESTATION_ROOT: H256 = H256::repeat_byte(0x77);

/// Attestation data that always votes for the epoch of the requested slot.
pub fn attestation_data<P: Preset>(slot: Slot, committee_index: CommitteeIndex) -> AttestationData {
    let target_epoch = misc::compute_epoch_at_slot::<P>(slot);

    AttestationData {
        slot,
        index: committee_index,
        beacon_block_root: H256::repeat_byte(0x11),
        source: Checkpoint {
            epoch: target_epoch.saturating_sub(1),
            root: H256::repeat_byte(0x22),
        },
        target: Checkpoint {
            epoch: target_epoch,
            root: H256::repeat_byte(0x33),
        },
    }
}

#[derive(Default)]
pub struct FakeNodeClient<P: Preset> {
    pub fail_data: bool,
    pub fail_submit: bool,
    /// Overrides the target epoch of every returned vote.
    pub target_epoch: Option<Epoch>,
    pub data_requests: AtomicUsize,
    pub submitted: Mutex<Vec<Attestation<P>>>,
}

impl<P: Preset> FakeNodeClient<P> {
    pub fn submitted(&self) -> Vec<Attestation<P>> {
        self.submitted.lock().clone()
    }

    pub fn data_requests(&self) -> usize {
        self.data_requests.load(Ordering::SeqCst)
    }

    fn submit(&self, attestation: Attestation<P>) -> Result<H256> {
        if self.fail_submit {
            bail!("beacon node rejected attestation");
        }

        self.submitted.lock().push(attestation);

        Ok(ATTESTATION_ROOT)
    }
}

#[async_trait]
impl<P: Preset> NodeClient<P> for FakeNodeClient<P> {
    async fn attestation_data(
        &self,
        slot: Slot,
        committee_index: CommitteeIndex,
    ) -> Result<AttestationData> {
        self.data_requests.fetch_add(1, Ordering::SeqCst);

        if self.fail_data {
            bail!("beacon node is syncing");
        }

        let mut data = attestation_data::<P>(slot, committee_index);

        if let Some(target_epoch) = self.target_epoch {
            data.target.epoch = target_epoch;
        }

        Ok(data)
    }

    async fn submit_attestation(&self, attestation: &Phase0Attestation<P>) -> Result<H256> {
        self.submit(attestation.clone().into())
    }

    async fn submit_electra_attestation(
        &self,
        attestation: &ElectraAttestation<P>,
    ) -> Result<H256> {
        self.submit(attestation.clone().into())
    }
}

#[derive(Default)]
pub struct FakeSigner {
    pub fail: bool,
    pub requests: Mutex<Vec<SigningRequest>>,
}

impl FakeSigner {
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl RemoteSigner for FakeSigner {
    async fn sign(&self, request: SigningRequest) -> Result<SignatureBytes> {
        self.requests.lock().push(request);

        if self.fail {
            bail!("Web3Signer is unreachable");
        }

        Ok(SIGNATURE)
    }
}
