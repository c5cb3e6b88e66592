use anyhow::Result;
use async_trait::async_trait;
use bls::{PublicKeyBytes, SignatureBytes};
use futures::lock::Mutex;
use signer::{SigningRequest, Web3Signer};
use slashing_protection::{
    SlashingProtector, SlashingValidationOutcome, SubmittedAttestationGroup,
};
use types::{
    electra::containers::Attestation as ElectraAttestation,
    phase0::{
        containers::{
            Attestation as Phase0Attestation, AttestationData,
            IndexedAttestation as Phase0IndexedAttestation,
        },
        primitives::{CommitteeIndex, Slot, H256},
    },
    preset::Preset,
};

/// The parts of the beacon node API used to attest.
#[async_trait]
pub trait NodeClient<P: Preset>: Send + Sync {
    async fn attestation_data(
        &self,
        slot: Slot,
        committee_index: CommitteeIndex,
    ) -> Result<AttestationData>;

    /// Returns the root of the submitted attestation as reported by the node.
    async fn submit_attestation(&self, attestation: &Phase0Attestation<P>) -> Result<H256>;

    async fn submit_electra_attestation(&self, attestation: &ElectraAttestation<P>)
        -> Result<H256>;
}

#[async_trait]
pub trait RemoteSigner: Send + Sync {
    async fn sign(&self, request: SigningRequest) -> Result<SignatureBytes>;
}

#[async_trait]
impl RemoteSigner for Web3Signer {
    async fn sign(&self, request: SigningRequest) -> Result<SignatureBytes> {
        Self::sign(self, request).await
    }
}

/// Signed vote history consulted before an attestation leaves the process.
#[async_trait]
pub trait ProtectionStore: Send + Sync {
    /// Records the vote only if the outcome is [`SlashingValidationOutcome::Accept`].
    async fn check_and_record(
        &self,
        attestation: &Phase0IndexedAttestation,
        public_key: PublicKeyBytes,
        signing_root: H256,
    ) -> Result<SlashingValidationOutcome>;

    async fn save_submitted_attestation(
        &self,
        data: AttestationData,
        public_key: PublicKeyBytes,
        is_aggregate: bool,
    ) -> Result<()>;

    /// Removes and returns every submitted attestation saved so far.
    async fn drain_submitted_attestations(&self) -> Result<Vec<SubmittedAttestationGroup>>;
}

#[async_trait]
impl ProtectionStore for Mutex<SlashingProtector> {
    async fn check_and_record(
        &self,
        attestation: &Phase0IndexedAttestation,
        public_key: PublicKeyBytes,
        signing_root: H256,
    ) -> Result<SlashingValidationOutcome> {
        Ok(self
            .lock()
            .await
            .validate_and_store_own_attestation(attestation, public_key, signing_root))
    }

    async fn save_submitted_attestation(
        &self,
        data: AttestationData,
        public_key: PublicKeyBytes,
        is_aggregate: bool,
    ) -> Result<()> {
        self.lock()
            .await
            .save_submitted_attestation(data, public_key, is_aggregate)
            .map_err(Into::into)
    }

    async fn drain_submitted_attestations(&self) -> Result<Vec<SubmittedAttestationGroup>> {
        Ok(self.lock().await.drain_submitted_attestations())
    }
}
