use core::pin::pin;
use std::sync::Arc;

use anyhow::Result;
use bls::PublicKeyBytes;
use futures::{Stream, StreamExt as _};
use log::{debug, info, warn};
use prometheus_metrics::Metrics;
use slashing_protection::SubmittedAttestationGroup;
use tokio_util::sync::CancellationToken;
use types::{
    phase0::primitives::{Slot, UnixSeconds},
    preset::Preset,
};

use crate::{
    attestation_builder::{AttestationBuilder, SubmittedAttestation},
    attestation_stats::{AttestationStats, StatsSnapshot},
    duty_lock::{DutyLockKey, DutyLocks, DutyRole},
    error::Error,
    slot_gate::{GateOutcome, SlotFeed, SlotGate},
    validator_config::ValidatorConfig,
};

/// Runs attester duties one invocation at a time.
///
/// Invocations for different validators may run concurrently.
/// Invocations for the same validator are serialized.
pub struct AttestationPipeline<P: Preset> {
    validator_config: Arc<ValidatorConfig>,
    genesis_time: UnixSeconds,
    slot_feed: Arc<SlotFeed>,
    gate: SlotGate,
    locks: DutyLocks,
    builder: AttestationBuilder<P>,
    stats: AttestationStats,
    metrics: Option<Arc<Metrics>>,
}

impl<P: Preset> AttestationPipeline<P> {
    #[must_use]
    pub fn new(
        validator_config: Arc<ValidatorConfig>,
        genesis_time: UnixSeconds,
        builder: AttestationBuilder<P>,
        metrics: Option<Arc<Metrics>>,
    ) -> Self {
        let slot_feed = Arc::new(SlotFeed::default());

        let gate = SlotGate::new(
            Arc::clone(builder.chain_config()),
            genesis_time,
            slot_feed.subscribe(),
            validator_config.attest_timely,
            metrics.clone(),
        );

        let stats = AttestationStats::new(validator_config.stats_buffer_capacity);

        Self {
            validator_config,
            genesis_time,
            slot_feed,
            gate,
            locks: DutyLocks::default(),
            builder,
            stats,
            metrics,
        }
    }

    /// Called whenever a valid block is observed.
    pub fn record_observed_slot(&self, slot: Slot) {
        if self.slot_feed.record_observed_slot(slot) {
            debug!("observed block in new highest slot {slot}");
        }
    }

    #[must_use]
    pub fn slot_feed(&self) -> Arc<SlotFeed> {
        Arc::clone(&self.slot_feed)
    }

    #[must_use]
    pub const fn stats(&self) -> &AttestationStats {
        &self.stats
    }

    /// Flushes at the start of every slot until `cancel` fires.
    pub async fn flush_every_slot(&self, cancel: &CancellationToken) -> Result<()> {
        let ticks = clock::slot_ticks(self.builder.chain_config(), self.genesis_time)?;
        self.flush_on_ticks(ticks, cancel).await
    }

    /// Flushes once for every tick until `ticks` ends or `cancel` fires.
    pub async fn flush_on_ticks(
        &self,
        ticks: impl Stream<Item = Result<Slot>> + Send,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let mut ticks = pin!(ticks);

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                tick = ticks.next() => {
                    let Some(slot) = tick.transpose()? else {
                        break;
                    };

                    debug!("flushing attestation stats in slot {slot}");

                    self.flush().await;
                }
            }
        }

        Ok(())
    }

    /// Logs and resets stats, then logs and clears the submitted attestation history.
    ///
    /// The submitted history is bounded and is emptied on every flush.
    pub async fn flush(&self) -> StatsSnapshot {
        let snapshot = self.stats.flush();

        match self
            .builder
            .protection_store()
            .drain_submitted_attestations()
            .await
        {
            Ok(groups) => {
                for group in &groups {
                    log_submitted_attestations(group);
                }
            }
            Err(error) => warn!("could not drain submitted attestations: {error:?}"),
        }

        snapshot
    }

    /// Performs the attester duty of `public_key` in `slot`.
    ///
    /// Failures are logged and recorded in stats. They are not returned.
    pub async fn run(&self, cancel: &CancellationToken, slot: Slot, public_key: PublicKeyBytes) {
        let timer = self
            .metrics
            .as_ref()
            .map(|metrics| metrics.validator_attest_times.start_timer());

        match self.attest(cancel, slot, public_key).await {
            Ok(Some(submitted)) => {
                prometheus_metrics::stop_and_record(timer);

                debug!(
                    "validator {} attested in slot {slot} (attestation root: {:?})",
                    submitted.validator_index, submitted.attestation_root,
                );

                self.stats.record_success();

                if let Some(metrics) = self.metrics.as_ref() {
                    metrics.register_attestation_success();

                    if self.validator_config.emit_account_metrics {
                        let public_key = format!("{public_key:?}");
                        metrics.register_account_attestation(&public_key, "success");
                        metrics.set_account_last_attested_slot(&public_key, slot);
                    }
                }
            }
            Ok(None) => prometheus_metrics::stop_and_discard(timer),
            Err(error) => {
                prometheus_metrics::stop_and_discard(timer);

                log::log!(
                    error.log_level(),
                    "attestation duty failed (slot: {slot}, public key: {public_key:?}): {error}",
                );

                self.stats.record_failure(
                    &error,
                    format_args!("slot: {slot}, public key: {public_key:?}"),
                );

                if let Some(metrics) = self.metrics.as_ref() {
                    metrics.register_attestation_failure(error.kind());

                    if self.validator_config.emit_account_metrics {
                        metrics.register_account_attestation(&format!("{public_key:?}"), "failure");
                    }
                }
            }
        }
    }

    async fn attest(
        &self,
        cancel: &CancellationToken,
        slot: Slot,
        public_key: PublicKeyBytes,
    ) -> Result<Option<SubmittedAttestation<P>>, Error> {
        match self.gate.wait_until_ready(slot, cancel).await {
            Ok(GateOutcome::Cancelled) => return Err(Error::Cancelled),
            Ok(outcome) => debug!("ready to attest in slot {slot}: {outcome:?}"),
            Err(error) => {
                warn!("could not wait for attestation deadline of slot {slot}: {error:?}");
            }
        }

        let key = DutyLockKey::new(DutyRole::Attester, public_key.as_bytes())?;

        let _guard = tokio::select! {
            biased;

            () = cancel.cancelled() => return Err(Error::Cancelled),
            guard = self.locks.lock(key) => guard,
        };

        self.builder
            .build_and_submit(slot, public_key, cancel)
            .await
    }
}

fn log_submitted_attestations(group: &SubmittedAttestationGroup) {
    let SubmittedAttestationGroup { data, submitters } = group;

    let aggregates = submitters
        .values()
        .filter(|is_aggregate| **is_aggregate)
        .count();

    info!(
        "submitted attestations \
         (slot: {}, committee index: {}, beacon block root: {:?}, \
         source epoch: {}, target epoch: {}, submitters: {}, aggregates: {aggregates})",
        data.slot,
        data.index,
        data.beacon_block_root,
        data.source.epoch,
        data.target.epoch,
        submitters.len(),
    );
}

#[cfg(test)]
mod tests {
    use core::time::Duration;
    use std::time::{SystemTime, UNIX_EPOCH};

    use anyhow::anyhow;
    use futures::{future::join_all, lock::Mutex, stream};
    use log::Level;
    use slashing_protection::{AttestationProposal, SlashingProtector};
    use ssz::{BitList, BitVector};
    use types::{
        combined::Attestation,
        config::Config as ChainConfig,
        nonstandard::Phase,
        phase0::primitives::{ValidatorIndex, H256},
        preset::{Mainnet, Minimal},
    };

    use crate::{
        duties::{AttesterDuties, AttesterDuty},
        fakes::{FakeNodeClient, FakeSigner, SIGNATURE},
        traits::{NodeClient, ProtectionStore, RemoteSigner},
    };

    use super::*;

    const GENESIS_VALIDATORS_ROOT: H256 = H256::repeat_byte(0x44);

    struct Harness<P: Preset> {
        pipeline: AttestationPipeline<P>,
        duties: Arc<AttesterDuties>,
        node_client: Arc<FakeNodeClient<P>>,
        signer: Arc<FakeSigner>,
        protector: Arc<Mutex<SlashingProtector>>,
    }

    impl<P: Preset> Harness<P> {
        fn new(chain_config: ChainConfig, genesis_time: UnixSeconds) -> Self {
            Self::with_parts(
                chain_config,
                genesis_time,
                FakeNodeClient::default(),
                FakeSigner::default(),
                SlashingProtector::default(),
            )
        }

        fn with_parts(
            chain_config: ChainConfig,
            genesis_time: UnixSeconds,
            node_client: FakeNodeClient<P>,
            signer: FakeSigner,
            protector: SlashingProtector,
        ) -> Self {
            let duties = Arc::new(AttesterDuties::default());
            let node_client = Arc::new(node_client);
            let signer = Arc::new(signer);
            let protector = Arc::new(Mutex::new(protector));

            let dyn_node_client: Arc<dyn NodeClient<P>> =
                Arc::<FakeNodeClient<P>>::clone(&node_client);
            let dyn_signer: Arc<dyn RemoteSigner> = Arc::<FakeSigner>::clone(&signer);
            let dyn_protector: Arc<dyn ProtectionStore> =
                Arc::<Mutex<SlashingProtector>>::clone(&protector);

            let builder = AttestationBuilder::new(
                Arc::new(chain_config),
                GENESIS_VALIDATORS_ROOT,
                Arc::clone(&duties),
                dyn_node_client,
                dyn_signer,
                dyn_protector,
                None,
            );

            let pipeline = AttestationPipeline::new(Arc::default(), genesis_time, builder, None);

            Self {
                pipeline,
                duties,
                node_client,
                signer,
                protector,
            }
        }
    }

    fn duty(
        key_byte: u8,
        validator_index: ValidatorIndex,
        committee: Vec<ValidatorIndex>,
    ) -> AttesterDuty {
        AttesterDuty {
            public_key: PublicKeyBytes::repeat_byte(key_byte),
            validator_index,
            committee_index: 2,
            committee,
            slot: 100,
        }
    }

    fn now_in_seconds() -> UnixSeconds {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time should be after Unix epoch")
            .as_secs()
    }

    #[tokio::test]
    async fn phase0_attestation_sets_single_aggregation_bit() -> Result<()> {
        let harness = Harness::<Mainnet>::new(ChainConfig::mainnet(), 0);
        let public_key = PublicKeyBytes::repeat_byte(1);

        harness.duties.replace([duty(1, 3, vec![7, 3, 9])]);
        harness
            .pipeline
            .run(&CancellationToken::new(), 100, public_key)
            .await;

        let submitted = harness.node_client.submitted();

        let [Attestation::Phase0(attestation)] = submitted.as_slice() else {
            panic!("expected one phase0 attestation, found {submitted:?}");
        };

        let mut expected_bits = BitList::with_length(3)?;
        expected_bits.set(1, true)?;

        assert_eq!(attestation.aggregation_bits, expected_bits);
        assert_eq!(attestation.data.slot, 100);
        assert_eq!(attestation.signature, SIGNATURE);

        let requests = harness.signer.requests.lock().clone();
        let [request] = requests.as_slice() else {
            panic!("expected one signing request, found {requests:?}");
        };

        assert_eq!(request.public_key, public_key);
        assert!(request.fork_info.is_some());

        assert_eq!(harness.protector.lock().await.count_attestations(public_key), 1);
        assert_eq!(
            harness.protector.lock().await.drain_submitted_attestations().len(),
            1,
        );

        let stats = harness.pipeline.stats().flush();

        assert_eq!(stats.successful, 1);
        assert_eq!(stats.failed, 0);

        Ok(())
    }

    #[tokio::test]
    async fn electra_attestation_sets_committee_bit() -> Result<()> {
        let harness = Harness::<Minimal>::new(
            ChainConfig::minimal().start_and_stay_in(Phase::Electra),
            0,
        );

        harness.duties.replace([duty(1, 9, vec![7, 3, 9])]);
        harness
            .pipeline
            .run(&CancellationToken::new(), 100, PublicKeyBytes::repeat_byte(1))
            .await;

        let submitted = harness.node_client.submitted();

        let [Attestation::Electra(attestation)] = submitted.as_slice() else {
            panic!("expected one Electra attestation, found {submitted:?}");
        };

        let mut expected_aggregation_bits = BitList::with_length(3)?;
        expected_aggregation_bits.set(2, true)?;

        let mut expected_committee_bits = BitVector::default();
        expected_committee_bits.set(2, true)?;

        assert_eq!(attestation.aggregation_bits, expected_aggregation_bits);
        assert_eq!(attestation.committee_bits, expected_committee_bits);
        assert_eq!(harness.pipeline.stats().flush().successful, 1);

        Ok(())
    }

    #[tokio::test]
    async fn empty_committee_is_skipped_silently() {
        let harness = Harness::<Mainnet>::new(ChainConfig::mainnet(), 0);

        harness.duties.replace([duty(1, 3, vec![])]);
        harness
            .pipeline
            .run(&CancellationToken::new(), 100, PublicKeyBytes::repeat_byte(1))
            .await;

        assert_eq!(harness.node_client.data_requests(), 0);
        assert_eq!(harness.signer.request_count(), 0);
        assert!(harness.pipeline.stats().flush().is_empty());
    }

    #[tokio::test]
    async fn missing_duties_are_recorded_as_failures() {
        let harness = Harness::<Mainnet>::new(ChainConfig::mainnet(), 0);

        harness
            .pipeline
            .run(&CancellationToken::new(), 100, PublicKeyBytes::repeat_byte(1))
            .await;

        harness.duties.replace([duty(1, 3, vec![3])]);
        harness
            .pipeline
            .run(&CancellationToken::new(), 100, PublicKeyBytes::repeat_byte(2))
            .await;

        let stats = harness.pipeline.stats().flush();

        assert_eq!(stats.failed, 2);
        assert!(stats.error_messages[0].starts_with("no attester duties are known yet"));
        assert!(stats.error_messages[1].contains("is not in attester duties"));
        assert_eq!(harness.node_client.data_requests(), 0);
    }

    #[tokio::test]
    async fn conflicting_vote_is_never_submitted() -> Result<()> {
        testing_logger::setup();
        features::Feature::LogSlashableAttestationDetails.enable();

        let public_key = PublicKeyBytes::repeat_byte(1);
        let mut protector = SlashingProtector::default();

        let outcome = protector.validate_and_store_attestation_proposal(
            AttestationProposal {
                source_epoch: 2,
                target_epoch: 3,
                signing_root: H256::repeat_byte(0xee),
            },
            public_key,
        );

        assert!(!outcome.is_slashing_violation());

        let harness = Harness::<Mainnet>::with_parts(
            ChainConfig::mainnet(),
            0,
            FakeNodeClient::default(),
            FakeSigner::default(),
            protector,
        );

        harness.duties.replace([duty(1, 3, vec![7, 3, 9])]);
        harness
            .pipeline
            .run(&CancellationToken::new(), 100, public_key)
            .await;

        let stats = harness.pipeline.stats().flush();

        assert!(harness.node_client.submitted().is_empty());
        assert_eq!(stats.failed, 1);
        assert!(stats.error_messages[0].contains("double vote"));

        testing_logger::validate(|logs| {
            assert!(logs.iter().any(|log| {
                log.level == Level::Warn
                    && log
                        .body
                        .starts_with("[LogSlashableAttestationDetails] slashable attestation")
            }));
        });

        Ok(())
    }

    #[tokio::test]
    async fn repeated_identical_vote_is_submitted_again() {
        let harness = Harness::<Mainnet>::new(ChainConfig::mainnet(), 0);
        let public_key = PublicKeyBytes::repeat_byte(1);
        let cancel = CancellationToken::new();

        harness.duties.replace([duty(1, 3, vec![7, 3, 9])]);
        harness.pipeline.run(&cancel, 100, public_key).await;
        harness.pipeline.run(&cancel, 100, public_key).await;

        assert_eq!(harness.node_client.submitted().len(), 2);
        assert_eq!(harness.pipeline.stats().flush().successful, 2);
    }

    #[tokio::test]
    async fn external_failures_abort_before_submission() {
        let failing_node = Harness::<Mainnet>::with_parts(
            ChainConfig::mainnet(),
            0,
            FakeNodeClient {
                fail_data: true,
                ..FakeNodeClient::default()
            },
            FakeSigner::default(),
            SlashingProtector::default(),
        );

        let failing_signer = Harness::<Mainnet>::with_parts(
            ChainConfig::mainnet(),
            0,
            FakeNodeClient::default(),
            FakeSigner {
                fail: true,
                ..FakeSigner::default()
            },
            SlashingProtector::default(),
        );

        for (harness, expected_message) in [
            (&failing_node, "could not request attestation data"),
            (&failing_signer, "could not sign attestation"),
        ] {
            harness.duties.replace([duty(1, 3, vec![7, 3, 9])]);
            harness
                .pipeline
                .run(&CancellationToken::new(), 100, PublicKeyBytes::repeat_byte(1))
                .await;

            let stats = harness.pipeline.stats().flush();

            assert!(harness.node_client.submitted().is_empty());
            assert_eq!(stats.failed, 1);
            assert!(stats.error_messages[0].starts_with(expected_message));
        }

        assert_eq!(failing_node.signer.request_count(), 0);
    }

    #[tokio::test]
    async fn validator_outside_committee_is_rejected() {
        let harness = Harness::<Mainnet>::new(ChainConfig::mainnet(), 0);

        harness.duties.replace([duty(1, 5, vec![7, 3, 9])]);
        harness
            .pipeline
            .run(&CancellationToken::new(), 100, PublicKeyBytes::repeat_byte(1))
            .await;

        let stats = harness.pipeline.stats().flush();

        assert!(harness.node_client.submitted().is_empty());
        assert_eq!(stats.failed, 1);
        assert!(stats.error_messages[0].starts_with("validator 5 not found in committee [7, 3, 9]"));
    }

    #[tokio::test]
    async fn bookkeeping_failure_is_recorded_after_submission() {
        let harness = Harness::<Mainnet>::with_parts(
            ChainConfig::mainnet(),
            0,
            FakeNodeClient::default(),
            FakeSigner::default(),
            SlashingProtector::in_memory(256, 0),
        );

        harness.duties.replace([duty(1, 3, vec![7, 3, 9])]);
        harness
            .pipeline
            .run(&CancellationToken::new(), 100, PublicKeyBytes::repeat_byte(1))
            .await;

        let stats = harness.pipeline.stats().flush();

        assert_eq!(harness.node_client.submitted().len(), 1);
        assert_eq!(stats.successful, 0);
        assert_eq!(stats.failed, 1);
        assert!(stats.error_messages[0].starts_with("could not save submitted attestation"));
    }

    #[tokio::test]
    async fn cancelled_duty_submits_nothing() {
        let genesis_time = now_in_seconds();
        let harness = Harness::<Mainnet>::new(ChainConfig::mainnet(), genesis_time);
        let cancel = CancellationToken::new();

        harness.duties.replace([duty(1, 3, vec![7, 3, 9])]);

        let canceller = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel.cancel();
        };

        tokio::join!(
            harness.pipeline.run(&cancel, 1000, PublicKeyBytes::repeat_byte(1)),
            canceller,
        );

        let stats = harness.pipeline.stats().flush();

        assert_eq!(harness.node_client.data_requests(), 0);
        assert_eq!(stats.failed, 1);
        assert!(stats.error_messages[0].starts_with("attestation duty was cancelled"));
    }

    #[tokio::test]
    async fn already_observed_slot_skips_waiting() {
        let harness = Harness::<Mainnet>::new(ChainConfig::mainnet(), now_in_seconds());

        harness.duties.replace([duty(1, 3, vec![7, 3, 9])]);
        harness.pipeline.record_observed_slot(1000);

        tokio::time::timeout(
            Duration::from_secs(1),
            harness
                .pipeline
                .run(&CancellationToken::new(), 1000, PublicKeyBytes::repeat_byte(1)),
        )
        .await
        .expect("duty for an already observed slot should not wait");

        assert_eq!(harness.pipeline.slot_feed().highest_slot(), 1000);
        assert_eq!(harness.node_client.submitted().len(), 1);
    }

    #[tokio::test]
    async fn duties_for_distinct_validators_all_complete() {
        let harness = Harness::<Mainnet>::new(ChainConfig::mainnet(), 0);
        let cancel = CancellationToken::new();

        harness.duties.replace([
            duty(1, 7, vec![7, 3, 9]),
            duty(2, 3, vec![7, 3, 9]),
            duty(3, 9, vec![7, 3, 9]),
        ]);

        join_all((1..=3).map(|key_byte| {
            harness
                .pipeline
                .run(&cancel, 100, PublicKeyBytes::repeat_byte(key_byte))
        }))
        .await;

        assert_eq!(harness.node_client.submitted().len(), 3);
        assert_eq!(harness.pipeline.stats().flush().successful, 3);
    }

    #[tokio::test]
    async fn rejected_submission_is_recorded_as_failure() {
        let harness = Harness::<Mainnet>::with_parts(
            ChainConfig::mainnet(),
            0,
            FakeNodeClient {
                fail_submit: true,
                ..FakeNodeClient::default()
            },
            FakeSigner::default(),
            SlashingProtector::default(),
        );

        let public_key = PublicKeyBytes::repeat_byte(1);

        harness.duties.replace([duty(1, 3, vec![7, 3, 9])]);
        harness
            .pipeline
            .run(&CancellationToken::new(), 100, public_key)
            .await;

        let stats = harness.pipeline.stats().flush();

        assert!(harness.node_client.submitted().is_empty());
        assert_eq!(harness.signer.request_count(), 1);
        assert_eq!(stats.successful, 0);
        assert_eq!(stats.failed, 1);
        assert!(stats.error_messages[0]
            .starts_with("could not submit attestation to beacon node: beacon node rejected"));

        let mut protector = harness.protector.lock().await;

        assert_eq!(protector.count_attestations(public_key), 1);
        assert!(protector.drain_submitted_attestations().is_empty());
    }

    #[tokio::test]
    async fn committee_too_long_for_aggregation_bits_is_malformed() {
        let harness = Harness::<Mainnet>::new(ChainConfig::mainnet(), 0);

        harness.duties.replace([duty(1, 5, (0..2049).collect())]);
        harness
            .pipeline
            .run(&CancellationToken::new(), 100, PublicKeyBytes::repeat_byte(1))
            .await;

        let stats = harness.pipeline.stats().flush();

        assert!(harness.node_client.submitted().is_empty());
        assert_eq!(stats.failed, 1);
        assert!(stats.error_messages[0]
            .starts_with("attester duty does not fit in attestation bitfields"));
    }

    #[tokio::test]
    async fn electra_committee_index_past_committee_bits_is_malformed() {
        let harness = Harness::<Minimal>::new(
            ChainConfig::minimal().start_and_stay_in(Phase::Electra),
            0,
        );

        harness.duties.replace([AttesterDuty {
            committee_index: 4,
            ..duty(1, 9, vec![7, 3, 9])
        }]);

        harness
            .pipeline
            .run(&CancellationToken::new(), 100, PublicKeyBytes::repeat_byte(1))
            .await;

        let stats = harness.pipeline.stats().flush();

        assert!(harness.node_client.submitted().is_empty());
        assert_eq!(stats.failed, 1);
        assert!(stats.error_messages[0]
            .starts_with("attester duty does not fit in attestation bitfields"));
    }

    #[tokio::test]
    async fn attestations_change_shape_at_electra_fork() {
        // Slot 100 is in epoch 12 and slot 104 is in epoch 13 with 8 slots per epoch.
        let harness = Harness::<Minimal>::new(
            ChainConfig::minimal().upgrade_once(Phase::Electra, 13),
            0,
        );

        let public_key = PublicKeyBytes::repeat_byte(1);
        let cancel = CancellationToken::new();

        harness.duties.replace([duty(1, 3, vec![7, 3, 9])]);
        harness.pipeline.run(&cancel, 100, public_key).await;
        harness.pipeline.run(&cancel, 104, public_key).await;

        let submitted = harness.node_client.submitted();

        let [Attestation::Phase0(before), Attestation::Electra(after)] = submitted.as_slice()
        else {
            panic!("expected phase0 then Electra attestation, found {submitted:?}");
        };

        assert_eq!(before.data.slot, 100);
        assert_eq!(after.data.slot, 104);
        assert_eq!(after.committee_bits.iter_ones().collect::<Vec<_>>(), [2]);
        assert_eq!(harness.pipeline.stats().flush().successful, 2);
    }

    #[tokio::test]
    async fn vote_is_signed_with_domain_of_its_target_epoch() {
        let chain_config = ChainConfig::mainnet().upgrade_once(Phase::Electra, 4);

        let harness = Harness::<Mainnet>::with_parts(
            chain_config.clone(),
            0,
            FakeNodeClient {
                target_epoch: Some(4),
                ..FakeNodeClient::default()
            },
            FakeSigner::default(),
            SlashingProtector::default(),
        );

        harness.duties.replace([duty(1, 3, vec![7, 3, 9])]);
        harness
            .pipeline
            .run(&CancellationToken::new(), 100, PublicKeyBytes::repeat_byte(1))
            .await;

        let submitted = harness.node_client.submitted();

        // Slot 100 is in epoch 3. The fork only applies to the target epoch.
        let [Attestation::Phase0(attestation)] = submitted.as_slice() else {
            panic!("expected one phase0 attestation, found {submitted:?}");
        };

        assert_eq!(attestation.data.target.epoch, 4);

        let requests = harness.signer.requests.lock().clone();

        let (domain, _) = helper_functions::signing::attestation_signing_root::<Mainnet>(
            &chain_config,
            GENESIS_VALIDATORS_ROOT,
            &attestation.data,
        );

        assert_eq!(requests[0].domain, domain);
        assert_eq!(harness.pipeline.stats().flush().successful, 1);
    }

    #[tokio::test]
    async fn flush_keeps_small_submitted_history_from_filling_up() -> Result<()> {
        let harness = Harness::<Mainnet>::with_parts(
            ChainConfig::mainnet(),
            0,
            FakeNodeClient::default(),
            FakeSigner::default(),
            SlashingProtector::in_memory(256, 4),
        );

        let public_key = PublicKeyBytes::repeat_byte(1);
        let cancel = CancellationToken::new();

        harness.duties.replace([duty(1, 3, vec![7, 3, 9])]);

        for epoch in 3..16 {
            let slot = epoch * 32 + 4;

            harness.pipeline.run(&cancel, slot, public_key).await;

            harness
                .pipeline
                .flush_on_ticks(stream::iter([Ok(slot)]), &cancel)
                .await?;
        }

        assert_eq!(harness.node_client.submitted().len(), 13);
        assert!(harness.pipeline.stats().flush().is_empty());
        assert!(harness
            .protector
            .lock()
            .await
            .drain_submitted_attestations()
            .is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn flush_reports_outcomes_and_submitted_attestations() {
        testing_logger::setup();

        let harness = Harness::<Mainnet>::new(ChainConfig::mainnet(), 0);

        harness.duties.replace([duty(1, 3, vec![7, 3, 9])]);
        harness
            .pipeline
            .run(&CancellationToken::new(), 100, PublicKeyBytes::repeat_byte(1))
            .await;

        let snapshot = harness.pipeline.flush().await;

        assert_eq!(snapshot.successful, 1);

        testing_logger::validate(|logs| {
            assert!(logs.iter().any(|log| {
                log.level == Level::Info
                    && log.body.starts_with(
                        "submitted attestations (slot: 100, committee index: 2, \
                         beacon block root: 0x1111",
                    )
                    && log.body.ends_with("submitters: 1, aggregates: 0)")
            }));
        });
    }

    #[tokio::test]
    async fn flush_on_ticks_stops_on_cancel() -> Result<()> {
        let harness = Harness::<Mainnet>::new(ChainConfig::mainnet(), 0);
        let cancel = CancellationToken::new();

        cancel.cancel();

        harness
            .pipeline
            .flush_on_ticks(stream::pending(), &cancel)
            .await
    }

    #[tokio::test]
    async fn flush_on_ticks_propagates_clock_errors() {
        let harness = Harness::<Mainnet>::new(ChainConfig::mainnet(), 0);
        let ticks = stream::iter([Ok(1), Err(anyhow!("ran out of slots"))]);

        let result = harness
            .pipeline
            .flush_on_ticks(ticks, &CancellationToken::new())
            .await;

        assert!(result.is_err());
    }
}
