use derivative::Derivative;
use features::Feature;

use crate::attestation_stats::DEFAULT_STATS_BUFFER_CAPACITY;

#[derive(Clone, Debug, Derivative)]
#[derivative(Default)]
pub struct ValidatorConfig {
    /// Attest as soon as a block for the slot is observed instead of at the deadline.
    #[derivative(Default(value = "Feature::AttestTimely.is_enabled()"))]
    pub attest_timely: bool,
    /// Emit metrics labeled with the public key of each validator.
    pub emit_account_metrics: bool,
    #[derivative(Default(value = "DEFAULT_STATS_BUFFER_CAPACITY"))]
    pub stats_buffer_capacity: usize,
}
