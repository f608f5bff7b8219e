use {
    crate::{Epoch, GlobalIndexState, RateModelConfig},
    accrual_math::{NumberConst, Udec128},
    serde::{Deserialize, Serialize},
};

/// Startup configuration of a settlement engine.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Borrow index at `start_epoch`. At least 1.0.
    #[serde(default = "default_initial_index")]
    pub initial_index: Udec128,
    #[serde(default)]
    pub start_epoch: Epoch,
    /// Rate applied to the first interval, before the rate model has been
    /// consulted.
    #[serde(default)]
    pub initial_rate_per_epoch: Udec128,
    pub rate_model: RateModelConfig,
}

impl EngineConfig {
    pub fn initial_index_state(&self) -> GlobalIndexState {
        GlobalIndexState::new(
            self.initial_index,
            self.start_epoch,
            self.initial_rate_per_epoch,
        )
    }
}

fn default_initial_index() -> Udec128 {
    Udec128::ONE
}
