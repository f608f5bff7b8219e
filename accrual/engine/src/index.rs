use {
    crate::{EngineError, EngineResult},
    accrual_math::Udec128,
    accrual_types::{Epoch, GlobalIndexState, RateModel},
    std::sync::Mutex,
};

/// The protocol-wide index, shared by every settlement.
///
/// Refreshes are serialized: of two concurrent refreshes for the same epoch,
/// the second finds the index already advanced and compounds nothing.
pub struct SharedIndex {
    state: Mutex<GlobalIndexState>,
}

impl SharedIndex {
    pub fn new(state: GlobalIndexState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn snapshot(&self) -> EngineResult<GlobalIndexState> {
        self.state
            .lock()
            .map(|state| *state)
            .map_err(|_| EngineError::MutexPoisoned)
    }

    /// Advance the index to `current_epoch`.
    ///
    /// `utilization` is only consulted when the index actually moves, so a
    /// refresh within the same epoch never reaches out to the ledger.
    pub fn refresh<F>(
        &self,
        current_epoch: Epoch,
        rate_model: &dyn RateModel,
        utilization: F,
    ) -> EngineResult<Udec128>
    where
        F: FnOnce() -> EngineResult<Udec128>,
    {
        let mut state = self.state.lock().map_err(|_| EngineError::MutexPoisoned)?;

        if current_epoch <= state.last_update_epoch {
            return Ok(state.index);
        }

        let previous = *state;
        let index = state.refresh(current_epoch, rate_model, utilization()?)?;

        tracing::debug!(
            from_epoch = %previous.last_update_epoch,
            to_epoch = %current_epoch,
            from_index = %previous.index,
            to_index = %index,
            rate_per_epoch = %state.rate_per_epoch,
            "Refreshed borrow index"
        );

        Ok(index)
    }

    /// The index at `current_epoch`, without mutating the shared state.
    pub fn projected(&self, current_epoch: Epoch) -> EngineResult<Udec128> {
        Ok(self.snapshot()?.projected_index(current_epoch)?)
    }
}

// ----------------------------------- tests -----------------------------------
