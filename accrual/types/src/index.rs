use {
    crate::{Epoch, RateModel},
    accrual_math::{IsZero, MathResult, Number, NumberConst, Udec128},
    borsh::{BorshDeserialize, BorshSerialize},
    serde::{Deserialize, Serialize},
};

/// Protocol-wide borrow index.
///
/// `index` is the cumulative growth factor since inception. It starts at (or
/// above) 1.0 and only ever moves up, by compounding `rate_per_epoch` over the
/// epochs elapsed since `last_update_epoch`.
#[derive(
    Serialize, Deserialize, BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct GlobalIndexState {
    pub index: Udec128,
    pub last_update_epoch: Epoch,
    pub rate_per_epoch: Udec128,
}

impl GlobalIndexState {
    pub const fn new(index: Udec128, last_update_epoch: Epoch, rate_per_epoch: Udec128) -> Self {
        Self {
            index,
            last_update_epoch,
            rate_per_epoch,
        }
    }

    /// An index of 1.0 at the given epoch.
    pub const fn genesis(epoch: Epoch, rate_per_epoch: Udec128) -> Self {
        Self::new(Udec128::ONE, epoch, rate_per_epoch)
    }

    /// The index as it would be at `current_epoch`, without mutating anything.
    ///
    /// Each compounding step rounds down, so the projected growth never
    /// exceeds the exact growth.
    pub fn projected_index(&self, current_epoch: Epoch) -> MathResult<Udec128> {
        let elapsed = current_epoch.elapsed_since(self.last_update_epoch);

        if elapsed == 0 || self.rate_per_epoch.is_zero() {
            return Ok(self.index);
        }

        let growth = Udec128::ONE
            .checked_add(self.rate_per_epoch)?
            .checked_pow(elapsed)?;

        self.index.checked_mul(growth)
    }

    /// Advance the index to `current_epoch`, then re-derive the rate that will
    /// apply to the next interval.
    ///
    /// A no-op if `current_epoch` isn't after the last update, so calling it
    /// twice for the same epoch compounds only once. Nothing is written unless
    /// every step succeeds.
    pub fn refresh(
        &mut self,
        current_epoch: Epoch,
        rate_model: &dyn RateModel,
        utilization: Udec128,
    ) -> MathResult<Udec128> {
        if current_epoch <= self.last_update_epoch {
            return Ok(self.index);
        }

        let index = self.projected_index(current_epoch)?;
        let rate_per_epoch = rate_model.derive_rate(utilization)?;

        debug_assert!(index >= self.index, "borrow index decreased");

        self.index = index;
        self.last_update_epoch = current_epoch;
        self.rate_per_epoch = rate_per_epoch;

        Ok(index)
    }
}

// ----------------------------------- tests -----------------------------------
