use {
    accrual_math::{MathResult, Number, NumberConst, Udec128},
    serde::{Deserialize, Serialize},
};

/// Derives the per-epoch borrow rate from pool utilization.
///
/// Implementations must be pure: the same utilization always gives the same
/// rate.
pub trait RateModel: Send + Sync {
    fn derive_rate(&self, utilization: Udec128) -> MathResult<Udec128>;
}

/// A rate that ignores utilization.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedRateModel {
    pub rate_per_epoch: Udec128,
}

impl FixedRateModel {
    pub const fn new(rate_per_epoch: Udec128) -> Self {
        Self { rate_per_epoch }
    }
}

impl RateModel for FixedRateModel {
    fn derive_rate(&self, _utilization: Udec128) -> MathResult<Udec128> {
        Ok(self.rate_per_epoch)
    }
}

/// Dual slope interest rate model, consisting of two linear functions.
///
/// This is based on Aave's interest rate model. The first slope is applied when
/// the utilization is below the optimal utilization rate, and the second slope
/// is applied when the utilization is above the optimal utilization rate.
///
/// All rates are annual; [`RateModel::derive_rate`] divides them by
/// `epochs_per_year`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DualSlopeRateModel {
    /// The base interest rate. This is the interest rate that is applied
    /// when the utilization is 0%.
    pub base_rate: Udec128,
    /// The optimal utilization rate. This is the utilization rate after
    /// which the second slope is applied. Must be strictly between 0 and 1.
    pub optimal_utilization: Udec128,
    /// The slope of the first linear function.
    pub first_slope: Udec128,
    /// The slope of the second linear function.
    pub second_slope: Udec128,
    /// How many epochs make up a year.
    pub epochs_per_year: u64,
}

impl DualSlopeRateModel {
    pub fn annual_rate(&self, utilization: Udec128) -> MathResult<Udec128> {
        // Utilization can exceed 100% when interest outgrows the supply.
        let utilization = utilization.min(Udec128::ONE);

        if utilization <= self.optimal_utilization {
            let slope = self
                .first_slope
                .checked_mul(utilization)?
                .checked_div(self.optimal_utilization)?;
            return self.base_rate.checked_add(slope);
        }

        let excess = utilization
            .checked_sub(self.optimal_utilization)?
            .checked_div(Udec128::ONE.checked_sub(self.optimal_utilization)?)?;

        self.base_rate
            .checked_add(self.first_slope)?
            .checked_add(self.second_slope.checked_mul(excess)?)
    }
}

impl RateModel for DualSlopeRateModel {
    fn derive_rate(&self, utilization: Udec128) -> MathResult<Udec128> {
        self.annual_rate(utilization)?
            .checked_div(Udec128::new(self.epochs_per_year.into()))
    }
}

impl Default for DualSlopeRateModel {
    /// Default interest rate model used for testing: hourly epochs.
    fn default() -> Self {
        Self {
            base_rate: Udec128::new_percent(1),
            optimal_utilization: Udec128::new_percent(80),
            first_slope: Udec128::new_percent(4),
            second_slope: Udec128::new_percent(75),
            epochs_per_year: 24 * 365,
        }
    }
}

/// A rate model selected by configuration.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RateModelConfig {
    Fixed(FixedRateModel),
    DualSlope(DualSlopeRateModel),
}

impl RateModel for RateModelConfig {
    fn derive_rate(&self, utilization: Udec128) -> MathResult<Udec128> {
        match self {
            RateModelConfig::Fixed(model) => model.derive_rate(utilization),
            RateModelConfig::DualSlope(model) => model.derive_rate(utilization),
        }
    }
}

// ----------------------------------- tests -----------------------------------
