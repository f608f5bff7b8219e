use {
    crate::{EngineError, EngineResult, SettlementEngine},
    accrual_math::{IsZero, NumberConst, Udec128},
    accrual_types::{EngineConfig, Ledger, RateModelConfig},
    config::{Config, Environment, File},
    std::path::Path,
};

/// Prefix of environment variables that override the config file, e.g.
/// `ACCRUAL__START_EPOCH=100` or `ACCRUAL__RATE_MODEL__BASE_RATE=0.02`.
pub const ENV_PREFIX: &str = "ACCRUAL";

/// Load an [`EngineConfig`] from a file, with overrides from the environment.
pub fn load_config<P>(path: P) -> EngineResult<EngineConfig>
where
    P: AsRef<Path>,
{
    let env_override = Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__");

    let config: EngineConfig = Config::builder()
        .add_source(File::from(path.as_ref()))
        .add_source(env_override)
        .build()?
        .try_deserialize()?;

    validate_config(&config)?;

    tracing::info!(
        path = %path.as_ref().display(),
        initial_index = %config.initial_index,
        start_epoch = %config.start_epoch,
        "Loaded engine config"
    );

    Ok(config)
}

pub fn validate_config(config: &EngineConfig) -> EngineResult<()> {
    if config.initial_index < Udec128::ONE {
        return Err(EngineError::InvalidConfig(format!(
            "initial index must be at least 1, got {}",
            config.initial_index
        )));
    }

    if let RateModelConfig::DualSlope(model) = &config.rate_model {
        if model.optimal_utilization.is_zero() || model.optimal_utilization >= Udec128::ONE {
            return Err(EngineError::InvalidConfig(format!(
                "optimal utilization must be between 0 and 1, got {}",
                model.optimal_utilization
            )));
        }

        if model.epochs_per_year == 0 {
            return Err(EngineError::InvalidConfig(
                "epochs per year must be non-zero".to_string(),
            ));
        }
    }

    Ok(())
}

impl<L> SettlementEngine<L, RateModelConfig>
where
    L: Ledger,
{
    pub fn from_config(config: &EngineConfig, ledger: L) -> EngineResult<Self> {
        validate_config(config)?;

        Ok(Self::new(
            ledger,
            config.rate_model,
            config.initial_index_state(),
        ))
    }
}

// ----------------------------------- tests -----------------------------------

#[cfg(test)]
mod tests {
    use {
        super::*,
        accrual_types::{DualSlopeRateModel, Epoch, FixedRateModel},
        assertor::*,
        std::str::FromStr,
    };

    #[test]
    fn test_load_config_file() {
        std::env::set_var("ACCRUAL__START_EPOCH", "42");

        let config = load_config("fixtures/engine.toml").expect("Failed to parse file");

        assert_that!(config.start_epoch).is_equal_to(Epoch::new(42));
        assert_that!(config.initial_index).is_equal_to(Udec128::ONE);
        assert_that!(config.rate_model)
            .is_equal_to(RateModelConfig::DualSlope(DualSlopeRateModel::default()));
    }

    #[test]
    fn test_load_invalid_config_file() {
        let err = load_config("fixtures/engine_invalid.toml").unwrap_err();

        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }

    #[test]
    fn test_load_missing_config_file() {
        let err = load_config("fixtures/nope.toml").unwrap_err();

        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn test_validate_dual_slope() {
        let mut config = EngineConfig {
            initial_index: Udec128::ONE,
            start_epoch: Epoch::ZERO,
            initial_rate_per_epoch: Udec128::ZERO,
            rate_model: RateModelConfig::DualSlope(DualSlopeRateModel {
                optimal_utilization: Udec128::ONE,
                ..Default::default()
            }),
        };
        assert_that!(validate_config(&config).is_err()).is_true();

        config.rate_model = RateModelConfig::DualSlope(DualSlopeRateModel {
            epochs_per_year: 0,
            ..Default::default()
        });
        assert_that!(validate_config(&config).is_err()).is_true();

        config.rate_model = RateModelConfig::Fixed(FixedRateModel::new(
            Udec128::from_str("0.15").unwrap(),
        ));
        assert_that!(validate_config(&config).is_ok()).is_true();
    }
}
