use {
    accrual_math::{MathError, Uint128},
    accrual_types::{AccountError, BorrowerId, SettlementResult},
    thiserror::Error,
};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Math(#[from] MathError),

    #[error(transparent)]
    Account(#[from] AccountError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("ledger error! borrower: {borrower}, reason: {reason}")]
    Ledger { borrower: BorrowerId, reason: String },

    #[error("failed to query pool utilization: {reason}")]
    Utilization { reason: String },

    #[error("ledger debited more than requested! borrower: {borrower}, requested: {requested}, actual: {actual}")]
    LedgerOverDebit {
        borrower: BorrowerId,
        requested: Uint128,
        actual: Uint128,
    },

    #[error("principal would go negative! borrower: {borrower}, principal: {principal}, reduction: {reduction}")]
    NegativePrincipal {
        borrower: BorrowerId,
        principal: Uint128,
        reduction: Uint128,
    },

    /// A borrow or repay failed after its interest settlement was already
    /// collected and written back. The settlement stands.
    #[error("{source} (after settling interest for {})", .settlement.borrower)]
    AfterSettlement {
        settlement: Box<SettlementResult>,
        source: Box<EngineError>,
    },

    #[error("amount must be non-zero")]
    ZeroAmount,

    #[error("mutex poisoned")]
    MutexPoisoned,
}

impl EngineError {
    pub fn ledger(borrower: &BorrowerId, err: anyhow::Error) -> Self {
        Self::Ledger {
            borrower: borrower.clone(),
            reason: format!("{err:#}"),
        }
    }

    /// Attach a settlement that already went through. A no-op settlement
    /// changed nothing, so the error is returned as is.
    pub fn after_settlement(self, settlement: &SettlementResult) -> Self {
        if settlement.is_noop() {
            return self;
        }

        Self::AfterSettlement {
            settlement: Box::new(settlement.clone()),
            source: Box::new(self),
        }
    }

    /// The settlement that stands despite this error, if any.
    pub fn settlement(&self) -> Option<&SettlementResult> {
        match self {
            Self::AfterSettlement { settlement, .. } => Some(settlement),
            _ => None,
        }
    }

    /// Whether the error means a fixed-point result could not be represented.
    pub fn is_arithmetic_overflow(&self) -> bool {
        match self {
            Self::Math(err) | Self::Account(AccountError::Math(err)) => err.is_overflow(),
            Self::AfterSettlement { source, .. } => source.is_arithmetic_overflow(),
            _ => false,
        }
    }

    /// Whether the borrower's checkpoint was found ahead of the global index,
    /// which can only follow an earlier invariant violation.
    pub fn is_stale_index(&self) -> bool {
        matches!(self, Self::Account(AccountError::StaleIndex { .. }))
    }
}

pub type EngineResult<T> = core::result::Result<T, EngineError>;
