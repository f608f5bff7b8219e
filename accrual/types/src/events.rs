use {
    crate::BorrowerId,
    accrual_math::{Udec128, Uint128},
    serde::Serialize,
};

/// Events exposed to logging and alerting collaborators.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SettlementEvent {
    InterestSettled(InterestSettled),
    InsolvencyPenaltyApplied(InsolvencyPenaltyApplied),
    Borrowed(Borrowed),
    Repaid(Repaid),
}

/// Emitted on every settlement that charged interest.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct InterestSettled {
    pub borrower: BorrowerId,
    pub interest_owed: Uint128,
    pub amount_charged: Uint128,
    pub shortfall: Uint128,
    pub new_checkpoint_index: Udec128,
}

/// Emitted when a borrower couldn't cover the interest owed and the shortfall
/// was capitalized into principal.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct InsolvencyPenaltyApplied {
    pub borrower: BorrowerId,
    pub shortfall: Uint128,
    pub capitalized_principal_delta: Uint128,
    pub new_principal: Uint128,
    pub new_checkpoint_index: Udec128,
}

/// An event indicating a user has borrowed from the pool.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Borrowed {
    pub borrower: BorrowerId,
    pub amount: Uint128,
    pub new_principal: Uint128,
}

/// An event indicating a user has repaid principal to the pool.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Repaid {
    pub borrower: BorrowerId,
    pub repaid: Uint128,
    pub refund: Uint128,
    pub remaining_principal: Uint128,
}
