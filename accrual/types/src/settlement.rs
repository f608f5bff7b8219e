use {
    crate::{
        BorrowerAccount, BorrowerId, Borrowed, InsolvencyPenaltyApplied, InterestSettled, Repaid,
        SettlementEvent,
    },
    accrual_math::{IsZero, NumberConst, Udec128, Uint128},
    serde::Serialize,
};

/// Outcome of one settlement call. Not persisted.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SettlementResult {
    pub borrower: BorrowerId,
    /// Interest accrued since the previous checkpoint.
    pub interest_owed: Uint128,
    /// Amount actually collected from the ledger. Never more than
    /// `interest_owed`.
    pub amount_charged: Uint128,
    /// `interest_owed - amount_charged`.
    pub shortfall: Uint128,
    /// The shortfall converted into principal units and added to principal.
    pub capitalized_principal_delta: Uint128,
    pub new_principal: Uint128,
    pub new_checkpoint_index: Udec128,
}

impl SettlementResult {
    /// A settlement that found nothing to charge and changed nothing.
    pub fn noop(borrower: BorrowerId, account: Option<&BorrowerAccount>, index: Udec128) -> Self {
        Self {
            borrower,
            interest_owed: Uint128::ZERO,
            amount_charged: Uint128::ZERO,
            shortfall: Uint128::ZERO,
            capitalized_principal_delta: Uint128::ZERO,
            new_principal: account.map(|a| a.principal).unwrap_or_default(),
            new_checkpoint_index: account.map(|a| a.checkpoint_index).unwrap_or(index),
        }
    }

    pub fn is_noop(&self) -> bool {
        self.interest_owed.is_zero()
    }

    /// Whether the borrower couldn't cover the interest in full. The engine
    /// only reports this; surfacing it to the borrower is up to the caller.
    pub fn is_insolvent(&self) -> bool {
        self.shortfall.is_non_zero()
    }

    /// Events for observability collaborators. Empty for a no-op.
    pub fn events(&self) -> Vec<SettlementEvent> {
        if self.is_noop() {
            return vec![];
        }

        let mut events = vec![SettlementEvent::InterestSettled(InterestSettled {
            borrower: self.borrower.clone(),
            interest_owed: self.interest_owed,
            amount_charged: self.amount_charged,
            shortfall: self.shortfall,
            new_checkpoint_index: self.new_checkpoint_index,
        })];

        if self.is_insolvent() {
            events.push(SettlementEvent::InsolvencyPenaltyApplied(
                InsolvencyPenaltyApplied {
                    borrower: self.borrower.clone(),
                    shortfall: self.shortfall,
                    capitalized_principal_delta: self.capitalized_principal_delta,
                    new_principal: self.new_principal,
                    new_checkpoint_index: self.new_checkpoint_index,
                },
            ));
        }

        events
    }
}

/// Outcome of a borrow: interest settled first, then principal increased.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct BorrowResult {
    pub settlement: SettlementResult,
    pub borrowed: Uint128,
    pub account: BorrowerAccount,
}

impl BorrowResult {
    pub fn events(&self) -> Vec<SettlementEvent> {
        let mut events = self.settlement.events();
        events.push(SettlementEvent::Borrowed(Borrowed {
            borrower: self.settlement.borrower.clone(),
            amount: self.borrowed,
            new_principal: self.account.principal,
        }));
        events
    }
}

/// Outcome of a repayment: interest settled first, then principal reduced.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RepayResult {
    pub settlement: SettlementResult,
    /// Amount of principal actually repaid.
    pub repaid: Uint128,
    /// Part of the offered amount that wasn't needed.
    pub refund: Uint128,
    /// `None` once the debt is fully repaid.
    pub account: Option<BorrowerAccount>,
}

impl RepayResult {
    pub fn events(&self) -> Vec<SettlementEvent> {
        let mut events = self.settlement.events();
        events.push(SettlementEvent::Repaid(Repaid {
            borrower: self.settlement.borrower.clone(),
            repaid: self.repaid,
            refund: self.refund,
            remaining_principal: self.account.map(|a| a.principal).unwrap_or_default(),
        }));
        events
    }
}

// ----------------------------------- tests -----------------------------------

#[cfg(test)]
mod tests {
    use {
        crate::{BorrowerAccount, BorrowerId, SettlementEvent, SettlementResult},
        accrual_math::{NumberConst, Udec128, Uint128},
    };

    #[test]
    fn noop_emits_nothing() {
        let account = BorrowerAccount::open(Uint128::new(100), Udec128::ONE);
        let result = SettlementResult::noop(BorrowerId::from("alice"), Some(&account), Udec128::ONE);
        assert!(result.is_noop());
        assert!(result.events().is_empty());
        assert_eq!(result.new_principal, Uint128::new(100));
    }

    #[test]
    fn shortfall_emits_penalty_event() {
        let result = SettlementResult {
            borrower: BorrowerId::from("alice"),
            interest_owed: Uint128::new(15),
            amount_charged: Uint128::new(10),
            shortfall: Uint128::new(5),
            capitalized_principal_delta: Uint128::new(5),
            new_principal: Uint128::new(105),
            new_checkpoint_index: Udec128::new_percent(115),
        };

        let events = result.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], SettlementEvent::InterestSettled(_)));
        assert!(matches!(
            &events[1],
            SettlementEvent::InsolvencyPenaltyApplied(e) if e.shortfall == Uint128::new(5)
        ));
    }
}
