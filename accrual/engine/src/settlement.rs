//! The settlement state machine.
//!
//! Given a borrower's account and the refreshed global index, a settlement
//! falls into one of three cases:
//!
//! - **No debt**, or the checkpoint already equals the index: nothing to do.
//!   Repeated calls at the same index must never charge twice.
//! - **Solvent accrual**: the borrower can pay all the interest owed. It is
//!   collected and the checkpoint moves to the index.
//! - **Insolvent accrual**: the borrower can pay only part of it. Everything
//!   available is collected, the unpaid rest is _capitalized_ into principal,
//!   and the checkpoint moves to the index _all the same_.
//!
//! The checkpoint must move in the insolvent case too, or the next settlement
//! bills the same interval again.
//!
//! ## On capitalization
//!
//! The shortfall is an amount owed _at the current index_. Principal, however,
//! is denominated at the borrower's checkpoint. The shortfall is converted
//! back to the old basis before being added:
//!
//! ```plain
//! capitalized = shortfall * old_checkpoint / index
//! ```
//!
//! Adding the raw shortfall would apply the interval's growth to it a second
//! time.
//!
//! ## On rounding
//!
//! We follow the same principle as for scaled debts: **round to the advantage
//! of the protocol**. Both the interest owed and the capitalized principal are
//! rounded _up_.

use {
    crate::{EngineError, EngineResult},
    accrual_math::{IsZero, MathResult, MultiplyRatio, Number, NumberConst, Udec128, Uint128},
    accrual_types::{BorrowerAccount, BorrowerId, Ledger, SettlementResult},
};

/// Convert an unpaid amount owed at `index` into principal denominated at
/// `checkpoint_index`. Rounded up.
pub fn capitalize(
    shortfall: Uint128,
    checkpoint_index: Udec128,
    index: Udec128,
) -> MathResult<Uint128> {
    shortfall.checked_multiply_ratio_ceil(checkpoint_index.numerator(), index.numerator())
}

/// Settle `account` at the already-refreshed `index`, collecting at most
/// `available_capacity` from the ledger.
///
/// Returns the new account state, which the caller must write back, together
/// with the result. On error, nothing has been collected and the caller must
/// write nothing.
pub fn settle_account<L>(
    ledger: &L,
    borrower: &BorrowerId,
    account: Option<&BorrowerAccount>,
    index: Udec128,
    available_capacity: Uint128,
) -> EngineResult<(Option<BorrowerAccount>, SettlementResult)>
where
    L: Ledger + ?Sized,
{
    let Some(account) = account.filter(|account| account.has_debt()) else {
        return Ok((None, SettlementResult::noop(borrower.clone(), None, index)));
    };

    // Computed before the no-op check so a checkpoint ahead of the index is
    // reported even when nothing would be charged.
    let interest_owed = account.interest_owed(index)?;

    if interest_owed.is_zero() {
        tracing::debug!(%borrower, %index, "Nothing to settle");
        return Ok((
            Some(*account),
            SettlementResult::noop(borrower.clone(), Some(account), index),
        ));
    }

    // Everything that could fail is checked against the worst case (nothing
    // collected) before the ledger is touched. Once money has moved, the
    // settlement must be able to complete.
    account
        .principal
        .checked_add(capitalize(interest_owed, account.checkpoint_index, index)?)?;

    let requested = interest_owed.min(available_capacity);
    let amount_charged = if requested.is_zero() {
        Uint128::ZERO
    } else {
        collect(ledger, borrower, requested)?
    };

    let shortfall = interest_owed.checked_sub(amount_charged)?;
    let capitalized_principal_delta = if shortfall.is_zero() {
        Uint128::ZERO
    } else {
        capitalize(shortfall, account.checkpoint_index, index)?
    };

    // The checkpoint advances whether or not the interest was paid in full.
    let new_account = BorrowerAccount {
        principal: account.principal.checked_add(capitalized_principal_delta)?,
        checkpoint_index: index,
    };

    debug_assert_eq!(
        new_account.interest_owed(index),
        Ok(Uint128::ZERO),
        "settled account still owes interest at the same index"
    );

    let result = SettlementResult {
        borrower: borrower.clone(),
        interest_owed,
        amount_charged,
        shortfall,
        capitalized_principal_delta,
        new_principal: new_account.principal,
        new_checkpoint_index: index,
    };

    if result.is_insolvent() {
        tracing::warn!(
            %borrower,
            owed = %interest_owed,
            charged = %amount_charged,
            shortfall = %shortfall,
            capitalized = %capitalized_principal_delta,
            new_principal = %new_account.principal,
            %index,
            "Insolvency penalty applied"
        );
    } else {
        tracing::info!(
            %borrower,
            owed = %interest_owed,
            %index,
            "Settled interest"
        );
    }

    Ok((Some(new_account), result))
}

/// Debit `requested` from the borrower, treating a short debit as a partial
/// payment rather than an error.
fn collect<L>(ledger: &L, borrower: &BorrowerId, requested: Uint128) -> EngineResult<Uint128>
where
    L: Ledger + ?Sized,
{
    let actual = ledger
        .debit(borrower, requested)
        .map_err(|err| EngineError::ledger(borrower, err))?;

    if actual > requested {
        return Err(EngineError::LedgerOverDebit {
            borrower: borrower.clone(),
            requested,
            actual,
        });
    }

    if actual < requested {
        tracing::warn!(
            %borrower,
            %requested,
            %actual,
            "Ledger debited less than requested; treating the difference as shortfall"
        );
    }

    Ok(actual)
}

// ----------------------------------- tests -----------------------------------
