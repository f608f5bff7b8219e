use {
    crate::{AccountError, AccountResult},
    accrual_math::{IsZero, MathError, MultiplyRatio, Number, NumberConst, Udec128, Uint128},
    borsh::{BorshDeserialize, BorshSerialize},
    serde::{Deserialize, Serialize},
    std::fmt::{self, Display},
};

/// Opaque identifier of a borrower, as assigned by the hosting ledger.
#[derive(
    Serialize,
    Deserialize,
    BorshSerialize,
    BorshDeserialize,
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
)]
#[serde(transparent)]
pub struct BorrowerId(String);

impl BorrowerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BorrowerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl Display for BorrowerId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A borrower's debt position.
///
/// `principal` is denominated at `checkpoint_index`: interest accrues on it as
/// `principal * (index - checkpoint_index) / checkpoint_index`. Every
/// settlement moves the checkpoint to the current index, so the same interval
/// is never billed twice.
#[derive(
    Serialize, BorshSerialize, BorshDeserialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct BorrowerAccount {
    pub principal: Uint128,
    pub checkpoint_index: Udec128,
}

impl BorrowerAccount {
    /// Open a position on first borrow, checkpointed at the current index.
    pub const fn open(principal: Uint128, index: Udec128) -> Self {
        Self {
            principal,
            checkpoint_index: index,
        }
    }

    pub fn has_debt(&self) -> bool {
        self.principal.is_non_zero()
    }

    pub fn is_settled_at(&self, index: Udec128) -> bool {
        self.checkpoint_index == index
    }

    /// Interest accrued between the checkpoint and `index`.
    ///
    /// Rounded _up_: the borrower owes the protocol, so the rounding error goes
    /// to the protocol.
    pub fn interest_owed(&self, index: Udec128) -> AccountResult<Uint128> {
        if !self.has_debt() {
            return Ok(Uint128::ZERO);
        }

        if self.checkpoint_index.is_zero() {
            return Err(MathError::division_by_zero(self.principal).into());
        }

        if self.checkpoint_index > index {
            return Err(AccountError::StaleIndex {
                checkpoint: self.checkpoint_index,
                index,
            });
        }

        if self.is_settled_at(index) {
            return Ok(Uint128::ZERO);
        }

        let growth = index
            .numerator()
            .checked_sub(self.checkpoint_index.numerator())?;

        Ok(self
            .principal
            .checked_multiply_ratio_ceil(growth, self.checkpoint_index.numerator())?)
    }

    /// Dry run of the settlement comparison: would settling at `index` with
    /// the given capacity leave a shortfall?
    pub fn is_insolvent(&self, index: Udec128, available_capacity: Uint128) -> AccountResult<bool> {
        Ok(available_capacity < self.interest_owed(index)?)
    }

    /// Total amount owed at `index`: principal plus unsettled interest.
    pub fn debt_at(&self, index: Udec128) -> AccountResult<Uint128> {
        Ok(self.principal.checked_add(self.interest_owed(index)?)?)
    }
}

// ----------------------------------- tests -----------------------------------
