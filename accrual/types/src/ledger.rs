use {
    crate::BorrowerId,
    accrual_math::{Udec128, Uint128},
};

/// The ledger that owns actual balances.
///
/// The settlement engine never moves tokens itself; it asks the ledger how much
/// a borrower can pay and then asks it to take that much. All calls are
/// synchronous and fallible. An error is fatal for the settlement attempt that
/// made it; it is never read as "zero capacity".
pub trait Ledger: Send + Sync {
    /// How much the borrower can currently pay toward interest.
    fn query_capacity(&self, borrower: &BorrowerId) -> anyhow::Result<Uint128>;

    /// Take up to `amount` from the borrower. Returns the amount actually
    /// taken, which may be less than requested if the borrower's balance
    /// changed since [`Ledger::query_capacity`].
    fn debit(&self, borrower: &BorrowerId, amount: Uint128) -> anyhow::Result<Uint128>;

    /// Pay out `amount` to the borrower, e.g. to disburse a loan.
    fn credit(&self, borrower: &BorrowerId, amount: Uint128) -> anyhow::Result<()>;

    /// Current pool utilization, fed to the rate model on every index refresh.
    fn utilization(&self) -> anyhow::Result<Udec128>;
}

impl<T> Ledger for &T
where
    T: Ledger + ?Sized,
{
    fn query_capacity(&self, borrower: &BorrowerId) -> anyhow::Result<Uint128> {
        (**self).query_capacity(borrower)
    }

    fn debit(&self, borrower: &BorrowerId, amount: Uint128) -> anyhow::Result<Uint128> {
        (**self).debit(borrower, amount)
    }

    fn credit(&self, borrower: &BorrowerId, amount: Uint128) -> anyhow::Result<()> {
        (**self).credit(borrower, amount)
    }

    fn utilization(&self) -> anyhow::Result<Udec128> {
        (**self).utilization()
    }
}
