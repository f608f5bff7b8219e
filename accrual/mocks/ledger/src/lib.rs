//! An in-memory [`Ledger`] for tests and for hosts that want to embed the
//! settlement engine without a real token ledger.
//!
//! NOTE: This mock doesn't implement any gatekeeping. _Any_ borrower can be
//! funded with _any_ amount. Apparently, this is not intended for using in
//! production.

use {
    accrual_math::{Number, NumberConst, Udec128, Uint128},
    accrual_types::{BorrowerId, Ledger},
    anyhow::{bail, ensure},
    std::{
        collections::BTreeMap,
        sync::{Mutex, MutexGuard},
    },
};

#[derive(Default)]
pub struct MockLedger {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    balances: BTreeMap<BorrowerId, Uint128>,
    /// Total taken from borrowers via `debit`.
    collected: Uint128,
    /// Total paid out to borrowers via `credit`.
    disbursed: Uint128,
    utilization: Udec128,
    /// If set, `debit` takes at most this much per call, simulating a balance
    /// that shrank between the capacity query and the debit.
    debit_cap: Option<Uint128>,
    /// If set, only this many more debits or credits go through before every
    /// further one fails.
    transfers_left: Option<usize>,
    failing: bool,
}

impl State {
    fn take_transfer(&mut self) -> anyhow::Result<()> {
        ensure!(!self.failing, "ledger unavailable");

        if let Some(left) = &mut self.transfers_left {
            ensure!(*left > 0, "ledger unavailable");
            *left -= 1;
        }

        Ok(())
    }
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balance(self, borrower: impl Into<BorrowerId>, amount: impl Into<Uint128>) -> Self {
        self.lock().balances.insert(borrower.into(), amount.into());
        self
    }

    pub fn set_balance(&self, borrower: impl Into<BorrowerId>, amount: impl Into<Uint128>) {
        self.lock().balances.insert(borrower.into(), amount.into());
    }

    pub fn balance_of(&self, borrower: &BorrowerId) -> Uint128 {
        self.lock().balances.get(borrower).copied().unwrap_or_default()
    }

    pub fn collected(&self) -> Uint128 {
        self.lock().collected
    }

    pub fn disbursed(&self) -> Uint128 {
        self.lock().disbursed
    }

    pub fn set_utilization(&self, utilization: Udec128) {
        self.lock().utilization = utilization;
    }

    pub fn set_debit_cap(&self, cap: Option<Uint128>) {
        self.lock().debit_cap = cap;
    }

    /// Make every subsequent call fail, as if the ledger were unreachable or
    /// the engine lacked authorization.
    pub fn set_failing(&self, failing: bool) {
        self.lock().failing = failing;
    }

    /// Let `count` more debits or credits through, then fail the rest. Queries
    /// keep working.
    pub fn fail_after_transfers(&self, count: usize) {
        self.lock().transfers_left = Some(count);
    }

    // Every mutation above is a single assignment, so a panic elsewhere can't
    // leave the state half-written.
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Ledger for MockLedger {
    fn query_capacity(&self, borrower: &BorrowerId) -> anyhow::Result<Uint128> {
        let state = self.lock();
        ensure!(!state.failing, "ledger unavailable");

        Ok(state.balances.get(borrower).copied().unwrap_or_default())
    }

    fn debit(&self, borrower: &BorrowerId, amount: Uint128) -> anyhow::Result<Uint128> {
        let mut state = self.lock();
        state.take_transfer()?;

        let cap = state.debit_cap.unwrap_or(Uint128::MAX);
        let Some(balance) = state.balances.get_mut(borrower) else {
            bail!("unknown borrower `{borrower}`");
        };

        let actual = amount.min(*balance).min(cap);
        balance.checked_sub_assign(actual)?;
        state.collected.checked_add_assign(actual)?;

        Ok(actual)
    }

    fn credit(&self, borrower: &BorrowerId, amount: Uint128) -> anyhow::Result<()> {
        let mut state = self.lock();
        state.take_transfer()?;

        state
            .balances
            .entry(borrower.clone())
            .or_default()
            .checked_add_assign(amount)?;
        state.disbursed.checked_add_assign(amount)?;

        Ok(())
    }

    fn utilization(&self) -> anyhow::Result<Udec128> {
        let state = self.lock();
        ensure!(!state.failing, "ledger unavailable");

        Ok(state.utilization)
    }
}
