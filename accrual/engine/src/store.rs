use {
    crate::{EngineError, EngineResult},
    accrual_types::{BorrowerAccount, BorrowerId},
    std::{
        collections::HashMap,
        sync::{Arc, Mutex},
    },
};

/// A borrower's account behind its own lock. `None` means no open debt.
pub type AccountSlot = Arc<Mutex<Option<BorrowerAccount>>>;

/// Borrower accounts, each behind its own lock.
///
/// Holding a borrower's slot lock is what makes a settlement atomic: nothing
/// else can read or write that account between the index refresh and the
/// write-back. Different borrowers never contend with each other beyond the
/// brief lookup in the outer map.
#[derive(Default)]
pub struct AccountStore {
    slots: Mutex<HashMap<BorrowerId, AccountSlot>>,
}

impl AccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The borrower's slot, created empty on first use.
    ///
    /// Slots are never removed, so two callers can't end up holding different
    /// locks for the same borrower.
    pub fn slot(&self, borrower: &BorrowerId) -> EngineResult<AccountSlot> {
        let mut slots = self.slots.lock().map_err(|_| EngineError::MutexPoisoned)?;

        Ok(slots.entry(borrower.clone()).or_default().clone())
    }

    pub fn load(&self, borrower: &BorrowerId) -> EngineResult<Option<BorrowerAccount>> {
        let slot = {
            let slots = self.slots.lock().map_err(|_| EngineError::MutexPoisoned)?;
            match slots.get(borrower) {
                Some(slot) => slot.clone(),
                None => return Ok(None),
            }
        };

        let account = *slot.lock().map_err(|_| EngineError::MutexPoisoned)?;

        Ok(account)
    }

    /// Borrowers that currently hold open debt, in no particular order.
    ///
    /// Waits for in-flight settlements, but only after letting go of the map,
    /// so lookups of other borrowers aren't held up in the meantime.
    pub fn borrowers(&self) -> EngineResult<Vec<BorrowerId>> {
        let slots = self
            .slots
            .lock()
            .map_err(|_| EngineError::MutexPoisoned)?
            .iter()
            .map(|(borrower, slot)| (borrower.clone(), slot.clone()))
            .collect::<Vec<_>>();

        slots
            .into_iter()
            .filter_map(|(borrower, slot)| {
                let open = match slot.lock() {
                    Ok(account) => account.is_some(),
                    Err(_) => return Some(Err(EngineError::MutexPoisoned)),
                };

                open.then_some(Ok(borrower))
            })
            .collect()
    }
}

// ----------------------------------- tests -----------------------------------
