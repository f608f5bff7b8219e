use {
    crate::{AccountStore, EngineError, EngineResult, SharedIndex, settle_account},
    accrual_math::{IsZero, Number, NumberConst, Udec128, Uint128},
    accrual_types::{
        BorrowResult, BorrowerAccount, BorrowerId, Epoch, GlobalIndexState, Ledger, RateModel,
        RepayResult, SettlementResult,
    },
    std::sync::MutexGuard,
};

/// Interest accrual and settlement for every borrower of a single pool.
///
/// Each operation on a borrower holds that borrower's lock from the index
/// refresh to the write-back, so at most one settlement per borrower is in
/// flight. Operations on different borrowers run concurrently.
pub struct SettlementEngine<L, R> {
    ledger: L,
    rate_model: R,
    index: SharedIndex,
    accounts: AccountStore,
}

impl<L, R> SettlementEngine<L, R>
where
    L: Ledger,
    R: RateModel,
{
    pub fn new(ledger: L, rate_model: R, index: GlobalIndexState) -> Self {
        Self {
            ledger,
            rate_model,
            index: SharedIndex::new(index),
            accounts: AccountStore::new(),
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn rate_model(&self) -> &R {
        &self.rate_model
    }

    pub fn index_state(&self) -> EngineResult<GlobalIndexState> {
        self.index.snapshot()
    }

    /// Advance the global index to `current_epoch` without settling anyone.
    pub fn refresh_index(&self, current_epoch: Epoch) -> EngineResult<Udec128> {
        self.index
            .refresh(current_epoch, &self.rate_model, || self.query_utilization())
    }

    pub fn account(&self, borrower: &BorrowerId) -> EngineResult<Option<BorrowerAccount>> {
        self.accounts.load(borrower)
    }

    pub fn borrowers(&self) -> EngineResult<Vec<BorrowerId>> {
        self.accounts.borrowers()
    }

    /// Reinstate a persisted account, e.g. when a host restarts from a
    /// snapshot. Overwrites whatever the engine currently holds.
    pub fn restore_account(
        &self,
        borrower: &BorrowerId,
        account: BorrowerAccount,
    ) -> EngineResult<()> {
        let slot = self.accounts.slot(borrower)?;
        *lock(&slot)? = account.has_debt().then_some(account);

        Ok(())
    }

    /// Total debt of the borrower at `current_epoch`, without settling or
    /// refreshing anything.
    pub fn debt_of(&self, borrower: &BorrowerId, current_epoch: Epoch) -> EngineResult<Uint128> {
        let Some(account) = self.accounts.load(borrower)? else {
            return Ok(Uint128::ZERO);
        };

        let index = self.index.projected(current_epoch)?;

        Ok(account.debt_at(index)?)
    }

    /// Whether settling at `current_epoch` with the given capacity would
    /// leave a shortfall. Nothing is mutated.
    pub fn is_insolvent(
        &self,
        borrower: &BorrowerId,
        current_epoch: Epoch,
        available_capacity: Uint128,
    ) -> EngineResult<bool> {
        let Some(account) = self.accounts.load(borrower)? else {
            return Ok(false);
        };

        let index = self.index.projected(current_epoch)?;

        Ok(account.is_insolvent(index, available_capacity)?)
    }

    /// Settle the borrower's interest, paying from whatever the ledger
    /// reports as their capacity.
    pub fn settle(
        &self,
        borrower: &BorrowerId,
        current_epoch: Epoch,
    ) -> EngineResult<SettlementResult> {
        self.settle_with_capacity(borrower, current_epoch, Uint128::MAX)
    }

    /// Settle the borrower's interest, paying at most `available_capacity`.
    ///
    /// The capacity is further limited to what the ledger reports, so a caller
    /// can't make the engine debit more than the borrower holds.
    pub fn settle_with_capacity(
        &self,
        borrower: &BorrowerId,
        current_epoch: Epoch,
        available_capacity: Uint128,
    ) -> EngineResult<SettlementResult> {
        let slot = self.accounts.slot(borrower)?;
        let mut account = lock(&slot)?;

        self.settle_locked(borrower, current_epoch, available_capacity, &mut account)
    }

    /// Borrow `amount`, settling outstanding interest first so the new
    /// principal is denominated at the current index.
    ///
    /// If the disbursement fails after interest was collected, the error is
    /// [`EngineError::AfterSettlement`] and carries that settlement.
    pub fn borrow(
        &self,
        borrower: &BorrowerId,
        amount: Uint128,
        current_epoch: Epoch,
    ) -> EngineResult<BorrowResult> {
        if amount.is_zero() {
            return Err(EngineError::ZeroAmount);
        }

        let slot = self.accounts.slot(borrower)?;
        let mut account = lock(&slot)?;

        let settlement = self.settle_locked(borrower, current_epoch, Uint128::MAX, &mut account)?;

        let new_account = self
            .disburse(borrower, amount, settlement.new_checkpoint_index, *account)
            .map_err(|err| err.after_settlement(&settlement))?;

        *account = Some(new_account);

        Ok(BorrowResult {
            settlement,
            borrowed: amount,
            account: new_account,
        })
    }

    /// Repay up to `amount` of principal, settling outstanding interest first.
    ///
    /// Whatever exceeds the remaining principal is reported as refund and is
    /// not debited. The account is closed once principal reaches zero. If the
    /// principal debit fails after interest was collected, the error is
    /// [`EngineError::AfterSettlement`] and carries that settlement.
    pub fn repay(
        &self,
        borrower: &BorrowerId,
        amount: Uint128,
        current_epoch: Epoch,
    ) -> EngineResult<RepayResult> {
        if amount.is_zero() {
            return Err(EngineError::ZeroAmount);
        }

        let slot = self.accounts.slot(borrower)?;
        let mut account = lock(&slot)?;

        let settlement = self.settle_locked(borrower, current_epoch, Uint128::MAX, &mut account)?;

        let Some(current) = *account else {
            return Ok(RepayResult {
                settlement,
                repaid: Uint128::ZERO,
                refund: amount,
                account: None,
            });
        };

        let (repaid, new_account) = self
            .collect_principal(borrower, amount, current)
            .map_err(|err| err.after_settlement(&settlement))?;

        *account = new_account;

        Ok(RepayResult {
            settlement,
            repaid,
            refund: amount.checked_sub(repaid)?,
            account: new_account,
        })
    }

    /// Credit `amount` to the borrower and return the account holding the
    /// increased principal. Nothing is written.
    fn disburse(
        &self,
        borrower: &BorrowerId,
        amount: Uint128,
        index: Udec128,
        current: Option<BorrowerAccount>,
    ) -> EngineResult<BorrowerAccount> {
        let new_account = match current {
            Some(existing) => BorrowerAccount {
                principal: existing.principal.checked_add(amount)?,
                checkpoint_index: index,
            },
            None => BorrowerAccount::open(amount, index),
        };

        self.ledger
            .credit(borrower, amount)
            .map_err(|err| EngineError::ledger(borrower, err))?;

        tracing::info!(
            %borrower,
            %amount,
            principal = %new_account.principal,
            %index,
            "Borrowed"
        );

        Ok(new_account)
    }

    /// Debit up to `amount` of principal. A short debit repays less. Returns
    /// the amount repaid and the account left over. Nothing is written.
    fn collect_principal(
        &self,
        borrower: &BorrowerId,
        amount: Uint128,
        current: BorrowerAccount,
    ) -> EngineResult<(Uint128, Option<BorrowerAccount>)> {
        let requested = amount.min(current.principal);
        let repaid = self
            .ledger
            .debit(borrower, requested)
            .map_err(|err| EngineError::ledger(borrower, err))?;

        if repaid > requested {
            return Err(EngineError::LedgerOverDebit {
                borrower: borrower.clone(),
                requested,
                actual: repaid,
            });
        }

        let principal = current.principal.checked_sub(repaid).map_err(|_| {
            EngineError::NegativePrincipal {
                borrower: borrower.clone(),
                principal: current.principal,
                reduction: repaid,
            }
        })?;

        if principal.is_zero() {
            tracing::info!(%borrower, %repaid, "Debt fully repaid");
            return Ok((repaid, None));
        }

        if repaid < requested {
            tracing::warn!(%borrower, %requested, %repaid, "Ledger debited less than requested");
        }

        tracing::info!(%borrower, %repaid, remaining = %principal, "Repaid");

        Ok((
            repaid,
            Some(BorrowerAccount {
                principal,
                checkpoint_index: current.checkpoint_index,
            }),
        ))
    }

    /// Refresh the index and settle, with the borrower's lock held by the
    /// caller. `account` is only written if the whole settlement succeeds.
    fn settle_locked(
        &self,
        borrower: &BorrowerId,
        current_epoch: Epoch,
        available_capacity: Uint128,
        account: &mut Option<BorrowerAccount>,
    ) -> EngineResult<SettlementResult> {
        let index = self.refresh_index(current_epoch)?;

        // Nothing to charge, so don't bother the ledger.
        let owes_interest = match account {
            Some(account) => account.has_debt() && !account.is_settled_at(index),
            None => false,
        };

        let available_capacity = if owes_interest {
            self.ledger
                .query_capacity(borrower)
                .map_err(|err| EngineError::ledger(borrower, err))?
                .min(available_capacity)
        } else {
            Uint128::ZERO
        };

        let (new_account, result) = settle_account(
            &self.ledger,
            borrower,
            account.as_ref(),
            index,
            available_capacity,
        )?;

        *account = new_account;

        Ok(result)
    }

    fn query_utilization(&self) -> EngineResult<Udec128> {
        self.ledger
            .utilization()
            .map_err(|err| EngineError::Utilization {
                reason: format!("{err:#}"),
            })
    }
}

fn lock<T>(slot: &std::sync::Mutex<T>) -> EngineResult<MutexGuard<'_, T>> {
    slot.lock().map_err(|_| EngineError::MutexPoisoned)
}

// ----------------------------------- tests -----------------------------------
