use {
    accrual_engine::{EngineError, SettlementEngine, load_config},
    accrual_math::{NumberConst, Udec128, Uint128},
    accrual_mock_ledger::MockLedger,
    accrual_types::{
        BorrowerId, DualSlopeRateModel, Epoch, FixedRateModel, GlobalIndexState, RateModel,
        SettlementEvent,
    },
    assertor::*,
    proptest::prelude::*,
    std::{str::FromStr, sync::Once, thread},
};

const UNIT: u128 = 1_000_000;

static TRACING: Once = Once::new();

fn setup_tracing() {
    TRACING.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .init();
    });
}

fn dec(s: &str) -> Udec128 {
    Udec128::from_str(s).unwrap()
}

fn units(amount: u128) -> Uint128 {
    Uint128::new(amount * UNIT)
}

fn setup<'a>(ledger: &'a MockLedger, rate: &str) -> SettlementEngine<&'a MockLedger, FixedRateModel> {
    setup_tracing();

    let rate = dec(rate);
    SettlementEngine::new(
        ledger,
        FixedRateModel::new(rate),
        GlobalIndexState::genesis(Epoch::ZERO, rate),
    )
}

#[test]
fn partial_payment_is_never_charged_twice() {
    let ledger = MockLedger::new();
    let engine = setup(&ledger, "0.15");
    let alice = BorrowerId::from("alice");

    engine.borrow(&alice, units(100), Epoch::ZERO).unwrap();

    // Index 1.15: 15 owed, only 10 available.
    let first = engine
        .settle_with_capacity(&alice, Epoch::new(1), units(10))
        .unwrap();
    assert_that!(first.interest_owed).is_equal_to(units(15));
    assert_that!(first.amount_charged).is_equal_to(units(10));
    assert_that!(first.shortfall).is_equal_to(units(5));
    assert_that!(first.capitalized_principal_delta).is_equal_to(Uint128::new(4_347_827));
    assert_that!(first.new_principal).is_equal_to(Uint128::new(104_347_827));
    assert_that!(first.new_checkpoint_index).is_equal_to(dec("1.15"));
    VecAssertion::has_length(&assert_that!(first.events()), 2);

    // Same epoch: nothing new has accrued.
    let again = engine.settle(&alice, Epoch::new(1)).unwrap();
    assert_that!(again.amount_charged).is_equal_to(Uint128::ZERO);
    assert_that!(again.is_noop()).is_true();
    VecAssertion::is_empty(&assert_that!(again.events()));

    // Index 1.3225: only the growth since 1.15 is owed.
    let second = engine.settle(&alice, Epoch::new(2)).unwrap();
    assert_that!(second.interest_owed).is_equal_to(Uint128::new(15_652_175));
    assert_that!(second.amount_charged).is_equal_to(Uint128::new(15_652_175));
    assert_that!(second.shortfall).is_equal_to(Uint128::ZERO);
    assert_that!(second.new_principal).is_equal_to(Uint128::new(104_347_827));
    assert_that!(second.new_checkpoint_index).is_equal_to(dec("1.3225"));

    assert_that!(ledger.collected()).is_equal_to(Uint128::new(10 * UNIT + 15_652_175));
}

#[test]
fn skipped_epochs_compound() {
    let ledger = MockLedger::new();
    let engine = setup(&ledger, "0.15");
    let alice = BorrowerId::from("alice");

    engine.borrow(&alice, units(100), Epoch::ZERO).unwrap();

    let result = engine.settle(&alice, Epoch::new(2)).unwrap();
    assert_that!(result.interest_owed).is_equal_to(Uint128::new(32_250_000));
    assert_that!(engine.index_state().unwrap().index).is_equal_to(dec("1.3225"));
}

#[test]
fn borrow_and_repay_lifecycle() {
    let ledger = MockLedger::new().with_balance("alice", units(50));
    let engine = setup(&ledger, "0.15");
    let alice = BorrowerId::from("alice");

    let borrowed = engine.borrow(&alice, units(100), Epoch::ZERO).unwrap();
    assert_that!(borrowed.account.principal).is_equal_to(units(100));
    assert_that!(borrowed.account.checkpoint_index).is_equal_to(Udec128::ONE);
    assert_that!(ledger.balance_of(&alice)).is_equal_to(units(150));

    // Repaying settles the 15 of interest first, then takes the principal.
    let repaid = engine.repay(&alice, units(120), Epoch::new(1)).unwrap();
    assert_that!(repaid.settlement.amount_charged).is_equal_to(units(15));
    assert_that!(repaid.repaid).is_equal_to(units(100));
    assert_that!(repaid.refund).is_equal_to(units(20));
    assert_that!(repaid.account).is_none();
    assert_that!(ledger.balance_of(&alice)).is_equal_to(units(35));
    assert!(matches!(
        repaid.events().last(),
        Some(SettlementEvent::Repaid(e)) if e.remaining_principal == Uint128::ZERO
    ));

    assert_that!(engine.account(&alice).unwrap()).is_none();
    VecAssertion::is_empty(&assert_that!(engine.borrowers().unwrap()));
    assert_that!(engine.settle(&alice, Epoch::new(2)).unwrap().is_noop()).is_true();
}

#[test]
fn borrowing_again_settles_first() {
    let ledger = MockLedger::new();
    let engine = setup(&ledger, "0.15");
    let alice = BorrowerId::from("alice");

    engine.borrow(&alice, units(100), Epoch::ZERO).unwrap();
    ledger.set_balance("alice", Uint128::ZERO);

    let result = engine.borrow(&alice, units(10), Epoch::new(1)).unwrap();

    // Nothing to pay with, so the whole 15 is capitalized at 1.15.
    assert_that!(result.settlement.shortfall).is_equal_to(units(15));
    assert_that!(result.settlement.capitalized_principal_delta)
        .is_equal_to(Uint128::new(13_043_479));
    assert_that!(result.account.principal).is_equal_to(Uint128::new(123_043_479));
    assert_that!(result.account.checkpoint_index).is_equal_to(dec("1.15"));
    assert_that!(ledger.balance_of(&alice)).is_equal_to(units(10));
}

#[test]
fn ledger_failure_leaves_account_untouched() {
    let ledger = MockLedger::new();
    let engine = setup(&ledger, "0.15");
    let alice = BorrowerId::from("alice");

    engine.borrow(&alice, units(100), Epoch::ZERO).unwrap();
    engine.refresh_index(Epoch::new(1)).unwrap();

    ledger.set_failing(true);
    let err = engine.settle(&alice, Epoch::new(1)).unwrap_err();
    assert!(matches!(err, EngineError::Ledger { .. }));

    let account = engine.account(&alice).unwrap().unwrap();
    assert_that!(account.principal).is_equal_to(units(100));
    assert_that!(account.checkpoint_index).is_equal_to(Udec128::ONE);

    ledger.set_failing(false);
    let result = engine.settle(&alice, Epoch::new(1)).unwrap();
    assert_that!(result.amount_charged).is_equal_to(units(15));
}

#[test]
fn failed_repayment_keeps_the_settlement() {
    let ledger = MockLedger::new();
    let engine = setup(&ledger, "0.15");
    let alice = BorrowerId::from("alice");

    engine.borrow(&alice, units(100), Epoch::ZERO).unwrap();

    // The interest debit goes through, the principal debit doesn't.
    ledger.fail_after_transfers(1);
    let err = engine.repay(&alice, units(50), Epoch::new(1)).unwrap_err();

    assert!(matches!(&err, EngineError::AfterSettlement { source, .. }
        if matches!(**source, EngineError::Ledger { .. })));
    let settlement = err.settlement().unwrap();
    assert_that!(settlement.amount_charged).is_equal_to(units(15));
    assert_that!(settlement.new_checkpoint_index).is_equal_to(dec("1.15"));
    assert_that!(ledger.collected()).is_equal_to(units(15));

    let account = engine.account(&alice).unwrap().unwrap();
    assert_that!(account.principal).is_equal_to(units(100));
    assert_that!(account.checkpoint_index).is_equal_to(dec("1.15"));
}

#[test]
fn failed_repayment_without_settlement_is_plain() {
    let ledger = MockLedger::new();
    let engine = setup(&ledger, "0.15");
    let alice = BorrowerId::from("alice");

    engine.borrow(&alice, units(100), Epoch::ZERO).unwrap();

    ledger.fail_after_transfers(0);
    let err = engine.repay(&alice, units(50), Epoch::ZERO).unwrap_err();

    assert!(matches!(err, EngineError::Ledger { .. }));
    assert_that!(err.settlement()).is_none();
}

#[test]
fn short_repayment_debit_repays_less() {
    let ledger = MockLedger::new();
    let engine = setup(&ledger, "0.15");
    let alice = BorrowerId::from("alice");

    engine.borrow(&alice, units(100), Epoch::ZERO).unwrap();

    ledger.set_debit_cap(Some(units(20)));
    let result = engine.repay(&alice, units(50), Epoch::new(1)).unwrap();

    assert_that!(result.settlement.amount_charged).is_equal_to(units(15));
    assert_that!(result.repaid).is_equal_to(units(20));
    assert_that!(result.refund).is_equal_to(units(30));

    let account = result.account.unwrap();
    assert_that!(account.principal).is_equal_to(units(80));
    assert_that!(account.checkpoint_index).is_equal_to(dec("1.15"));
    assert_that!(engine.account(&alice).unwrap()).is_equal_to(Some(account));
}

#[test]
fn failed_disbursement_keeps_the_settlement() {
    let ledger = MockLedger::new();
    let engine = setup(&ledger, "0.15");
    let alice = BorrowerId::from("alice");

    engine.borrow(&alice, units(100), Epoch::ZERO).unwrap();

    ledger.fail_after_transfers(1);
    let err = engine.borrow(&alice, units(10), Epoch::new(1)).unwrap_err();

    assert_that!(err.settlement().unwrap().amount_charged).is_equal_to(units(15));
    assert_that!(ledger.balance_of(&alice)).is_equal_to(units(85));

    let account = engine.account(&alice).unwrap().unwrap();
    assert_that!(account.principal).is_equal_to(units(100));
    assert_that!(account.checkpoint_index).is_equal_to(dec("1.15"));
}

#[test]
fn failed_utilization_query_leaves_index_untouched() {
    let ledger = MockLedger::new();
    let engine = setup(&ledger, "0.15");

    ledger.set_failing(true);
    let err = engine.refresh_index(Epoch::new(1)).unwrap_err();
    assert!(matches!(err, EngineError::Utilization { .. }));
    assert_that!(engine.index_state().unwrap().index).is_equal_to(Udec128::ONE);
}

#[test]
fn concurrent_settlements_of_one_borrower_charge_once() {
    let ledger = MockLedger::new();
    let engine = setup(&ledger, "0.15");
    let alice = BorrowerId::from("alice");

    engine.borrow(&alice, units(100), Epoch::ZERO).unwrap();

    let results = thread::scope(|s| {
        let handles = (0..8)
            .map(|_| s.spawn(|| engine.settle(&alice, Epoch::new(1)).unwrap()))
            .collect::<Vec<_>>();

        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect::<Vec<_>>()
    });

    let charged = results.iter().filter(|result| !result.is_noop()).count();
    assert_that!(charged).is_equal_to(1);
    assert_that!(ledger.collected()).is_equal_to(units(15));
}

#[test]
fn concurrent_settlements_across_borrowers() {
    let ledger = MockLedger::new();
    let engine = setup(&ledger, "0.15");
    let borrowers = (0..16)
        .map(|i| BorrowerId::new(format!("borrower-{i}")))
        .collect::<Vec<_>>();

    for borrower in &borrowers {
        engine.borrow(borrower, units(100), Epoch::ZERO).unwrap();
    }

    thread::scope(|s| {
        for borrower in &borrowers {
            let engine = &engine;
            s.spawn(move || engine.settle(borrower, Epoch::new(1)).unwrap());
        }
    });

    assert_that!(ledger.collected()).is_equal_to(units(15 * 16));
    assert_that!(engine.index_state().unwrap().index).is_equal_to(dec("1.15"));
    for borrower in &borrowers {
        let account = engine.account(borrower).unwrap().unwrap();
        assert_that!(account.checkpoint_index).is_equal_to(dec("1.15"));
    }
}

#[test]
fn rate_follows_utilization() {
    setup_tracing();

    let config = load_config("fixtures/engine.toml").unwrap();
    let ledger = MockLedger::new();
    let engine = SettlementEngine::from_config(&config, &ledger).unwrap();

    ledger.set_utilization(dec("0.8"));
    engine.refresh_index(Epoch::new(1_000)).unwrap();

    let expected = DualSlopeRateModel::default()
        .derive_rate(dec("0.8"))
        .unwrap();
    assert_that!(engine.index_state().unwrap().rate_per_epoch).is_equal_to(expected);
}

proptest! {
    /// However capacity varies over time, every settlement charges at most
    /// what was owed, capitalizes exactly the rest, and moves the checkpoint to
    /// the current index.
    #[test]
    fn settlements_stay_consistent(
        capacities in proptest::collection::vec(0u128..3 * UNIT, 1..30),
    ) {
        let ledger = MockLedger::new().with_balance("alice", units(1_000));
        let engine = setup(&ledger, "0.01");
        let alice = BorrowerId::from("alice");

        engine.borrow(&alice, units(100), Epoch::ZERO).unwrap();

        let mut principal = units(100);
        let mut collected = Uint128::ZERO;

        for (epoch, capacity) in capacities.into_iter().enumerate() {
            let epoch = Epoch::new(epoch as u64 + 1);
            let result = engine
                .settle_with_capacity(&alice, epoch, Uint128::new(capacity))
                .unwrap();

            prop_assert!(result.amount_charged <= Uint128::new(capacity));
            prop_assert_eq!(
                result.amount_charged.into_inner() + result.shortfall.into_inner(),
                result.interest_owed.into_inner()
            );
            prop_assert!(result.new_principal >= principal);
            prop_assert_eq!(
                result.new_principal.into_inner(),
                principal.into_inner() + result.capitalized_principal_delta.into_inner()
            );
            prop_assert_eq!(result.new_checkpoint_index, engine.index_state().unwrap().index);

            principal = result.new_principal;
            collected = Uint128::new(collected.into_inner() + result.amount_charged.into_inner());
        }

        prop_assert_eq!(ledger.collected(), collected);
    }
}
