//! End-to-end action sequences replayed against the model, checking the
//! ledger invariants after every step.

use pool_math::U256;
use pool_model::transitions::{
    apply_redirection_delta, borrow, deposit, redeem, redirect_interest, repay, swap_rate_mode,
};
use pool_model::{helpers, RateContext, RateMode, Reserve, UserPosition};
use poolmodel_integration_tests::{addr, init_logging, wad, StrategyFixture};
use proptest::prelude::*;

const DAY: u64 = 86_400;

fn dai_context() -> RateContext {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/dai.toml");
    StrategyFixture::load(path)
        .expect("fixture must load")
        .context()
        .expect("fixture must parse")
}

#[test]
fn test_stable_borrow_lifecycle() {
    init_logging();
    let ctx = dai_context();
    let reserve = Reserve::new(addr(0xaa), "DAI", 18);

    let lender = UserPosition::new(addr(1));
    let s1 = deposit(&ctx, reserve, lender, wad(1_000), 0).unwrap();
    assert_eq!(s1.reserve.total_liquidity, wad(1_000));

    let borrower = UserPosition::new(addr(2));
    let s2 = borrow(&ctx, s1.reserve.clone(), borrower, wad(300), RateMode::Stable, 0).unwrap();
    assert_eq!(s2.reserve.available_liquidity, wad(700));
    assert!(helpers::liquidity_conserved(&s2.reserve));
    assert!(helpers::borrow_state_consistent(&s2.user));

    let settle_ts = 90 * DAY;
    let owed =
        s2.user.compounded_borrow_balance(&s2.reserve, settle_ts) + s2.user.origination_fee;
    assert!(owed > wad(300), "three months of stable interest are owed");

    let s3 = repay(&ctx, s2.reserve.clone(), s2.user.clone(), owed, settle_ts).unwrap();
    assert_eq!(s3.user.borrow_rate_mode, RateMode::None);
    assert!(s3.reserve.total_borrows_stable.is_zero());
    assert!(helpers::idle_reserve_has_zero_rates(&s3.reserve));
    assert!(helpers::indices_monotonic(&s2.reserve, &s3.reserve));

    // the lender's balance grew, and settlement left enough to pay it out
    let balance = s1.user.current_deposit_balance(&s3.reserve, settle_ts);
    assert!(balance > wad(1_000));
    assert!(balance <= s3.reserve.available_liquidity);

    let s4 = redeem(&ctx, s3.reserve, s1.user, balance, settle_ts).unwrap();
    assert!(s4.user.principal_deposit_balance.is_zero());
    assert!(!s4.user.use_as_collateral);
    assert!(helpers::liquidity_conserved(&s4.reserve));
}

#[test]
fn test_variable_borrow_with_mode_swaps() {
    init_logging();
    let ctx = dai_context();
    let reserve = Reserve::new(addr(0xaa), "DAI", 18);

    let lender = UserPosition::new(addr(1));
    let s1 = deposit(&ctx, reserve, lender, wad(1_000), 0).unwrap();
    let borrower = UserPosition::new(addr(2));
    let s2 = borrow(&ctx, s1.reserve.clone(), borrower, wad(400), RateMode::Variable, 0).unwrap();
    assert_eq!(s2.user.variable_borrow_index, s2.reserve.variable_borrow_index);

    let to_stable = swap_rate_mode(&ctx, s2.reserve.clone(), s2.user.clone(), 30 * DAY).unwrap();
    assert_eq!(to_stable.user.borrow_rate_mode, RateMode::Stable);
    assert!(to_stable.reserve.total_borrows_variable.is_zero());
    assert_eq!(
        to_stable.reserve.total_borrows_stable,
        to_stable.user.principal_borrow_balance
    );
    assert!(helpers::liquidity_conserved(&to_stable.reserve));
    assert!(helpers::indices_monotonic(&s2.reserve, &to_stable.reserve));

    let to_variable =
        swap_rate_mode(&ctx, to_stable.reserve.clone(), to_stable.user.clone(), 60 * DAY).unwrap();
    assert_eq!(to_variable.user.borrow_rate_mode, RateMode::Variable);
    assert!(to_variable.reserve.total_borrows_stable.is_zero());
    assert!(to_variable.reserve.average_stable_borrow_rate.is_zero());

    let settle_ts = 90 * DAY;
    let owed = to_variable
        .user
        .compounded_borrow_balance(&to_variable.reserve, settle_ts)
        + to_variable.user.origination_fee;
    let settled = repay(&ctx, to_variable.reserve, to_variable.user, owed, settle_ts).unwrap();
    assert!(helpers::borrow_state_consistent(&settled.user));
    assert_eq!(settled.user.borrow_rate_mode, RateMode::None);
    assert!(helpers::idle_reserve_has_zero_rates(&settled.reserve));

    let partial = redeem(&ctx, settled.reserve, s1.user, wad(500), settle_ts).unwrap();
    assert!(helpers::liquidity_conserved(&partial.reserve));
    assert!(partial.user.use_as_collateral, "partial redeem keeps the flag");
}

#[test]
fn test_interest_redirection_stream() {
    init_logging();
    let ctx = dai_context();
    let reserve = Reserve::new(addr(0xaa), "DAI", 18);

    let alice = UserPosition::new(addr(1));
    let s1 = deposit(&ctx, reserve, alice, wad(1_000), 0).unwrap();
    let borrower = UserPosition::new(addr(2));
    let s2 = borrow(&ctx, s1.reserve, borrower, wad(400), RateMode::Variable, 0).unwrap();

    // after a day of accrual alice points her yield at carol
    let s3 = redirect_interest(s2.reserve, s1.user, addr(4), DAY).unwrap();
    assert_eq!(s3.redirections.len(), 1);
    let carol = UserPosition::new(addr(4));
    let carol = apply_redirection_delta(&s3.reserve, carol, &s3.redirections[0], DAY);
    assert_eq!(carol.redirected_balance, s3.user.principal_deposit_balance);
    assert!(helpers::redirection_consistent(&carol));

    // a month on: alice is pinned to principal, carol earns the stream
    let later = 31 * DAY;
    let alice_balance = s3.user.current_deposit_balance(&s3.reserve, later);
    assert_eq!(alice_balance, s3.user.principal_deposit_balance);
    let carol_balance = carol.current_deposit_balance(&s3.reserve, later);
    assert!(
        carol_balance > U256::zero(),
        "the redirected stream accrues to the beneficiary"
    );

    // a top-up keeps both sides of the stream consistent
    let s4 = deposit(&ctx, s3.reserve, s3.user, wad(100), later).unwrap();
    assert_eq!(s4.redirections.len(), 1);
    let carol = apply_redirection_delta(&s4.reserve, carol, &s4.redirections[0], later);
    assert_eq!(carol.redirected_balance, s4.user.principal_deposit_balance);
    assert!(helpers::redirection_consistent(&s4.user));
    assert!(helpers::redirection_consistent(&carol));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_random_lifecycle_preserves_invariants(
        deposit_amount in 100u64..1_000_000u64,
        borrow_pct in 1u64..80u64,
        repay_pct in 1u64..100u64,
        days in 1u64..720u64,
        stable in proptest::bool::ANY,
    ) {
        let ctx = RateContext::default();
        let reserve = Reserve::new(addr(0xaa), "DAI", 18);
        let lender = UserPosition::new(addr(1));
        let s1 = deposit(&ctx, reserve, lender, wad(deposit_amount), 0).unwrap();

        let mode = if stable { RateMode::Stable } else { RateMode::Variable };
        let amount = wad(deposit_amount) / U256::from(100u64) * U256::from(borrow_pct);
        let borrower = UserPosition::new(addr(2));
        let s2 = borrow(&ctx, s1.reserve.clone(), borrower, amount, mode, DAY).unwrap();

        let ts = DAY + days * DAY;
        let owed = s2.user.compounded_borrow_balance(&s2.reserve, ts) + s2.user.origination_fee;
        let part = owed / U256::from(100u64) * U256::from(repay_pct);
        let s3 = repay(&ctx, s2.reserve.clone(), s2.user.clone(), part, ts).unwrap();

        for reserve in [&s1.reserve, &s2.reserve, &s3.reserve] {
            prop_assert!(helpers::liquidity_conserved(reserve));
            prop_assert!(helpers::utilization_in_bounds(reserve));
            prop_assert!(helpers::idle_reserve_has_zero_rates(reserve));
        }
        prop_assert!(helpers::indices_monotonic(&s2.reserve, &s3.reserve));
        prop_assert!(helpers::borrow_state_consistent(&s3.user));
    }
}
