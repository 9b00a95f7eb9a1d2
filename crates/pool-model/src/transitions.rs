//! Per-action derivations: each entry point takes the previous snapshots by
//! value and returns the expected next ones.
//!
//! Ordering is the ledger's contract: callers replay committed actions in
//! chronological order with non-decreasing timestamps. Nothing here blocks,
//! waits or retries.

use arrayvec::ArrayVec;
use log::debug;

use pool_math::{sub_or_zero, Timestamp, Wad, U256};

use crate::error::ModelError;
use crate::rates::{next_average_stable_rate, StableBucketChange};
use crate::reserve::ReserveBuckets;
use crate::state::{Address, RateContext, RateMode, Reserve, UserPosition};
use crate::user::origination_fee;

/// Adjustment owed to a redirection beneficiary after an action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RedirectionDelta {
    pub target: Address,
    pub added: Wad,
    pub removed: Wad,
}

/// The expected next state after one action. `redirections` lists the
/// beneficiary adjustments the caller still has to apply via
/// [`apply_redirection_delta`]; at most the old and new targets appear.
#[derive(Clone, Debug)]
pub struct Derived {
    pub reserve: Reserve,
    pub user: UserPosition,
    pub redirections: ArrayVec<RedirectionDelta, 2>,
}

impl Derived {
    fn new(reserve: Reserve, user: UserPosition) -> Self {
        Self {
            reserve,
            user,
            redirections: ArrayVec::new(),
        }
    }
}

/// Deposit `amount` of underlying into the reserve.
pub fn deposit(
    ctx: &RateContext,
    reserve: Reserve,
    user: UserPosition,
    amount: Wad,
    ts: Timestamp,
) -> Result<Derived, ModelError> {
    debug!("deposit {} into {} at {}", amount, reserve.symbol, ts);

    let (mut user, _) = user.cumulate_deposit(&reserve, ts);
    let first_deposit = user.principal_deposit_balance.is_zero();
    user.principal_deposit_balance = user.principal_deposit_balance + amount;
    if first_deposit {
        user.use_as_collateral = true;
    }
    user.last_update_timestamp = ts;

    let mut derived = Derived::new(
        reserve.derive(
            ctx,
            ReserveBuckets {
                available_liquidity: reserve.available_liquidity + amount,
                ..reserve.buckets()
            },
            ts,
        ),
        user,
    );
    if !derived.user.interest_redirection_address.is_zero() {
        derived.redirections.push(RedirectionDelta {
            target: derived.user.interest_redirection_address,
            added: amount,
            removed: U256::zero(),
        });
    }
    Ok(derived)
}

/// Redeem `amount` of underlying out of the position. Callers express
/// "redeem everything" by passing the current balance.
pub fn redeem(
    ctx: &RateContext,
    reserve: Reserve,
    user: UserPosition,
    amount: Wad,
    ts: Timestamp,
) -> Result<Derived, ModelError> {
    if amount > user.current_deposit_balance(&reserve, ts) {
        return Err(ModelError::InsufficientBalance);
    }
    if amount > reserve.available_liquidity {
        return Err(ModelError::InsufficientLiquidity);
    }
    debug!("redeem {} from {} at {}", amount, reserve.symbol, ts);

    let (mut user, _) = user.cumulate_deposit(&reserve, ts);
    user.principal_deposit_balance = sub_or_zero(user.principal_deposit_balance, amount);
    if user.principal_deposit_balance.is_zero() {
        user.use_as_collateral = false;
    }

    let mut redirections: ArrayVec<RedirectionDelta, 2> = ArrayVec::new();
    if !user.interest_redirection_address.is_zero() {
        redirections.push(RedirectionDelta {
            target: user.interest_redirection_address,
            added: U256::zero(),
            removed: amount,
        });
        if user.principal_deposit_balance.is_zero() && user.redirected_balance.is_zero() {
            user.interest_redirection_address = Address::ZERO;
        }
    }
    user.last_update_timestamp = ts;

    let reserve = reserve.derive(
        ctx,
        ReserveBuckets {
            available_liquidity: sub_or_zero(reserve.available_liquidity, amount),
            ..reserve.buckets()
        },
        ts,
    );
    Ok(Derived {
        reserve,
        user,
        redirections,
    })
}

/// Borrow `amount` under the given rate mode. Any existing debt migrates to
/// the new mode: the old principal leaves its bucket at the rate it carried,
/// and the whole of principal + accrued increase + amount lands in the
/// chosen bucket.
pub fn borrow(
    ctx: &RateContext,
    reserve: Reserve,
    user: UserPosition,
    amount: Wad,
    mode: RateMode,
    ts: Timestamp,
) -> Result<Derived, ModelError> {
    if mode == RateMode::None {
        return Err(ModelError::InvalidRateMode(RateMode::None.as_u8()));
    }
    if amount > reserve.available_liquidity {
        return Err(ModelError::InsufficientLiquidity);
    }
    debug!("borrow {} {:?} from {} at {}", amount, mode, reserve.symbol, ts);

    let increase = user.borrow_balance_increase(&reserve, ts);
    let mut buckets = reserve.buckets();

    // lift the existing debt out of the bucket it sits in
    match user.borrow_rate_mode {
        RateMode::Stable => {
            buckets.average_stable_borrow_rate = next_average_stable_rate(
                buckets.average_stable_borrow_rate,
                buckets.total_borrows_stable,
                StableBucketChange::Decrease {
                    amount: user.principal_borrow_balance,
                    rate: user.stable_borrow_rate,
                },
            );
            buckets.total_borrows_stable =
                sub_or_zero(buckets.total_borrows_stable, user.principal_borrow_balance);
        }
        RateMode::Variable => {
            buckets.total_borrows_variable =
                sub_or_zero(buckets.total_borrows_variable, user.principal_borrow_balance);
        }
        RateMode::None => {}
    }

    let new_principal = user.principal_borrow_balance + increase + amount;
    let mut user = user;

    if mode == RateMode::Stable {
        // new stable debt locks the rate quoted before this action
        buckets.average_stable_borrow_rate = next_average_stable_rate(
            buckets.average_stable_borrow_rate,
            buckets.total_borrows_stable,
            StableBucketChange::Increase {
                amount: new_principal,
                rate: reserve.stable_borrow_rate,
            },
        );
        buckets.total_borrows_stable = buckets.total_borrows_stable + new_principal;
        user.stable_borrow_rate = reserve.stable_borrow_rate;
        user.variable_borrow_index = U256::zero();
    } else {
        buckets.total_borrows_variable = buckets.total_borrows_variable + new_principal;
        user.stable_borrow_rate = U256::zero();
        user.variable_borrow_index = reserve.accrued_variable_borrow_index(ts);
    }

    user.principal_borrow_balance = new_principal;
    user.borrow_rate_mode = mode;
    user.origination_fee = user.origination_fee + origination_fee(amount);
    user.last_update_timestamp = ts;

    buckets.available_liquidity = sub_or_zero(buckets.available_liquidity, amount);
    Ok(Derived::new(reserve.derive(ctx, buckets, ts), user))
}

/// Repay up to `amount` against the position. The payment retires the
/// origination fee first; only the remainder reduces debt and returns to
/// lendable liquidity (fee proceeds leave the reserve).
pub fn repay(
    ctx: &RateContext,
    reserve: Reserve,
    user: UserPosition,
    amount: Wad,
    ts: Timestamp,
) -> Result<Derived, ModelError> {
    if user.borrow_rate_mode == RateMode::None || user.principal_borrow_balance.is_zero() {
        return Err(ModelError::NoActiveBorrow);
    }

    let current = user.compounded_borrow_balance(&reserve, ts);
    let increase = sub_or_zero(current, user.principal_borrow_balance);
    // the ledger caps a repayment at what is owed
    let payback = core::cmp::min(amount, current + user.origination_fee);
    let fee_paid = core::cmp::min(payback, user.origination_fee);
    let principal_payback = payback - fee_paid;
    debug!(
        "repay {} ({} fee) into {} at {}",
        payback, fee_paid, reserve.symbol, ts
    );

    let mut buckets = reserve.buckets();
    if user.borrow_rate_mode == RateMode::Stable {
        // fold the accrued interest in at the user's locked rate, then
        // retire the payment at the same rate
        buckets.average_stable_borrow_rate = next_average_stable_rate(
            buckets.average_stable_borrow_rate,
            buckets.total_borrows_stable,
            StableBucketChange::Increase {
                amount: increase,
                rate: user.stable_borrow_rate,
            },
        );
        buckets.total_borrows_stable = buckets.total_borrows_stable + increase;
        buckets.average_stable_borrow_rate = next_average_stable_rate(
            buckets.average_stable_borrow_rate,
            buckets.total_borrows_stable,
            StableBucketChange::Decrease {
                amount: principal_payback,
                rate: user.stable_borrow_rate,
            },
        );
        buckets.total_borrows_stable =
            sub_or_zero(buckets.total_borrows_stable, principal_payback);
    } else {
        buckets.total_borrows_variable = sub_or_zero(
            buckets.total_borrows_variable + increase,
            principal_payback,
        );
    }

    let mut user = user;
    user.principal_borrow_balance = sub_or_zero(current, principal_payback);
    user.origination_fee = sub_or_zero(user.origination_fee, fee_paid);
    if user.borrow_rate_mode == RateMode::Variable {
        user.variable_borrow_index = reserve.accrued_variable_borrow_index(ts);
    }
    if user.principal_borrow_balance.is_zero() {
        user.borrow_rate_mode = RateMode::None;
        user.stable_borrow_rate = U256::zero();
        user.variable_borrow_index = U256::zero();
    }
    user.last_update_timestamp = ts;

    buckets.available_liquidity = buckets.available_liquidity + principal_payback;
    Ok(Derived::new(reserve.derive(ctx, buckets, ts), user))
}

/// Swap the position's accrual mode, moving principal plus its accrued
/// increase between the stable and variable buckets.
pub fn swap_rate_mode(
    ctx: &RateContext,
    reserve: Reserve,
    user: UserPosition,
    ts: Timestamp,
) -> Result<Derived, ModelError> {
    if user.borrow_rate_mode == RateMode::None || user.principal_borrow_balance.is_zero() {
        return Err(ModelError::NoActiveBorrow);
    }
    debug!("swap rate mode in {} at {}", reserve.symbol, ts);

    let current = user.compounded_borrow_balance(&reserve, ts);
    let mut buckets = reserve.buckets();
    let mut user = user;

    if user.borrow_rate_mode == RateMode::Stable {
        buckets.average_stable_borrow_rate = next_average_stable_rate(
            buckets.average_stable_borrow_rate,
            buckets.total_borrows_stable,
            StableBucketChange::Decrease {
                amount: user.principal_borrow_balance,
                rate: user.stable_borrow_rate,
            },
        );
        buckets.total_borrows_stable =
            sub_or_zero(buckets.total_borrows_stable, user.principal_borrow_balance);
        buckets.total_borrows_variable = buckets.total_borrows_variable + current;

        user.borrow_rate_mode = RateMode::Variable;
        user.stable_borrow_rate = U256::zero();
        user.variable_borrow_index = reserve.accrued_variable_borrow_index(ts);
    } else {
        buckets.total_borrows_variable =
            sub_or_zero(buckets.total_borrows_variable, user.principal_borrow_balance);
        buckets.average_stable_borrow_rate = next_average_stable_rate(
            buckets.average_stable_borrow_rate,
            buckets.total_borrows_stable,
            StableBucketChange::Increase {
                amount: current,
                rate: reserve.stable_borrow_rate,
            },
        );
        buckets.total_borrows_stable = buckets.total_borrows_stable + current;

        user.borrow_rate_mode = RateMode::Stable;
        user.stable_borrow_rate = reserve.stable_borrow_rate;
        user.variable_borrow_index = U256::zero();
    }

    user.principal_borrow_balance = current;
    user.last_update_timestamp = ts;
    Ok(Derived::new(reserve.derive(ctx, buckets, ts), user))
}

/// Re-price a stable position at the reserve's current stable rate.
pub fn rebalance_stable_rate(
    ctx: &RateContext,
    reserve: Reserve,
    user: UserPosition,
    ts: Timestamp,
) -> Result<Derived, ModelError> {
    match user.borrow_rate_mode {
        RateMode::None => return Err(ModelError::NoActiveBorrow),
        RateMode::Variable => return Err(ModelError::RateModeMismatch),
        RateMode::Stable => {}
    }
    if user.principal_borrow_balance.is_zero() {
        return Err(ModelError::NoActiveBorrow);
    }
    debug!("rebalance stable rate in {} at {}", reserve.symbol, ts);

    let current = user.compounded_borrow_balance(&reserve, ts);
    let mut buckets = reserve.buckets();

    buckets.average_stable_borrow_rate = next_average_stable_rate(
        buckets.average_stable_borrow_rate,
        buckets.total_borrows_stable,
        StableBucketChange::Decrease {
            amount: user.principal_borrow_balance,
            rate: user.stable_borrow_rate,
        },
    );
    buckets.total_borrows_stable =
        sub_or_zero(buckets.total_borrows_stable, user.principal_borrow_balance);
    buckets.average_stable_borrow_rate = next_average_stable_rate(
        buckets.average_stable_borrow_rate,
        buckets.total_borrows_stable,
        StableBucketChange::Increase {
            amount: current,
            rate: reserve.stable_borrow_rate,
        },
    );
    buckets.total_borrows_stable = buckets.total_borrows_stable + current;

    let mut user = user;
    user.principal_borrow_balance = current;
    user.stable_borrow_rate = reserve.stable_borrow_rate;
    user.last_update_timestamp = ts;

    Ok(Derived::new(reserve.derive(ctx, buckets, ts), user))
}

/// Explicitly flip the collateral-usage flag. Touches nothing else; enabling
/// requires a nonzero deposit balance.
pub fn set_collateral_flag(
    reserve: Reserve,
    user: UserPosition,
    enabled: bool,
    ts: Timestamp,
) -> Result<Derived, ModelError> {
    if enabled && user.current_deposit_balance(&reserve, ts).is_zero() {
        return Err(ModelError::InsufficientBalance);
    }
    let mut user = user;
    user.use_as_collateral = enabled;
    Ok(Derived::new(reserve, user))
}

/// Point the position's yield stream at `target` (`Address::ZERO` turns
/// redirection off). Accrued interest up to `ts` is settled first so the
/// stream cuts over cleanly.
pub fn redirect_interest(
    reserve: Reserve,
    user: UserPosition,
    target: Address,
    ts: Timestamp,
) -> Result<Derived, ModelError> {
    if target == user.address {
        return Err(ModelError::SelfRedirection);
    }
    if target == user.interest_redirection_address {
        return Err(ModelError::RedirectionUnchanged);
    }

    let (mut user, _) = user.cumulate_deposit(&reserve, ts);
    if user.principal_deposit_balance.is_zero() {
        return Err(ModelError::InsufficientBalance);
    }
    debug!(
        "redirect interest of {} to {} at {}",
        user.address, target, ts
    );

    let balance = user.principal_deposit_balance;
    let old_target = user.interest_redirection_address;
    let mut redirections: ArrayVec<RedirectionDelta, 2> = ArrayVec::new();
    if !old_target.is_zero() {
        redirections.push(RedirectionDelta {
            target: old_target,
            added: U256::zero(),
            removed: balance,
        });
    }
    if !target.is_zero() {
        redirections.push(RedirectionDelta {
            target,
            added: balance,
            removed: U256::zero(),
        });
    }

    user.interest_redirection_address = target;
    user.last_update_timestamp = ts;
    Ok(Derived {
        reserve,
        user,
        redirections,
    })
}

/// Apply one [`RedirectionDelta`] to the beneficiary it names, keeping both
/// parties of a redirection consistent. The beneficiary settles its accrued
/// interest before the redirected principal changes underneath it.
pub fn apply_redirection_delta(
    reserve: &Reserve,
    beneficiary: UserPosition,
    delta: &RedirectionDelta,
    ts: Timestamp,
) -> UserPosition {
    let (mut beneficiary, _) = beneficiary.cumulate_deposit(reserve, ts);
    beneficiary.redirected_balance =
        sub_or_zero(beneficiary.redirected_balance + delta.added, delta.removed);
    if beneficiary.principal_deposit_balance.is_zero() && beneficiary.redirected_balance.is_zero()
    {
        beneficiary.interest_redirection_address = Address::ZERO;
    }
    beneficiary.last_update_timestamp = ts;
    beneficiary
}
