//! Invariant predicates for the verification harness and tests.

use pool_math::RAY;

use crate::state::{RateMode, Reserve, UserPosition};

/// Total liquidity equals the sum of the three buckets.
pub fn liquidity_conserved(reserve: &Reserve) -> bool {
    reserve.total_liquidity
        == reserve.available_liquidity
            + reserve.total_borrows_stable
            + reserve.total_borrows_variable
}

/// Both accrual indices moved forward (or stayed put) between two snapshots.
pub fn indices_monotonic(before: &Reserve, after: &Reserve) -> bool {
    after.liquidity_index >= before.liquidity_index
        && after.variable_borrow_index >= before.variable_borrow_index
}

/// Utilization stays inside [0, RAY].
pub fn utilization_in_bounds(reserve: &Reserve) -> bool {
    reserve.utilization_rate <= RAY
}

/// A reserve with nothing borrowed carries no utilization and no yield.
pub fn idle_reserve_has_zero_rates(reserve: &Reserve) -> bool {
    let idle =
        reserve.total_borrows_stable.is_zero() && reserve.total_borrows_variable.is_zero();
    !idle || (reserve.utilization_rate.is_zero() && reserve.liquidity_rate.is_zero())
}

/// Mode-dependent borrow fields are zeroed exactly when they must be.
pub fn borrow_state_consistent(user: &UserPosition) -> bool {
    match user.borrow_rate_mode {
        RateMode::None => {
            user.principal_borrow_balance.is_zero()
                && user.stable_borrow_rate.is_zero()
                && user.variable_borrow_index.is_zero()
        }
        RateMode::Stable => user.variable_borrow_index.is_zero(),
        RateMode::Variable => user.stable_borrow_rate.is_zero(),
    }
}

/// A position holding nothing and receiving nothing has no redirection
/// target.
pub fn redirection_consistent(user: &UserPosition) -> bool {
    let empty = user.principal_deposit_balance.is_zero() && user.redirected_balance.is_zero();
    !empty || user.interest_redirection_address.is_zero()
}
