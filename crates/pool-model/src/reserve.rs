//! Reserve snapshot evolution: index accrual plus the five-step action
//! recompute every transition funnels through.

use pool_math::{
    compounded_interest_factor, linear_interest_factor, ray_mul, seconds_between, Ray, Timestamp,
    Wad,
};

use crate::rates::{calculate_interest_rates, calculate_utilization_rate};
use crate::state::{RateContext, Reserve};

/// Post-action bucket values adopted by [`Reserve::derive`]. The average
/// stable rate travels with the buckets because the same call sites that
/// move stable principal also re-weight it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReserveBuckets {
    pub available_liquidity: Wad,
    pub total_borrows_stable: Wad,
    pub total_borrows_variable: Wad,
    pub average_stable_borrow_rate: Ray,
}

impl Reserve {
    /// The snapshot's buckets, unchanged. Transitions start from these.
    pub fn buckets(&self) -> ReserveBuckets {
        ReserveBuckets {
            available_liquidity: self.available_liquidity,
            total_borrows_stable: self.total_borrows_stable,
            total_borrows_variable: self.total_borrows_variable,
            average_stable_borrow_rate: self.average_stable_borrow_rate,
        }
    }

    /// Supply-side index accrued to `ts` at the snapshot's own liquidity
    /// rate. Skipped entirely while the reserve sits at zero utilization.
    pub fn accrued_liquidity_index(&self, ts: Timestamp) -> Ray {
        if self.utilization_rate.is_zero() {
            return self.liquidity_index;
        }
        let delta = seconds_between(self.last_update_timestamp, ts);
        ray_mul(
            linear_interest_factor(self.liquidity_rate, delta),
            self.liquidity_index,
        )
    }

    /// Borrow-side index accrued to `ts`, compounded per second at the
    /// snapshot's variable rate. Gated like the liquidity index.
    pub fn accrued_variable_borrow_index(&self, ts: Timestamp) -> Ray {
        if self.utilization_rate.is_zero() {
            return self.variable_borrow_index;
        }
        let delta = seconds_between(self.last_update_timestamp, ts);
        ray_mul(
            compounded_interest_factor(self.variable_borrow_rate, delta),
            self.variable_borrow_index,
        )
    }

    /// Growth basis for deposit balances at `ts`: the liquidity index as it
    /// stands once the elapsed interval is folded in.
    pub fn normalized_income(&self, ts: Timestamp) -> Ray {
        self.accrued_liquidity_index(ts)
    }

    /// Derive the next reserve snapshot, in order: accrue the prior state,
    /// adopt the action-adjusted buckets, recompute utilization, recompute
    /// the three rates, adopt the accrued indices. `total_liquidity` is the
    /// bucket sum, so conservation holds by construction.
    pub fn derive(&self, ctx: &RateContext, buckets: ReserveBuckets, ts: Timestamp) -> Reserve {
        let liquidity_index = self.accrued_liquidity_index(ts);
        let variable_borrow_index = self.accrued_variable_borrow_index(ts);

        let total_liquidity = buckets.available_liquidity
            + buckets.total_borrows_stable
            + buckets.total_borrows_variable;
        let utilization_rate = calculate_utilization_rate(
            buckets.total_borrows_stable,
            buckets.total_borrows_variable,
            total_liquidity,
        );
        let rates = calculate_interest_rates(
            ctx,
            utilization_rate,
            buckets.total_borrows_stable,
            buckets.total_borrows_variable,
            buckets.average_stable_borrow_rate,
        );

        Reserve {
            address: self.address,
            symbol: self.symbol.clone(),
            decimals: self.decimals,
            total_liquidity,
            available_liquidity: buckets.available_liquidity,
            total_borrows_stable: buckets.total_borrows_stable,
            total_borrows_variable: buckets.total_borrows_variable,
            liquidity_rate: rates.liquidity_rate,
            stable_borrow_rate: rates.stable_borrow_rate,
            variable_borrow_rate: rates.variable_borrow_rate,
            average_stable_borrow_rate: buckets.average_stable_borrow_rate,
            utilization_rate,
            liquidity_index,
            variable_borrow_index,
            last_update_timestamp: ts,
        }
    }
}
