//! Utilization-driven interest-rate curves and the shared aggregate
//! calculators.
//!
//! Every function here is pure and total: a zero denominator means an empty
//! reserve and yields a zero rate.

use pool_math::{ray_div, ray_mul, sub_or_zero, wad_to_ray, Ray, Wad, RAY, U256};

use crate::state::RateContext;

/// The three rates produced by one strategy evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InterestRates {
    pub liquidity_rate: Ray,
    pub stable_borrow_rate: Ray,
    pub variable_borrow_rate: Ray,
}

/// Signed adjustment to the stable-borrow bucket, tagged so one averaging
/// formula serves borrow, repay, swap and rebalance call sites.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StableBucketChange {
    /// Debt enters the bucket at the given rate.
    Increase { amount: Wad, rate: Ray },
    /// Debt leaves the bucket at the rate it was carried at.
    Decrease { amount: Wad, rate: Ray },
}

/// Fraction of the reserve currently lent out, ray-scaled.
///
/// Zero when nothing is borrowed or nothing is deposited, regardless of the
/// other operand.
pub fn calculate_utilization_rate(
    total_borrows_stable: Wad,
    total_borrows_variable: Wad,
    total_liquidity: Wad,
) -> Ray {
    let total_borrows = total_borrows_stable + total_borrows_variable;
    if total_borrows.is_zero() || total_liquidity.is_zero() {
        return U256::zero();
    }
    ray_div(wad_to_ray(total_borrows), wad_to_ray(total_liquidity))
}

/// Two-segment curve shared by the stable and variable legs: linear in
/// utilization up to the optimal breakpoint, steeper past it.
fn breakpoint_rate(utilization: Ray, optimal: Ray, slope1: Ray, slope2: Ray) -> Ray {
    if utilization <= optimal {
        ray_mul(slope1, ray_div(utilization, optimal))
    } else {
        let excess = ray_div(utilization - optimal, RAY - optimal);
        slope1 + ray_mul(slope2, excess)
    }
}

/// Evaluate the rate strategy for one reserve state.
pub fn calculate_interest_rates(
    ctx: &RateContext,
    utilization_rate: Ray,
    total_borrows_stable: Wad,
    total_borrows_variable: Wad,
    average_stable_borrow_rate: Ray,
) -> InterestRates {
    let strategy = &ctx.strategy;

    let stable_borrow_rate = ctx.market_stable_rate
        + breakpoint_rate(
            utilization_rate,
            strategy.optimal_utilization_rate,
            strategy.stable_rate_slope1,
            strategy.stable_rate_slope2,
        );

    let variable_borrow_rate = strategy.base_variable_borrow_rate
        + breakpoint_rate(
            utilization_rate,
            strategy.optimal_utilization_rate,
            strategy.variable_rate_slope1,
            strategy.variable_rate_slope2,
        );

    // Forced to zero on an idle reserve so rounding noise in the weighted
    // average can never manufacture supply-side yield.
    let liquidity_rate = if utilization_rate.is_zero() {
        U256::zero()
    } else {
        let overall = calculate_overall_borrow_rate(
            total_borrows_stable,
            total_borrows_variable,
            variable_borrow_rate,
            average_stable_borrow_rate,
        );
        ray_mul(overall, utilization_rate)
    };

    InterestRates {
        liquidity_rate,
        stable_borrow_rate,
        variable_borrow_rate,
    }
}

/// Borrow rate across both buckets, weighted by their principal.
pub fn calculate_overall_borrow_rate(
    total_borrows_stable: Wad,
    total_borrows_variable: Wad,
    variable_borrow_rate: Ray,
    average_stable_borrow_rate: Ray,
) -> Ray {
    let total_borrows = total_borrows_stable + total_borrows_variable;
    if total_borrows.is_zero() {
        return U256::zero();
    }
    let weighted_variable = ray_mul(wad_to_ray(total_borrows_variable), variable_borrow_rate);
    let weighted_stable = ray_mul(wad_to_ray(total_borrows_stable), average_stable_borrow_rate);
    ray_div(weighted_variable + weighted_stable, wad_to_ray(total_borrows))
}

/// Weighted average stable rate after a bucket change:
/// `(old_avg·old_total ± rate·amount) / (old_total ± amount)`.
///
/// An emptied bucket clamps the average to zero; rounding underflow on the
/// weighted sum saturates rather than wrapping.
pub fn next_average_stable_rate(
    old_average: Ray,
    old_total_stable: Wad,
    change: StableBucketChange,
) -> Ray {
    let weighted_old = ray_mul(old_average, wad_to_ray(old_total_stable));
    match change {
        StableBucketChange::Increase { amount, rate } => {
            let new_total = old_total_stable + amount;
            if new_total.is_zero() {
                return U256::zero();
            }
            ray_div(
                weighted_old + ray_mul(rate, wad_to_ray(amount)),
                wad_to_ray(new_total),
            )
        }
        StableBucketChange::Decrease { amount, rate } => {
            if amount >= old_total_stable {
                return U256::zero();
            }
            let new_total = old_total_stable - amount;
            let remaining = sub_or_zero(weighted_old, ray_mul(rate, wad_to_ray(amount)));
            ray_div(remaining, wad_to_ray(new_total))
        }
    }
}
