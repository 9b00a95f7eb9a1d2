//! Half-adjusted fixed-point arithmetic and the two accrual factors.
//!
//! Everything here is exact integer math over [`U256`]; results must be
//! bit-reproducible against the external ledger, so nothing may round
//! through binary floating point. A zero divisor yields zero: an empty
//! reserve legitimately has 0% utilization and 0% rates.

use crate::types::{
    Ray, Timestamp, Wad, HALF_RAY, HALF_WAD, RAY, SECONDS_PER_YEAR, U256, WAD, WAD_RAY_RATIO,
};

/// Wad product, rounded to nearest.
pub fn wad_mul(a: Wad, b: Wad) -> Wad {
    (a * b + HALF_WAD) / WAD
}

/// Wad quotient, rounded to nearest. Zero divisor yields zero.
pub fn wad_div(a: Wad, b: Wad) -> Wad {
    if b.is_zero() {
        return U256::zero();
    }
    (a * WAD + (b >> 1)) / b
}

/// Ray product, rounded to nearest.
pub fn ray_mul(a: Ray, b: Ray) -> Ray {
    (a * b + HALF_RAY) / RAY
}

/// Ray quotient, rounded to nearest. Zero divisor yields zero.
pub fn ray_div(a: Ray, b: Ray) -> Ray {
    if b.is_zero() {
        return U256::zero();
    }
    (a * RAY + (b >> 1)) / b
}

/// Lift a wad onto the ray scale. Exact.
pub fn wad_to_ray(a: Wad) -> Ray {
    a * WAD_RAY_RATIO
}

/// Drop a ray onto the wad scale, rounded to nearest.
pub fn ray_to_wad(a: Ray) -> Wad {
    (a + (WAD_RAY_RATIO >> 1)) / WAD_RAY_RATIO
}

/// Ray exponentiation by squaring for nonnegative integer exponents.
///
/// `ray_pow(x, 0) == RAY` for any base: empty compounding is identity.
pub fn ray_pow(mut base: Ray, mut exp: u64) -> Ray {
    let mut acc = if exp % 2 != 0 { base } else { RAY };
    exp /= 2;
    while exp != 0 {
        base = ray_mul(base, base);
        if exp % 2 != 0 {
            acc = ray_mul(acc, base);
        }
        exp /= 2;
    }
    acc
}

/// Supply-side growth factor over `delta` seconds: `rate · Δt/year + RAY`.
pub fn linear_interest_factor(rate: Ray, delta: u64) -> Ray {
    let year_fraction = ray_div(
        wad_to_ray(U256::from(delta)),
        wad_to_ray(U256::from(SECONDS_PER_YEAR)),
    );
    ray_mul(rate, year_fraction) + RAY
}

/// Borrow-side growth factor over `delta` seconds, compounded per second.
///
/// The per-second rate is a floor division, matching the ledger's own
/// truncation before compounding.
pub fn compounded_interest_factor(rate: Ray, delta: u64) -> Ray {
    let per_second = rate / U256::from(SECONDS_PER_YEAR);
    ray_pow(per_second + RAY, delta)
}

/// Whole seconds elapsed between two ledger timestamps.
pub fn seconds_between(last: Timestamp, now: Timestamp) -> u64 {
    now.saturating_sub(last)
}

/// Subtraction clamped at zero.
///
/// Aggregate buckets can round a unit past the sum of their parts; the
/// model stays total instead of underflowing.
pub fn sub_or_zero(a: U256, b: U256) -> U256 {
    if a > b {
        a - b
    } else {
        U256::zero()
    }
}
