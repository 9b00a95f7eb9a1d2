//! Reference accounting model for a lending-ledger reserve.
//!
//! Recomputes, deterministically and bit-exactly, the economic state the
//! external ledger is expected to commit: interest accrual, the
//! utilization-driven rate curves, origination fees and interest
//! redirection. Every entry point is pure; it takes the previous reserve
//! and user snapshots plus the action parameters and returns the expected
//! next snapshots. Nothing here performs I/O, holds shared state, or waits.

pub mod error;
pub mod helpers;
pub mod rates;
pub mod reserve;
pub mod state;
pub mod transitions;
pub mod user;

// Re-export commonly used types
pub use error::ModelError;
pub use rates::{
    calculate_interest_rates, calculate_overall_borrow_rate, calculate_utilization_rate,
    next_average_stable_rate, InterestRates, StableBucketChange,
};
pub use reserve::ReserveBuckets;
pub use state::{Address, RateContext, RateMode, RateStrategy, Reserve, UserPosition};
pub use transitions::{
    apply_redirection_delta, borrow, deposit, rebalance_stable_rate, redeem, redirect_interest,
    repay, set_collateral_flag, swap_rate_mode, Derived, RedirectionDelta,
};
pub use user::{origination_fee, ORIGINATION_FEE_RATE};
