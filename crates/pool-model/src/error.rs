//! Model errors: contract violations surfaced synchronously.
//!
//! A zero denominator is not an error anywhere in the model; the dependent
//! ratio is zero (an empty reserve legitimately sits at 0% utilization).

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ModelError {
    /// The ledger fed a rate-mode encoding outside {none, stable, variable},
    /// or an action implied no valid mode. Never coerced.
    #[error("rate mode {0} is outside the {{none, stable, variable}} encoding")]
    InvalidRateMode(u8),

    /// Repay, swap or rebalance against a position with no active borrow.
    #[error("position has no active borrow")]
    NoActiveBorrow,

    /// Rebalancing applies to stable-rate positions only.
    #[error("position does not accrue at a stable rate")]
    RateModeMismatch,

    /// The action amount exceeds what the position holds or owes.
    #[error("amount exceeds the position balance")]
    InsufficientBalance,

    /// The action amount exceeds the reserve's lendable liquidity.
    #[error("amount exceeds the reserve's available liquidity")]
    InsufficientLiquidity,

    /// Redirecting the interest stream to its current target.
    #[error("interest is already redirected to this target")]
    RedirectionUnchanged,

    /// A position cannot redirect its yield to itself.
    #[error("interest cannot be redirected to the position itself")]
    SelfRedirection,
}
