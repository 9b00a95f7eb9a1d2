//! Immutable snapshot types for the reserve and user-position model.
//!
//! Snapshots are derived, never mutated: every transition takes the previous
//! snapshot by value and returns the next one.

use core::fmt;

use pool_math::{Ray, Timestamp, Wad, RAY, U256};

use crate::error::ModelError;

/// Opaque 20-byte ledger address. `Address::ZERO` means "none".
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// How a borrow position accrues interest.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateMode {
    None,
    Stable,
    Variable,
}

impl RateMode {
    /// Numeric encoding used by the ledger's calldata.
    pub fn as_u8(self) -> u8 {
        match self {
            RateMode::None => 0,
            RateMode::Stable => 1,
            RateMode::Variable => 2,
        }
    }
}

impl TryFrom<u8> for RateMode {
    type Error = ModelError;

    /// Out-of-range encodings are a hard error, never a sentinel.
    fn try_from(raw: u8) -> Result<Self, ModelError> {
        match raw {
            0 => Ok(RateMode::None),
            1 => Ok(RateMode::Stable),
            2 => Ok(RateMode::Variable),
            other => Err(ModelError::InvalidRateMode(other)),
        }
    }
}

/// Static parameters of the two-segment rate curve, all ray-scaled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateStrategy {
    pub base_variable_borrow_rate: Ray,
    pub variable_rate_slope1: Ray,
    pub variable_rate_slope2: Ray,
    pub stable_rate_slope1: Ray,
    pub stable_rate_slope2: Ray,
    /// Utilization breakpoint between the two slopes, in (0, RAY].
    pub optimal_utilization_rate: Ray,
}

impl Default for RateStrategy {
    fn default() -> Self {
        Self {
            base_variable_borrow_rate: U256::zero(),
            variable_rate_slope1: RAY / U256::from(25u64), // 4%
            variable_rate_slope2: RAY / U256::from(4u64) * U256::from(3u64), // 75%
            stable_rate_slope1: RAY / U256::from(10u64), // 10%
            stable_rate_slope2: RAY, // 100%
            optimal_utilization_rate: RAY / U256::from(5u64) * U256::from(4u64), // 80%
        }
    }
}

/// Explicit inputs every derivation needs besides the snapshots themselves.
/// Passed to each entry point; the model holds no ambient state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateContext {
    pub strategy: RateStrategy,
    /// Reference stable rate quoted by the external market.
    pub market_stable_rate: Ray,
}

impl Default for RateContext {
    fn default() -> Self {
        Self {
            strategy: RateStrategy::default(),
            market_stable_rate: RAY / U256::from(10u64), // 10%
        }
    }
}

/// Reserve snapshot as of `last_update_timestamp`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reserve {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,

    /// Sum of the three buckets below, modulo not-yet-accrued interest.
    pub total_liquidity: Wad,
    pub available_liquidity: Wad,
    pub total_borrows_stable: Wad,
    pub total_borrows_variable: Wad,

    pub liquidity_rate: Ray,
    pub stable_borrow_rate: Ray,
    pub variable_borrow_rate: Ray,
    pub average_stable_borrow_rate: Ray,
    pub utilization_rate: Ray,

    /// Monotonically non-decreasing accrual factors.
    pub liquidity_index: Ray,
    pub variable_borrow_index: Ray,

    pub last_update_timestamp: Timestamp,
}

impl Reserve {
    /// An empty reserve: both indices at one ray, everything else zero.
    pub fn new(address: Address, symbol: &str, decimals: u8) -> Self {
        Self {
            address,
            symbol: symbol.to_string(),
            decimals,
            total_liquidity: U256::zero(),
            available_liquidity: U256::zero(),
            total_borrows_stable: U256::zero(),
            total_borrows_variable: U256::zero(),
            liquidity_rate: U256::zero(),
            stable_borrow_rate: U256::zero(),
            variable_borrow_rate: U256::zero(),
            average_stable_borrow_rate: U256::zero(),
            utilization_rate: U256::zero(),
            liquidity_index: RAY,
            variable_borrow_index: RAY,
            last_update_timestamp: 0,
        }
    }
}

/// One user's position in one reserve, as of `last_update_timestamp`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserPosition {
    pub address: Address,

    // Borrow side
    pub principal_borrow_balance: Wad,
    /// The rate this position locked; zero unless the mode is stable.
    pub stable_borrow_rate: Ray,
    pub borrow_rate_mode: RateMode,
    /// Reserve variable index at the last borrow event; zero unless variable.
    pub variable_borrow_index: Ray,
    pub origination_fee: Wad,

    // Deposit side
    pub principal_deposit_balance: Wad,
    /// Reserve normalized income at the last balance-affecting event.
    pub liquidity_index: Ray,
    /// Principal redirected to this position by other depositors.
    pub redirected_balance: Wad,
    pub interest_redirection_address: Address,
    pub use_as_collateral: bool,

    pub last_update_timestamp: Timestamp,
}

impl UserPosition {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            principal_borrow_balance: U256::zero(),
            stable_borrow_rate: U256::zero(),
            borrow_rate_mode: RateMode::None,
            variable_borrow_index: U256::zero(),
            origination_fee: U256::zero(),
            principal_deposit_balance: U256::zero(),
            liquidity_index: U256::zero(),
            redirected_balance: U256::zero(),
            interest_redirection_address: Address::ZERO,
            use_as_collateral: false,
            last_update_timestamp: 0,
        }
    }
}
