//! Fixed-point scales and the 256-bit integer they live in.

use uint::construct_uint;

construct_uint! {
    /// 256-bit unsigned integer for fixed-point intermediates.
    ///
    /// Ray-scale products reach ~10^54 (~2^180), so every product must be
    /// computed at this width before dividing back down to scale.
    pub struct U256(4);
}

/// Token amounts, scaled by 10^18.
pub type Wad = U256;

/// Rates and accrual indices, scaled by 10^27.
pub type Ray = U256;

/// Seconds since the Unix epoch, as committed by the ledger.
pub type Timestamp = u64;

/// 10^18, the wad unit.
pub const WAD: U256 = U256([1_000_000_000_000_000_000, 0, 0, 0]);

/// WAD / 2, the rounding adjustment for wad products.
pub const HALF_WAD: U256 = U256([500_000_000_000_000_000, 0, 0, 0]);

/// 10^27, the ray unit.
pub const RAY: U256 = U256([11_515_845_246_265_065_472, 54_210_108, 0, 0]);

/// RAY / 2, the rounding adjustment for ray products.
pub const HALF_RAY: U256 = U256([5_757_922_623_132_532_736, 27_105_054, 0, 0]);

/// 10^9, the gap between the wad and ray scales.
pub const WAD_RAY_RATIO: U256 = U256([1_000_000_000, 0, 0, 0]);

/// Seconds in the accrual year (365 days).
pub const SECONDS_PER_YEAR: u64 = 31_536_000;
