//! User-position balance math: compounded debt, index-linked deposits,
//! and the redirection-aware growth rules.

use pool_math::{
    compounded_interest_factor, ray_div, ray_mul, ray_to_wad, seconds_between, sub_or_zero,
    wad_to_ray, Ray, Timestamp, Wad, U256, WAD,
};

use crate::state::{RateMode, Reserve, UserPosition};

/// Fee rate on newly borrowed principal: 0.25%, wad-scaled.
pub const ORIGINATION_FEE_RATE: Wad = U256([2_500_000_000_000_000, 0, 0, 0]);

/// One-time fee charged on new borrows, truncated to the wad unit.
pub fn origination_fee(amount: Wad) -> Wad {
    amount * ORIGINATION_FEE_RATE / WAD
}

impl UserPosition {
    /// Debt including interest accrued since this position's last event.
    ///
    /// Stable debt compounds at the rate the position locked; variable debt
    /// scales the principal by the reserve's index growth since the last
    /// borrow event.
    pub fn compounded_borrow_balance(&self, reserve: &Reserve, ts: Timestamp) -> Wad {
        if self.principal_borrow_balance.is_zero() {
            return U256::zero();
        }
        match self.borrow_rate_mode {
            RateMode::None => U256::zero(),
            RateMode::Stable => {
                let delta = seconds_between(self.last_update_timestamp, ts);
                let factor = compounded_interest_factor(self.stable_borrow_rate, delta);
                ray_to_wad(ray_mul(wad_to_ray(self.principal_borrow_balance), factor))
            }
            RateMode::Variable => {
                if self.variable_borrow_index.is_zero() {
                    return self.principal_borrow_balance;
                }
                let accrued = reserve.accrued_variable_borrow_index(ts);
                ray_to_wad(ray_div(
                    ray_mul(wad_to_ray(self.principal_borrow_balance), accrued),
                    self.variable_borrow_index,
                ))
            }
        }
    }

    /// Interest accrued on the debt since the last event.
    pub fn borrow_balance_increase(&self, reserve: &Reserve, ts: Timestamp) -> Wad {
        sub_or_zero(
            self.compounded_borrow_balance(reserve, ts),
            self.principal_borrow_balance,
        )
    }

    /// Yield-bearing balance implied by the reserve's accrual index.
    ///
    /// A position that redirects its interest keeps its own balance pinned
    /// to principal; yield redirected *to* a position keeps accruing here.
    pub fn current_deposit_balance(&self, reserve: &Reserve, ts: Timestamp) -> Wad {
        if self.principal_deposit_balance.is_zero() && self.redirected_balance.is_zero() {
            return U256::zero();
        }
        if self.liquidity_index.is_zero() {
            // never touched a balance event: no accrual basis yet
            return self.principal_deposit_balance;
        }
        let income = reserve.normalized_income(ts);
        if !self.interest_redirection_address.is_zero() {
            if self.redirected_balance.is_zero() {
                return self.principal_deposit_balance;
            }
            let grown_redirected = self.grown(self.redirected_balance, income);
            return self.principal_deposit_balance
                + sub_or_zero(grown_redirected, self.redirected_balance);
        }
        let base = self.principal_deposit_balance + self.redirected_balance;
        sub_or_zero(self.grown(base, income), self.redirected_balance)
    }

    /// Interest accrued on the deposit since the last event.
    pub fn deposit_balance_increase(&self, reserve: &Reserve, ts: Timestamp) -> Wad {
        sub_or_zero(
            self.current_deposit_balance(reserve, ts),
            self.principal_deposit_balance,
        )
    }

    /// Fold the accrued deposit interest into the principal and re-anchor
    /// the per-user index at `ts`. Returns the folded increase.
    pub(crate) fn cumulate_deposit(
        mut self,
        reserve: &Reserve,
        ts: Timestamp,
    ) -> (UserPosition, Wad) {
        let increase = self.deposit_balance_increase(reserve, ts);
        self.principal_deposit_balance = self.principal_deposit_balance + increase;
        self.liquidity_index = reserve.normalized_income(ts);
        (self, increase)
    }

    fn grown(&self, amount: Wad, income: Ray) -> Wad {
        ray_to_wad(ray_div(
            ray_mul(wad_to_ray(amount), income),
            self.liquidity_index,
        ))
    }
}
