//! Shared helpers for the integration suite: logging bootstrap, ray/wad
//! literal builders, and the TOML strategy fixtures the harness feeds the
//! model with.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use pool_math::{Ray, Wad, U256, WAD};
use pool_model::{Address, RateContext, RateStrategy};

/// Route `log` output through the test harness once per process.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn wad(n: u64) -> Wad {
    U256::from(n) * WAD
}

pub fn addr(n: u8) -> Address {
    Address([n; 20])
}

/// Per-reserve strategy fixture as the harness ships it: ray-scaled decimal
/// string literals, so no number in the file is ever parsed through a float.
#[derive(Debug, Clone, Deserialize)]
pub struct StrategyFixture {
    pub symbol: String,
    pub decimals: u8,
    pub base_variable_borrow_rate: String,
    pub variable_rate_slope1: String,
    pub variable_rate_slope2: String,
    pub stable_rate_slope1: String,
    pub stable_rate_slope2: String,
    pub optimal_utilization_rate: String,
    pub market_stable_rate: String,
}

impl StrategyFixture {
    /// Load a fixture from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read fixture file: {}", path))?;
        toml::from_str(&raw).with_context(|| format!("failed to parse fixture TOML: {}", path))
    }

    /// Build the explicit context the model entry points take.
    pub fn context(&self) -> Result<RateContext> {
        Ok(RateContext {
            strategy: RateStrategy {
                base_variable_borrow_rate: ray_literal(&self.base_variable_borrow_rate)?,
                variable_rate_slope1: ray_literal(&self.variable_rate_slope1)?,
                variable_rate_slope2: ray_literal(&self.variable_rate_slope2)?,
                stable_rate_slope1: ray_literal(&self.stable_rate_slope1)?,
                stable_rate_slope2: ray_literal(&self.stable_rate_slope2)?,
                optimal_utilization_rate: ray_literal(&self.optimal_utilization_rate)?,
            },
            market_stable_rate: ray_literal(&self.market_stable_rate)?,
        })
    }
}

fn ray_literal(raw: &str) -> Result<Ray> {
    U256::from_dec_str(raw).map_err(|e| anyhow!("invalid ray literal {:?}: {:?}", raw, e))
}
