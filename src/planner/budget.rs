//! Cooperative per-turn budget
//!
//! Nothing is interrupted mid-flight. The assignment builder and the
//! combination enumerator check the budget at fixed checkpoints (before adding
//! a candidate, before growing the combination size) and stop growing the
//! search once it is spent.

use std::time::{Duration, Instant};

use crate::core::config::SearchConfig;

#[derive(Debug, Clone, Copy)]
pub struct TurnBudget {
    started: Instant,
    limit: Option<Duration>,
    combination_ceiling: u64,
}

impl TurnBudget {
    pub fn new(limit: Duration, combination_ceiling: u64) -> Self {
        Self {
            started: Instant::now(),
            limit: Some(limit),
            combination_ceiling,
        }
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(Duration::from_millis(config.turn_budget_ms), config.combination_ceiling)
    }

    /// Only the combination ceiling applies; used by tests and benchmarks so
    /// results do not depend on machine speed
    pub fn unlimited_time(combination_ceiling: u64) -> Self {
        Self {
            started: Instant::now(),
            limit: None,
            combination_ceiling,
        }
    }

    pub fn combination_ceiling(&self) -> u64 {
        self.combination_ceiling
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn time_exhausted(&self) -> bool {
        self.limit.is_some_and(|limit| self.started.elapsed() >= limit)
    }
}

/// Binomial coefficient, saturating at `u64::MAX`
pub fn binomial(n: usize, k: usize) -> u64 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut result: u128 = 1;
    for i in 0..k {
        result = result * (n - i) as u128 / (i + 1) as u128;
        if result > u128::from(u64::MAX) {
            return u64::MAX;
        }
    }
    result as u64
}

/// Number of combinations of sizes `1..=max_size` drawn from `n` items
pub fn combinations_up_to(n: usize, max_size: usize) -> u64 {
    (1..=max_size.min(n)).fold(0u64, |total, k| total.saturating_add(binomial(n, k)))
}
