//! Synthetic benchmark-rate simulator.
//!
//!   rate = max(0, base_rate + volatility × time × cycle × (N(0,1) × 0.5))
//!
//! rounded to 2 decimals. Rates are annualized percentages. The
//! result is flagged as synthetic on every record that uses it.

use crate::{
    market_scenario::trend_label,
    product::BenchmarkIndex,
    rng::RandomSource,
    types::round_half_up,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexParams {
    /// Annualized, percent.
    pub base_rate: f64,
    pub volatility: f64,
}

/// Reference parameters per benchmark.
pub fn default_params(index: BenchmarkIndex) -> IndexParams {
    let (base_rate, volatility) = match index {
        BenchmarkIndex::Selic => (10.75, 0.8),
        BenchmarkIndex::Cdi => (10.65, 0.7),
        BenchmarkIndex::Ibovespa => (8.50, 3.0),
        BenchmarkIndex::Ipca => (4.25, 1.2),
        BenchmarkIndex::IgpM => (4.80, 1.5),
        BenchmarkIndex::None => (0.0, 0.0),
    };
    IndexParams {
        base_rate,
        volatility,
    }
}

/// Longer horizons leave more room for drift.
pub fn time_factor(term_months: u32) -> f64 {
    match term_months {
        0..=6 => 0.3,
        7..=12 => 0.6,
        13..=24 => 0.9,
        _ => 1.2,
    }
}

/// Economic-cycle amplitude. Deterministic up to 3 months; beyond
/// 12 months the cycle is either contracting or expanding.
pub fn cycle_factor<R: RandomSource + ?Sized>(term_months: u32, rng: &mut R) -> f64 {
    match term_months {
        0..=3 => 1.0,
        4..=12 => rng.uniform(0.8, 1.2),
        13..=24 => {
            if rng.chance(0.5) {
                rng.uniform(0.6, 0.9)
            } else {
                rng.uniform(1.1, 1.5)
            }
        }
        _ => rng.uniform(0.5, 1.5),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexRateQuote {
    pub index: BenchmarkIndex,
    pub base_rate: f64,
    /// Simulated rate, never negative.
    pub rate: f64,
}

impl IndexRateQuote {
    pub fn trend(&self) -> &'static str {
        trend_label(self.rate - self.base_rate)
    }

    pub fn describe(&self) -> String {
        format!(
            "{} {} at {:.2}% p.a. (simulated)",
            self.index.label(),
            self.trend(),
            self.rate
        )
    }
}

#[derive(Debug, Clone)]
pub struct IndexRateSimulator {
    params: HashMap<BenchmarkIndex, IndexParams>,
}

impl Default for IndexRateSimulator {
    fn default() -> Self {
        Self::new(HashMap::new())
    }
}

impl IndexRateSimulator {
    /// Indices absent from `overrides` use `default_params`.
    pub fn new(overrides: HashMap<BenchmarkIndex, IndexParams>) -> Self {
        let params = BenchmarkIndex::ALL
            .into_iter()
            .map(|i| (i, overrides.get(&i).copied().unwrap_or_else(|| default_params(i))))
            .collect();
        Self { params }
    }

    pub fn params(&self, index: BenchmarkIndex) -> IndexParams {
        self.params
            .get(&index)
            .copied()
            .unwrap_or_else(|| default_params(index))
    }

    pub fn simulate<R: RandomSource + ?Sized>(
        &self,
        index: BenchmarkIndex,
        term_months: u32,
        rng: &mut R,
    ) -> IndexRateQuote {
        let params = self.params(index);
        let cycle = cycle_factor(term_months, rng);
        let noise = rng.gaussian() * 0.5;
        let variation = params.volatility * time_factor(term_months) * cycle * noise;
        let rate = round_half_up((params.base_rate + variation).max(0.0), 2);

        log::debug!(
            "index: {} term={term_months}m base={:.2} variation={variation:.4} rate={rate:.2}",
            index.label(),
            params.base_rate
        );

        IndexRateQuote {
            index,
            base_rate: params.base_rate,
            rate,
        }
    }
}
