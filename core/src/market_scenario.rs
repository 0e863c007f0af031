//! Market scenario generator: one stochastic macro state per simulation.
//!
//! A single uniform draw picks a scenario from the term bucket's
//! probability bands. The scenario's adjustment times the product
//! type's base multiplier gives the risk multiplier applied by the
//! rentability calculator.
//!
//! Results are produced fresh for every simulation. Never cache them.

use crate::{
    product::ProductType,
    rng::RandomSource,
    types::round_product_half_up,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketScenario {
    SevereRecession,
    MildRecession,
    Stable,
    ModerateGrowth,
    StrongGrowth,
    EconomicBoom,
    Volatile,
}

impl MarketScenario {
    /// Risk adjustment relative to a stable market (1.00).
    pub fn adjustment(&self) -> f64 {
        match self {
            Self::SevereRecession => 0.70,
            Self::MildRecession => 0.85,
            Self::Stable => 1.00,
            Self::ModerateGrowth => 1.15,
            Self::StrongGrowth => 1.30,
            Self::EconomicBoom => 1.50,
            Self::Volatile => 0.80,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::SevereRecession => "severe recession",
            Self::MildRecession => "mild recession",
            Self::Stable => "stable economy",
            Self::ModerateGrowth => "moderate growth",
            Self::StrongGrowth => "strong growth",
            Self::EconomicBoom => "economic boom",
            Self::Volatile => "volatile market",
        }
    }
}

/// Term ranges with their own probability bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermBucket {
    /// term ≤ 6 months
    Short,
    /// 6 < term ≤ 12
    Medium,
    /// 12 < term ≤ 24
    Long,
    /// term > 24
    VeryLong,
}

impl TermBucket {
    pub fn for_months(months: u32) -> Self {
        match months {
            0..=6 => Self::Short,
            7..=12 => Self::Medium,
            13..=24 => Self::Long,
            _ => Self::VeryLong,
        }
    }

    /// Upper cut points, increasing. The last entry catches everything.
    fn bands(&self) -> &'static [(f64, MarketScenario)] {
        use MarketScenario::*;
        match self {
            Self::Short => &[(0.60, Stable), (0.80, ModerateGrowth), (1.0, Volatile)],
            Self::Medium => &[
                (0.30, MildRecession),
                (0.50, Stable),
                (0.75, ModerateGrowth),
                (1.0, StrongGrowth),
            ],
            Self::Long => &[
                (0.20, SevereRecession),
                (0.35, MildRecession),
                (0.50, Stable),
                (0.70, ModerateGrowth),
                (0.90, StrongGrowth),
                (1.0, EconomicBoom),
            ],
            Self::VeryLong => &[
                (0.15, SevereRecession),
                (0.25, MildRecession),
                (0.40, Stable),
                (0.60, ModerateGrowth),
                (0.80, StrongGrowth),
                (0.95, EconomicBoom),
                (1.0, Volatile),
            ],
        }
    }
}

/// Scenario for draw `p` in [0, 1): first band whose bound exceeds `p`.
pub fn select_scenario(term_months: u32, p: f64) -> MarketScenario {
    let bands = TermBucket::for_months(term_months).bands();
    bands
        .iter()
        .find(|(bound, _)| p < *bound)
        .or(bands.last())
        .map(|(_, scenario)| *scenario)
        .unwrap_or(MarketScenario::Stable)
}

/// Base multiplier per product type.
///
/// NOTE: the market-linked types carry -0.06, unlike every other type.
/// Kept as observed in the production tables; awaiting product owner
/// confirmation before changing the sign.
pub fn base_multiplier(product_type: ProductType) -> f64 {
    match product_type {
        ProductType::SavingsAccount => 0.95,
        ProductType::Cdb | ProductType::Lci | ProductType::Lca => 1.00,
        ProductType::TreasuryDirect => 1.02,
        ProductType::Fund => 1.15,
        ProductType::Debenture
        | ProductType::Cri
        | ProductType::Fii
        | ProductType::Stock
        | ProductType::Etf => -0.06,
    }
}

pub fn risk_multiplier(product_type: ProductType, scenario: MarketScenario) -> f64 {
    round_product_half_up(&[base_multiplier(product_type), scenario.adjustment()], 4)
}

/// Direction of a deviation from baseline, in percentage points.
pub fn trend_label(delta: f64) -> &'static str {
    if delta > 0.5 {
        "rising"
    } else if delta < -0.5 {
        "falling"
    } else {
        "stable"
    }
}

pub fn term_label(months: u32) -> &'static str {
    match months {
        0..=3 => "short term",
        4..=6 => "short-medium term",
        7..=12 => "medium term",
        13..=24 => "long term",
        _ => "very long term",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketScenarioResult {
    pub scenario: MarketScenario,
    pub risk_multiplier: f64,
    pub description: String,
    pub term_bucket: TermBucket,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MarketScenarioGenerator;

impl MarketScenarioGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Draw one scenario. `product_type` only scales the multiplier;
    /// it never changes which scenario is drawn.
    pub fn generate<R: RandomSource + ?Sized>(
        &self,
        product_type: ProductType,
        term_months: u32,
        rng: &mut R,
    ) -> MarketScenarioResult {
        let p = rng.next_f64();
        let scenario = select_scenario(term_months, p);
        let risk_multiplier = risk_multiplier(product_type, scenario);

        // Deviation from the stable baseline, in percentage points.
        let delta = (scenario.adjustment() - 1.0) * 100.0;
        let description = format!(
            "{} with {} outlook over the {}",
            capitalize(scenario.label()),
            trend_label(delta),
            term_label(term_months)
        );

        log::debug!(
            "scenario: type={} term={term_months}m p={p:.4} -> {:?} multiplier={risk_multiplier:.4}",
            product_type,
            scenario
        );

        MarketScenarioResult {
            scenario,
            risk_multiplier,
            description,
            term_bucket: TermBucket::for_months(term_months),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
