//! Rentability calculator: effective rate and payoff of a simulation.
//!
//!   base     = product.base_rate            (fixed)
//!            | simulated index rate         (indexed)
//!   adjusted = round(base × risk_multiplier × (1.2 if indexed), 4)
//!
//! The adjusted rate is an annualized percentage. How it accrues over
//! the term is a `PayoffStrategy`; every strategy yields a final value
//! above the invested amount whenever adjusted > 0 and the term is
//! positive.

use crate::{
    error::{SimError, SimResult},
    history::Term,
    index_rate::IndexRateQuote,
    market_scenario::MarketScenarioResult,
    product::{HasRateProfile, Product, RateType},
    types::round_product_half_up,
};
use serde::{Deserialize, Serialize};

/// Premium applied on top of the index for indexed products.
pub const INDEXED_PREMIUM: f64 = 1.2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoffStrategy {
    /// amount × (1 + rate × years)
    #[default]
    SimpleProRata,
    /// amount × (1 + rate)^years
    Compound,
}

impl PayoffStrategy {
    /// Final value of `amount` at `rate_pct` (annual) over `years`.
    pub fn accrue(&self, amount: f64, rate_pct: f64, years: f64) -> f64 {
        let rate = rate_pct / 100.0;
        let value = match self {
            Self::SimpleProRata => amount * (1.0 + rate * years),
            // A loss beyond the whole principal has no compounding meaning.
            Self::Compound => amount * (1.0 + rate).max(0.0).powf(years),
        };
        value.max(0.0)
    }
}

pub fn adjusted_rate(base_rentability: f64, risk_multiplier: f64, rate_type: RateType) -> f64 {
    let premium = match rate_type {
        RateType::Indexed => INDEXED_PREMIUM,
        RateType::Fixed => 1.0,
    };
    round_product_half_up(&[base_rentability, risk_multiplier, premium], 4)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    /// Annualized percent after scenario adjustment.
    pub effective_rate: f64,
    pub final_value: f64,
    pub yield_amount: f64,
    /// Present only for indexed products.
    pub index_quote: Option<IndexRateQuote>,
}

impl Projection {
    pub fn synthetic_index_rate(&self) -> bool {
        self.index_quote.is_some()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RentabilityCalculator {
    strategy: PayoffStrategy,
}

impl RentabilityCalculator {
    pub fn new(strategy: PayoffStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> PayoffStrategy {
        self.strategy
    }

    /// Declared productivity before scenario adjustment.
    pub fn base_rentability(
        &self,
        product: &Product,
        index_quote: Option<&IndexRateQuote>,
    ) -> SimResult<f64> {
        match (product.rate_type, index_quote) {
            (RateType::Fixed, _) => Ok(product.base_rate),
            (RateType::Indexed, Some(quote)) if quote.index == product.benchmark_index => {
                Ok(quote.rate)
            }
            (RateType::Indexed, _) => Err(SimError::InvalidRateProfile {
                subject: product.subject(),
                reason: format!(
                    "indexed product needs a simulated {} rate",
                    product.benchmark_index.label()
                ),
            }),
        }
    }

    pub fn project(
        &self,
        product: &Product,
        amount: f64,
        term: Term,
        scenario: &MarketScenarioResult,
        index_quote: Option<IndexRateQuote>,
    ) -> SimResult<Projection> {
        let base = self.base_rentability(product, index_quote.as_ref())?;
        let effective_rate = adjusted_rate(base, scenario.risk_multiplier, product.rate_type);
        let final_value = self.strategy.accrue(amount, effective_rate, term.years());

        log::debug!(
            "rentability: product={} base={base:.4} multiplier={:.4} effective={effective_rate:.4} final={final_value:.2}",
            product.id,
            scenario.risk_multiplier
        );

        Ok(Projection {
            effective_rate,
            final_value,
            yield_amount: final_value - amount,
            index_quote: if product.rate_type == RateType::Indexed {
                index_quote
            } else {
                None
            },
        })
    }
}
