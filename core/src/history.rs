//! Client history model and the collaborator contracts that serve it.
//!
//! The engine only reads history through `ClientHistory` and only
//! writes through `SimulationRepository`. `SimStore` implements both.

use crate::{
    error::{SimError, SimResult},
    product::{BenchmarkIndex, Product, ProductType, RatePeriod, RateType},
    types::{ClientId, ProductId, SimulationId},
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Product attributes captured at the moment of an investment or
/// simulation. Used as a feature source; never written back to the
/// catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub product_type: ProductType,
    pub rate_type: RateType,
    pub base_rate: f64,
    pub rate_period: RatePeriod,
    pub benchmark_index: BenchmarkIndex,
    pub liquidity_days: i64,
    pub minimum_investment_days: i64,
    pub fgc_protected: bool,
}

impl ProductSnapshot {
    pub fn of(product: &Product) -> Self {
        Self {
            product_type: product.product_type,
            rate_type: product.rate_type,
            base_rate: product.base_rate,
            rate_period: product.rate_period,
            benchmark_index: product.benchmark_index,
            liquidity_days: product.liquidity_days,
            minimum_investment_days: product.minimum_investment_days,
            fgc_protected: product.fgc_protected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investment {
    pub id: Option<i64>,
    pub client_id: ClientId,
    pub product_id: ProductId,
    pub amount: f64,
    pub invested_on: NaiveDate,
    pub snapshot: ProductSnapshot,
}

/// A past simulation re-expressed as a feature source: the record's
/// amount plus the attributes of the product it simulated.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationQuery {
    pub product_id: ProductId,
    pub amount: f64,
    pub snapshot: ProductSnapshot,
}

impl SimulationQuery {
    /// Rebuild the query behind `record` from the catalog entry it
    /// referenced. A record whose product cannot be resolved has no
    /// feature mapping.
    pub fn from_record(record: &SimulationRecord, product: Option<&Product>) -> SimResult<Self> {
        let product = product.ok_or_else(|| SimError::UnsupportedSource {
            reason: format!(
                "simulation {:?} references product {} which is not in the catalog",
                record.id, record.product_id
            ),
        })?;
        Ok(Self {
            product_id: product.id,
            amount: record.invested_amount,
            snapshot: ProductSnapshot::of(product),
        })
    }
}

/// An investment horizon. Exactly one unit is ever populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "unit", content = "value", rename_all = "snake_case")]
pub enum Term {
    Months(u32),
    Days(u32),
    Years(u32),
}

impl Term {
    /// Whole months used to bucket scenarios and index cycles.
    /// Partial months count as a full month.
    pub fn months(&self) -> u32 {
        match *self {
            Term::Months(m) => m,
            Term::Days(d) => d.div_ceil(30),
            Term::Years(y) => y.saturating_mul(12),
        }
    }

    /// Length of the horizon in years, for payoff accrual.
    pub fn years(&self) -> f64 {
        match *self {
            Term::Months(m) => m as f64 / 12.0,
            Term::Days(d) => d as f64 / 365.0,
            Term::Years(y) => y as f64,
        }
    }

    pub fn is_positive(&self) -> bool {
        match *self {
            Term::Months(v) | Term::Days(v) | Term::Years(v) => v > 0,
        }
    }
}

/// Capability for request/record shapes carrying the three optional
/// term fields.
pub trait HasTermFields {
    fn term_months(&self) -> Option<u32>;
    fn term_days(&self) -> Option<u32>;
    fn term_years(&self) -> Option<u32>;

    /// The single populated term. Zero or several populated fields,
    /// or a zero-length term, are rejected.
    fn term(&self) -> SimResult<Term> {
        let populated: Vec<Term> = [
            self.term_months().map(Term::Months),
            self.term_days().map(Term::Days),
            self.term_years().map(Term::Years),
        ]
        .into_iter()
        .flatten()
        .collect();

        match populated.as_slice() {
            [term] if term.is_positive() => Ok(*term),
            [_] => Err(SimError::InvalidTerm {
                reason: "term must be greater than zero".into(),
            }),
            [] => Err(SimError::InvalidTerm {
                reason: "one of months, days or years is required".into(),
            }),
            _ => Err(SimError::InvalidTerm {
                reason: "only one of months, days or years may be given".into(),
            }),
        }
    }
}

/// The persisted outcome of one simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRecord {
    /// Assigned by `SimulationRepository::save`.
    pub id: Option<SimulationId>,
    pub client_id: ClientId,
    pub product_id: ProductId,
    pub product_name: String,
    pub invested_amount: f64,
    pub term_months: Option<u32>,
    pub term_days: Option<u32>,
    pub term_years: Option<u32>,
    pub final_value: f64,
    /// Percent, annualized.
    pub effective_rate: f64,
    /// `final_value - invested_amount`.
    pub yield_amount: f64,
    pub scenario_description: String,
    /// True when the rate came from the synthetic index simulator.
    pub synthetic_index_rate: bool,
    pub simulated_at: DateTime<Utc>,
}

impl HasTermFields for SimulationRecord {
    fn term_months(&self) -> Option<u32> {
        self.term_months
    }

    fn term_days(&self) -> Option<u32> {
        self.term_days
    }

    fn term_years(&self) -> Option<u32> {
        self.term_years
    }
}

/// Read side of client history.
pub trait ClientHistory {
    fn investments_by_client(&self, client_id: ClientId) -> SimResult<Vec<Investment>>;
    fn simulations_by_client(&self, client_id: ClientId) -> SimResult<Vec<SimulationRecord>>;
    fn investment_count(&self, client_id: ClientId) -> SimResult<i64>;
    fn total_invested(&self, client_id: ClientId) -> SimResult<f64>;
    fn last_simulation(&self, client_id: ClientId) -> SimResult<Option<SimulationRecord>>;
}

/// Write side: the only place a simulation leaves the engine.
pub trait SimulationRepository {
    /// Persist `record` atomically and return it with its identity.
    fn save(&self, record: SimulationRecord) -> SimResult<SimulationRecord>;
}
