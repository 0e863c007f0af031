//! Feature normalization: maps products and history items onto the
//! 8-dimension [0, 1] vector the nearest-neighbor matcher compares.
//!
//! Dimension order (fixed):
//!   0. invested amount          0 ..= 1,000,000
//!   1. product type ordinal     index / type count
//!   2. rate type                fixed 0.0, indexed 1.0
//!   3. rate period              daily 0.0 .. total period 1.0
//!   4. benchmark index          none 0.0 .. IBOVESPA 1.0
//!   5. liquidity days           -1 ..= 365
//!   6. FGC protection           0 / 1
//!   7. minimum investment days  0 ..= 1800

use crate::{
    history::{Investment, ProductSnapshot, SimulationQuery},
    product::{BenchmarkIndex, Product, ProductType, RatePeriod, RateType},
    types::{FeatureVector, ProductId},
};

pub const AMOUNT_RANGE: (f64, f64) = (0.0, 1_000_000.0);
pub const LIQUIDITY_RANGE: (f64, f64) = (-1.0, 365.0);
pub const MIN_INVESTMENT_DAYS_RANGE: (f64, f64) = (0.0, 1800.0);

/// Value used for a dimension the source does not have.
pub const NEUTRAL: f64 = 0.5;

/// Linear scaling of `x` into [0, 1]. A degenerate range maps to neutral.
pub fn normalize(x: f64, min: f64, max: f64) -> f64 {
    if max == min {
        return NEUTRAL;
    }
    ((x - min) / (max - min)).clamp(0.0, 1.0)
}

pub fn product_type_feature(t: ProductType) -> f64 {
    normalize(
        t.ordinal() as f64 / ProductType::ALL.len() as f64,
        0.0,
        1.0,
    )
}

pub fn rate_type_feature(r: RateType) -> f64 {
    match r {
        RateType::Fixed => 0.0,
        RateType::Indexed => 1.0,
    }
}

pub fn rate_period_feature(p: RatePeriod) -> f64 {
    match p {
        RatePeriod::Daily => 0.0,
        RatePeriod::Monthly => 0.33,
        RatePeriod::Yearly => 0.66,
        RatePeriod::TotalPeriod => 1.0,
    }
}

pub fn benchmark_feature(i: BenchmarkIndex) -> f64 {
    match i {
        BenchmarkIndex::None => 0.0,
        BenchmarkIndex::Selic => 0.2,
        BenchmarkIndex::Cdi => 0.4,
        BenchmarkIndex::Ipca => 0.6,
        BenchmarkIndex::IgpM => 0.8,
        BenchmarkIndex::Ibovespa => 1.0,
    }
}

/// Vector for a snapshot. `amount == None` puts the amount dimension
/// at neutral, which is how catalog products are compared.
pub fn snapshot_features(snapshot: &ProductSnapshot, amount: Option<f64>) -> FeatureVector {
    [
        amount.map_or(NEUTRAL, |a| normalize(a, AMOUNT_RANGE.0, AMOUNT_RANGE.1)),
        product_type_feature(snapshot.product_type),
        rate_type_feature(snapshot.rate_type),
        rate_period_feature(snapshot.rate_period),
        benchmark_feature(snapshot.benchmark_index),
        normalize(
            snapshot.liquidity_days as f64,
            LIQUIDITY_RANGE.0,
            LIQUIDITY_RANGE.1,
        ),
        if snapshot.fgc_protected { 1.0 } else { 0.0 },
        normalize(
            snapshot.minimum_investment_days as f64,
            MIN_INVESTMENT_DAYS_RANGE.0,
            MIN_INVESTMENT_DAYS_RANGE.1,
        ),
    ]
}

pub fn product_features(product: &Product) -> FeatureVector {
    snapshot_features(&ProductSnapshot::of(product), None)
}

/// Euclidean distance over all dimensions.
pub fn distance(a: &FeatureVector, b: &FeatureVector) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Anything the matcher can vote with.
pub trait FeatureSource {
    fn features(&self) -> FeatureVector;

    /// The product this source already holds, excluded from its vote.
    fn own_product_id(&self) -> Option<ProductId>;

    fn invested_amount(&self) -> f64;

    /// Vote weight: the invested amount truncated to whole units.
    fn vote_weight(&self) -> i64 {
        self.invested_amount().trunc() as i64
    }
}

impl FeatureSource for Investment {
    fn features(&self) -> FeatureVector {
        snapshot_features(&self.snapshot, Some(self.amount))
    }

    fn own_product_id(&self) -> Option<ProductId> {
        Some(self.product_id)
    }

    fn invested_amount(&self) -> f64 {
        self.amount
    }
}

impl FeatureSource for SimulationQuery {
    fn features(&self) -> FeatureVector {
        snapshot_features(&self.snapshot, Some(self.amount))
    }

    fn own_product_id(&self) -> Option<ProductId> {
        Some(self.product_id)
    }

    fn invested_amount(&self) -> f64 {
        self.amount
    }
}
