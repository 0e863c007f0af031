//! Shared primitive types used across the engine.

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Stable identifier of a catalog product.
pub type ProductId = i64;

/// Identifier of a client whose history drives matching and profiling.
pub type ClientId = i64;

/// Identity assigned to a persisted simulation record.
pub type SimulationId = i64;

/// Number of features every normalized vector carries.
pub const FEATURE_DIMENSIONS: usize = 8;

/// A normalized feature vector, each component in [0, 1].
pub type FeatureVector = [f64; FEATURE_DIMENSIONS];

/// Round half away from zero to `places` decimals.
/// All monetary and rate outputs of the engine go through this.
///
/// `value` is read by its shortest decimal form, so a decimal midpoint
/// stored slightly below .5 still rounds up.
pub fn round_half_up(value: f64, places: u32) -> f64 {
    round_product_half_up(&[value], places)
}

/// Multiply `factors` exactly in decimal, then round half away from zero.
///
/// Falls back to binary rounding when a factor is not finite or the
/// product leaves the decimal range.
pub fn round_product_half_up(factors: &[f64], places: u32) -> f64 {
    let product = factors
        .iter()
        .try_fold(Decimal::ONE, |acc, &f| acc.checked_mul(to_decimal(f)?));
    product
        .map(|d| d.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_string().parse::<f64>().ok())
        .unwrap_or_else(|| {
            let factor = 10f64.powi(places as i32);
            (factors.iter().product::<f64>() * factor).round() / factor
        })
}

fn to_decimal(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_str(&value.to_string()).ok()
}
