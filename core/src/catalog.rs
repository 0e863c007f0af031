//! Product catalog contract and the filter used for candidate selection.

use crate::{
    error::SimResult,
    product::{BenchmarkIndex, HasRateProfile, Product, ProductType, RateType},
    types::ProductId,
};
use serde::{Deserialize, Serialize};

/// Optional narrowing of the catalog. Every `Some` field must match;
/// `None` fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductFilter {
    #[serde(default)]
    pub product_type: Option<ProductType>,
    #[serde(default)]
    pub rate_type: Option<RateType>,
    #[serde(default)]
    pub benchmark_index: Option<BenchmarkIndex>,
    /// Upper bound on days to redeem. Products without liquidity
    /// only match a filter of `-1`.
    #[serde(default)]
    pub max_liquidity_days: Option<i64>,
    #[serde(default)]
    pub fgc_protected: Option<bool>,
}

impl ProductFilter {
    pub fn is_empty(&self) -> bool {
        self == &ProductFilter::default()
    }

    pub fn matches(&self, product: &Product) -> bool {
        self.product_type.is_none_or(|t| product.product_type == t)
            && self.rate_type.is_none_or(|r| product.rate_type == r)
            && self.benchmark_index.is_none_or(|i| product.benchmark_index == i)
            && self
                .max_liquidity_days
                .is_none_or(|max| liquidity_within(product.liquidity_days, max))
            && self.fgc_protected.is_none_or(|f| product.fgc_protected == f)
    }
}

fn liquidity_within(liquidity_days: i64, max: i64) -> bool {
    if max < 0 {
        liquidity_days < 0
    } else {
        liquidity_days >= 0 && liquidity_days <= max
    }
}

impl HasRateProfile for ProductFilter {
    fn rate_type(&self) -> Option<RateType> {
        self.rate_type
    }

    fn benchmark_index(&self) -> Option<BenchmarkIndex> {
        self.benchmark_index
    }

    fn subject(&self) -> String {
        "product filter".to_string()
    }
}

/// Read-only access to the product catalog.
pub trait ProductCatalog {
    fn list_all(&self) -> SimResult<Vec<Product>>;
    fn find_by_id(&self, id: ProductId) -> SimResult<Option<Product>>;
    fn find_by_name(&self, name: &str) -> SimResult<Option<Product>>;

    /// Catalog entries matching `filter`, in catalog order.
    fn find_by_filter(&self, filter: &ProductFilter) -> SimResult<Vec<Product>> {
        Ok(self
            .list_all()?
            .into_iter()
            .filter(|p| filter.matches(p))
            .collect())
    }
}
