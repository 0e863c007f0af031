//! Catalog product model.
//!
//! Enumerations are persisted and serialized by their stable
//! snake_case names. Variants may be appended, never reordered:
//! the product type ordinal feeds the feature normalizer.

use crate::{
    error::{SimError, SimResult},
    types::ProductId,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    Cdb,
    Lci,
    Lca,
    TreasuryDirect,
    SavingsAccount,
    Debenture,
    Cri,
    Fund,
    Fii,
    Stock,
    Etf,
}

impl ProductType {
    pub const ALL: [ProductType; 11] = [
        Self::Cdb,
        Self::Lci,
        Self::Lca,
        Self::TreasuryDirect,
        Self::SavingsAccount,
        Self::Debenture,
        Self::Cri,
        Self::Fund,
        Self::Fii,
        Self::Stock,
        Self::Etf,
    ];

    /// Position in declaration order.
    pub fn ordinal(&self) -> usize {
        *self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cdb => "cdb",
            Self::Lci => "lci",
            Self::Lca => "lca",
            Self::TreasuryDirect => "treasury_direct",
            Self::SavingsAccount => "savings_account",
            Self::Debenture => "debenture",
            Self::Cri => "cri",
            Self::Fund => "fund",
            Self::Fii => "fii",
            Self::Stock => "stock",
            Self::Etf => "etf",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateType {
    /// Rate declared directly on the product.
    Fixed,
    /// Rate follows a benchmark index.
    Indexed,
}

impl RateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Indexed => "indexed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatePeriod {
    Daily,
    Monthly,
    Yearly,
    TotalPeriod,
}

impl RatePeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::TotalPeriod => "total_period",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenchmarkIndex {
    Selic,
    Cdi,
    Ibovespa,
    Ipca,
    #[serde(rename = "igp_m")]
    IgpM,
    None,
}

impl BenchmarkIndex {
    pub const ALL: [BenchmarkIndex; 6] = [
        Self::Selic,
        Self::Cdi,
        Self::Ibovespa,
        Self::Ipca,
        Self::IgpM,
        Self::None,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Selic => "selic",
            Self::Cdi => "cdi",
            Self::Ibovespa => "ibovespa",
            Self::Ipca => "ipca",
            Self::IgpM => "igp_m",
            Self::None => "none",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Selic => "SELIC",
            Self::Cdi => "CDI",
            Self::Ibovespa => "IBOVESPA",
            Self::Ipca => "IPCA",
            Self::IgpM => "IGP-M",
            Self::None => "none",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

macro_rules! impl_str_enum {
    ($ty:ty, $all:expr) => {
        impl FromStr for $ty {
            type Err = SimError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $all.into_iter().find(|v| v.as_str() == s).ok_or_else(|| {
                    SimError::Other(anyhow::anyhow!(
                        "unknown {} value '{s}'",
                        stringify!($ty)
                    ))
                })
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

impl_str_enum!(ProductType, ProductType::ALL);
impl_str_enum!(RateType, [RateType::Fixed, RateType::Indexed]);
impl_str_enum!(
    RatePeriod,
    [
        RatePeriod::Daily,
        RatePeriod::Monthly,
        RatePeriod::Yearly,
        RatePeriod::TotalPeriod
    ]
);
impl_str_enum!(BenchmarkIndex, BenchmarkIndex::ALL);
impl_str_enum!(RiskLevel, [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High]);

/// Liquidity marker for products that cannot be redeemed early.
pub const NO_LIQUIDITY: i64 = -1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub product_type: ProductType,
    pub rate_type: RateType,
    /// Annualized, in percent.
    pub base_rate: f64,
    pub rate_period: RatePeriod,
    pub benchmark_index: BenchmarkIndex,
    /// Days until redemption; `NO_LIQUIDITY` when locked until maturity.
    pub liquidity_days: i64,
    pub minimum_investment_days: i64,
    pub fgc_protected: bool,
    pub risk_level: RiskLevel,
}

/// Capability for anything that declares a rate policy.
///
/// Indexed policies need a benchmark; fixed ones must not carry one.
/// A side that leaves either field open is not checked.
pub trait HasRateProfile {
    fn rate_type(&self) -> Option<RateType>;
    fn benchmark_index(&self) -> Option<BenchmarkIndex>;
    fn subject(&self) -> String;

    fn check_rate_profile(&self) -> SimResult<()> {
        let reason = match (self.rate_type(), self.benchmark_index()) {
            (Some(RateType::Indexed), Some(BenchmarkIndex::None)) => {
                "indexed rate requires a benchmark index"
            }
            (Some(RateType::Fixed), Some(index)) if index != BenchmarkIndex::None => {
                "fixed rate cannot follow a benchmark index"
            }
            _ => return Ok(()),
        };
        Err(SimError::InvalidRateProfile {
            subject: self.subject(),
            reason: reason.to_string(),
        })
    }
}

impl HasRateProfile for Product {
    fn rate_type(&self) -> Option<RateType> {
        Some(self.rate_type)
    }

    fn benchmark_index(&self) -> Option<BenchmarkIndex> {
        Some(self.benchmark_index)
    }

    fn subject(&self) -> String {
        format!("product {} ({})", self.id, self.name)
    }
}
