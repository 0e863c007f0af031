use crate::{
    index_rate::IndexParams,
    product::{BenchmarkIndex, Product, ProductType, RatePeriod, RateType, RiskLevel},
    rentability::PayoffStrategy,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize)]
struct ProductCatalogFile {
    products: Vec<Product>,
}

/// Market assumptions: benchmark parameters and payoff accrual.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Overrides of the reference benchmark parameters.
    #[serde(default)]
    pub index_params: HashMap<BenchmarkIndex, IndexParams>,
    #[serde(default)]
    pub payoff_strategy: PayoffStrategy,
}

#[derive(Debug, Clone)]
pub struct SimConfig {
    pub products: Vec<Product>,
    pub market: MarketConfig,
}

impl SimConfig {
    /// Load from the data/ directory.
    /// In tests, use SimConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let product_path = format!("{data_dir}/products/product_catalog.json");
        let product_content = std::fs::read_to_string(&product_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {product_path}: {e}"))?;
        let product_file: ProductCatalogFile = serde_json::from_str(&product_content)
            .map_err(|e| anyhow::anyhow!("Invalid {product_path}: {e}"))?;

        let market_path = format!("{data_dir}/market/market_config.json");
        let market_content = std::fs::read_to_string(&market_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {market_path}: {e}"))?;
        let market: MarketConfig = serde_json::from_str(&market_content)
            .map_err(|e| anyhow::anyhow!("Invalid {market_path}: {e}"))?;

        log::info!(
            "config: {} products, payoff={:?}, {} index overrides",
            product_file.products.len(),
            market.payoff_strategy,
            market.index_params.len()
        );

        Ok(Self {
            products: product_file.products,
            market,
        })
    }

    /// Config with hardcoded defaults for use in unit tests.
    pub fn default_test() -> Self {
        let products = vec![
            test_product(
                1,
                "Poupança Caixa",
                ProductType::SavingsAccount,
                RateType::Fixed,
                6.17,
                RatePeriod::Monthly,
                BenchmarkIndex::None,
                0,
                0,
                true,
                RiskLevel::Low,
            ),
            test_product(
                2,
                "CDB Caixa 2026",
                ProductType::Cdb,
                RateType::Fixed,
                12.0,
                RatePeriod::Yearly,
                BenchmarkIndex::None,
                90,
                180,
                true,
                RiskLevel::Low,
            ),
            test_product(
                3,
                "CDB Liquidez Diária",
                ProductType::Cdb,
                RateType::Indexed,
                100.0,
                RatePeriod::Yearly,
                BenchmarkIndex::Cdi,
                0,
                0,
                true,
                RiskLevel::Low,
            ),
            test_product(
                4,
                "LCI Imobiliária",
                ProductType::Lci,
                RateType::Indexed,
                95.0,
                RatePeriod::Yearly,
                BenchmarkIndex::Cdi,
                90,
                90,
                true,
                RiskLevel::Low,
            ),
            test_product(
                5,
                "Tesouro Selic 2029",
                ProductType::TreasuryDirect,
                RateType::Indexed,
                100.0,
                RatePeriod::Yearly,
                BenchmarkIndex::Selic,
                1,
                0,
                false,
                RiskLevel::Low,
            ),
            test_product(
                6,
                "Tesouro IPCA+ 2035",
                ProductType::TreasuryDirect,
                RateType::Indexed,
                100.0,
                RatePeriod::Yearly,
                BenchmarkIndex::Ipca,
                1,
                365,
                false,
                RiskLevel::Medium,
            ),
            test_product(
                7,
                "Fundo Multimercado",
                ProductType::Fund,
                RateType::Fixed,
                14.0,
                RatePeriod::Yearly,
                BenchmarkIndex::None,
                30,
                30,
                false,
                RiskLevel::Medium,
            ),
            test_product(
                8,
                "Debênture Energia",
                ProductType::Debenture,
                RateType::Indexed,
                100.0,
                RatePeriod::Yearly,
                BenchmarkIndex::Ipca,
                -1,
                720,
                false,
                RiskLevel::Medium,
            ),
            test_product(
                9,
                "FII Logística",
                ProductType::Fii,
                RateType::Fixed,
                11.0,
                RatePeriod::Monthly,
                BenchmarkIndex::None,
                2,
                0,
                false,
                RiskLevel::High,
            ),
            test_product(
                10,
                "ETF Ibovespa",
                ProductType::Etf,
                RateType::Indexed,
                100.0,
                RatePeriod::Daily,
                BenchmarkIndex::Ibovespa,
                2,
                0,
                false,
                RiskLevel::High,
            ),
            test_product(
                11,
                "Ações Varejo",
                ProductType::Stock,
                RateType::Fixed,
                18.0,
                RatePeriod::Daily,
                BenchmarkIndex::None,
                2,
                0,
                false,
                RiskLevel::High,
            ),
        ];

        Self {
            products,
            market: MarketConfig::default(),
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn test_product(
    id: i64,
    name: &str,
    product_type: ProductType,
    rate_type: RateType,
    base_rate: f64,
    rate_period: RatePeriod,
    benchmark_index: BenchmarkIndex,
    liquidity_days: i64,
    minimum_investment_days: i64,
    fgc_protected: bool,
    risk_level: RiskLevel,
) -> Product {
    Product {
        id,
        name: name.to_string(),
        product_type,
        rate_type,
        base_rate,
        rate_period,
        benchmark_index,
        liquidity_days,
        minimum_investment_days,
        fgc_protected,
        risk_level,
    }
}
