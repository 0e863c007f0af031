//! End-to-end simulation through the orchestrator and the SQLite store.

use investsim_core::{
    catalog::ProductFilter,
    config::SimConfig,
    error::{SimError, SimResult},
    history::{Investment, ProductSnapshot, SimulationRecord, SimulationRepository},
    orchestrator::{SimulationOrchestrator, SimulationRequest},
    product::{BenchmarkIndex, Product, ProductType, RatePeriod, RateType, RiskLevel},
    rng::SimRng,
    store::SimStore,
    types::round_product_half_up,
};
use chrono::NaiveDate;
use std::cell::Cell;

fn test_store() -> (SimStore, SimConfig) {
    let store = SimStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    let config = SimConfig::default_test();
    store.seed_catalog(&config.products).expect("seed catalog");
    (store, config)
}

fn lci_at_ten_percent() -> Product {
    Product {
        id: 50,
        name: "LCI 10%".into(),
        product_type: ProductType::Lci,
        rate_type: RateType::Fixed,
        base_rate: 10.0,
        rate_period: RatePeriod::Yearly,
        benchmark_index: BenchmarkIndex::None,
        liquidity_days: 90,
        minimum_investment_days: 90,
        fgc_protected: true,
        risk_level: RiskLevel::Low,
    }
}

fn invest(store: &SimStore, client_id: i64, product: &Product, amount: f64) {
    store
        .insert_investment(&Investment {
            id: None,
            client_id,
            product_id: product.id,
            amount,
            invested_on: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            snapshot: ProductSnapshot::of(product),
        })
        .expect("insert investment");
}

/// Repository that only counts calls.
struct CountingRepository {
    calls: Cell<usize>,
}

impl SimulationRepository for CountingRepository {
    fn save(&self, record: SimulationRecord) -> SimResult<SimulationRecord> {
        self.calls.set(self.calls.get() + 1);
        Ok(record)
    }
}

/// 10,000 for 12 months at a fixed 10%: the effective rate is the
/// scenario multiplier applied to 10 and the principal always grows.
#[test]
fn fixed_rate_end_to_end() {
    let (store, config) = test_store();
    store.seed_catalog(&[lci_at_ten_percent()]).unwrap();
    let orchestrator = SimulationOrchestrator::new(&store, &store, &store, &config.market);

    for seed in 0..40u64 {
        let request = SimulationRequest {
            product_id: Some(50),
            ..SimulationRequest::for_months(1, 10_000.0, 12)
        };
        let mut rng = SimRng::from_seed(seed);
        let outcome = orchestrator.simulate(&request, &mut rng).unwrap();

        let expected = round_product_half_up(&[10.0, outcome.scenario.risk_multiplier], 4);
        assert_eq!(outcome.product.id, 50);
        assert!(
            (outcome.record.effective_rate - expected).abs() < 1e-9,
            "seed {seed}: rate {} vs {expected}",
            outcome.record.effective_rate
        );
        assert!(outcome.record.effective_rate > 0.0);
        assert!(
            outcome.record.final_value > 10_000.0,
            "seed {seed}: final value {}",
            outcome.record.final_value
        );
        assert!(
            (outcome.record.yield_amount - (outcome.record.final_value - 10_000.0)).abs() < 1e-9
        );
        assert_eq!(outcome.record.term_months, Some(12));
        assert!(!outcome.record.synthetic_index_rate);
        assert!(outcome.index_quote.is_none());
        assert!(outcome.record.id.is_some());
    }

    assert_eq!(store.simulation_count().unwrap(), 40);
    assert_eq!(store.events_of_type("simulation_recorded").unwrap().len(), 40);
}

#[test]
fn zero_candidates_never_reach_persistence() {
    let (store, config) = test_store();
    let repository = CountingRepository {
        calls: Cell::new(0),
    };
    let orchestrator = SimulationOrchestrator::new(&store, &store, &repository, &config.market);

    // The test catalog has no CRI.
    let request = SimulationRequest {
        filter: ProductFilter {
            product_type: Some(ProductType::Cri),
            ..ProductFilter::default()
        },
        ..SimulationRequest::for_months(1, 5_000.0, 6)
    };
    let result = orchestrator.simulate(&request, &mut SimRng::from_seed(1));

    assert!(matches!(result, Err(SimError::NoProductAvailable)));
    assert_eq!(repository.calls.get(), 0);
}

#[test]
fn unknown_product_id_falls_back_to_filter() {
    let (store, config) = test_store();
    let orchestrator = SimulationOrchestrator::new(&store, &store, &store, &config.market);

    let request = SimulationRequest {
        product_id: Some(9_999),
        filter: ProductFilter {
            product_type: Some(ProductType::Fund),
            ..ProductFilter::default()
        },
        ..SimulationRequest::for_months(1, 5_000.0, 6)
    };
    let outcome = orchestrator.simulate(&request, &mut SimRng::from_seed(3)).unwrap();
    assert_eq!(outcome.product.product_type, ProductType::Fund);
}

/// With investment history the filtered candidates are ranked, and the
/// product the client already holds cannot win.
#[test]
fn history_ranks_candidates() {
    let (store, config) = test_store();
    let savings = config.products.iter().find(|p| p.id == 1).unwrap().clone();
    let filter = ProductFilter {
        rate_type: Some(RateType::Fixed),
        fgc_protected: Some(true),
        ..ProductFilter::default()
    };
    let orchestrator = SimulationOrchestrator::new(&store, &store, &store, &config.market);

    // No history: first candidate in catalog order.
    let request = SimulationRequest {
        filter: filter.clone(),
        ..SimulationRequest::for_months(7, 2_000.0, 12)
    };
    let outcome = orchestrator.simulate(&request, &mut SimRng::from_seed(5)).unwrap();
    assert_eq!(outcome.product.id, 1);

    // Holding the savings account pushes the vote to the fixed CDB.
    invest(&store, 7, &savings, 2_000.0);
    let outcome = orchestrator.simulate(&request, &mut SimRng::from_seed(5)).unwrap();
    assert_eq!(outcome.product.id, 2);
}

#[test]
fn only_own_product_left_is_no_product() {
    let (store, config) = test_store();
    let savings = config.products.iter().find(|p| p.id == 1).unwrap().clone();
    invest(&store, 8, &savings, 1_000.0);
    let orchestrator = SimulationOrchestrator::new(&store, &store, &store, &config.market);

    let request = SimulationRequest {
        filter: ProductFilter {
            product_type: Some(ProductType::SavingsAccount),
            ..ProductFilter::default()
        },
        ..SimulationRequest::for_months(8, 1_000.0, 3)
    };
    let result = orchestrator.simulate(&request, &mut SimRng::from_seed(9));
    assert!(matches!(result, Err(SimError::NoProductAvailable)));
    assert_eq!(store.simulation_count().unwrap(), 0);
}

#[test]
fn explicit_product_skips_history_ranking() {
    let (store, config) = test_store();
    let savings = config.products.iter().find(|p| p.id == 1).unwrap().clone();
    invest(&store, 9, &savings, 1_000.0);
    let orchestrator = SimulationOrchestrator::new(&store, &store, &store, &config.market);

    let request = SimulationRequest {
        product_id: Some(1),
        ..SimulationRequest::for_months(9, 1_000.0, 3)
    };
    let outcome = orchestrator.simulate(&request, &mut SimRng::from_seed(9)).unwrap();
    assert_eq!(outcome.product.id, 1);
    assert_eq!(store.simulation_count().unwrap(), 1);
}

#[test]
fn indexed_product_uses_synthetic_rate() {
    let (store, config) = test_store();
    let orchestrator = SimulationOrchestrator::new(&store, &store, &store, &config.market);

    let request = SimulationRequest {
        product_id: Some(3),
        ..SimulationRequest::for_months(2, 10_000.0, 18)
    };
    let outcome = orchestrator.simulate(&request, &mut SimRng::from_seed(11)).unwrap();
    let quote = outcome.index_quote.expect("indexed products carry a quote");

    assert_eq!(quote.index, BenchmarkIndex::Cdi);
    assert!(quote.rate >= 0.0);
    assert!(outcome.record.synthetic_index_rate);
    let expected = round_product_half_up(&[quote.rate, outcome.scenario.risk_multiplier, 1.2], 4);
    assert!((outcome.record.effective_rate - expected).abs() < 1e-9);
}

#[test]
fn term_in_days_is_kept_as_given() {
    let (store, config) = test_store();
    let orchestrator = SimulationOrchestrator::new(&store, &store, &store, &config.market);

    let request = SimulationRequest {
        client_id: 4,
        amount: 3_000.0,
        term_days: Some(45),
        product_id: Some(2),
        ..SimulationRequest::default()
    };
    let outcome = orchestrator.simulate(&request, &mut SimRng::from_seed(2)).unwrap();
    assert_eq!(outcome.record.term_days, Some(45));
    assert_eq!(outcome.record.term_months, None);
    assert_eq!(outcome.record.term_years, None);

    let stored = store.all_simulations().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].term_days, Some(45));
    assert_eq!(stored[0].product_name, "CDB Caixa 2026");
}

#[test]
fn invalid_requests_are_rejected_before_selection() {
    let (store, config) = test_store();
    let orchestrator = SimulationOrchestrator::new(&store, &store, &store, &config.market);
    let mut rng = SimRng::from_seed(0);

    let two_terms = SimulationRequest {
        term_days: Some(30),
        ..SimulationRequest::for_months(1, 1_000.0, 1)
    };
    assert!(matches!(
        orchestrator.simulate(&two_terms, &mut rng),
        Err(SimError::InvalidTerm { .. })
    ));

    let zero_amount = SimulationRequest::for_months(1, 0.0, 12);
    assert!(matches!(
        orchestrator.simulate(&zero_amount, &mut rng),
        Err(SimError::InvalidAmount { .. })
    ));

    let indexed_without_index = SimulationRequest {
        filter: ProductFilter {
            rate_type: Some(RateType::Indexed),
            benchmark_index: Some(BenchmarkIndex::None),
            ..ProductFilter::default()
        },
        ..SimulationRequest::for_months(1, 1_000.0, 12)
    };
    assert!(matches!(
        orchestrator.simulate(&indexed_without_index, &mut rng),
        Err(SimError::InvalidRateProfile { .. })
    ));

    assert_eq!(store.simulation_count().unwrap(), 0);
}
