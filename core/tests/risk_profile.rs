//! Risk classification and recommendations from stored client history.
//!
//! The catalog holds twin products per risk level, so a holding always
//! votes for its twin (its own product is excluded from the vote).

use investsim_core::{
    config::MarketConfig,
    error::SimError,
    event::SimEvent,
    history::{Investment, ProductSnapshot},
    orchestrator::{SimulationOrchestrator, SimulationRequest},
    product::{BenchmarkIndex, Product, ProductType, RatePeriod, RateType, RiskLevel},
    risk_profile::{products_for_profile, RiskProfileTag},
    rng::RngBank,
    store::SimStore,
};
use chrono::NaiveDate;

#[allow(clippy::too_many_arguments)]
fn product(
    id: i64,
    name: &str,
    product_type: ProductType,
    base_rate: f64,
    rate_period: RatePeriod,
    liquidity_days: i64,
    minimum_investment_days: i64,
    fgc_protected: bool,
    risk_level: RiskLevel,
) -> Product {
    Product {
        id,
        name: name.into(),
        product_type,
        rate_type: RateType::Fixed,
        base_rate,
        rate_period,
        benchmark_index: BenchmarkIndex::None,
        liquidity_days,
        minimum_investment_days,
        fgc_protected,
        risk_level,
    }
}

fn twin_catalog() -> Vec<Product> {
    vec![
        product(
            1,
            "CDB A",
            ProductType::Cdb,
            12.0,
            RatePeriod::Yearly,
            90,
            180,
            true,
            RiskLevel::Low,
        ),
        product(
            2,
            "CDB B",
            ProductType::Cdb,
            12.0,
            RatePeriod::Yearly,
            90,
            180,
            true,
            RiskLevel::Low,
        ),
        product(
            3,
            "Fundo A",
            ProductType::Fund,
            14.0,
            RatePeriod::Yearly,
            30,
            30,
            false,
            RiskLevel::Medium,
        ),
        product(
            4,
            "Fundo B",
            ProductType::Fund,
            14.0,
            RatePeriod::Yearly,
            30,
            30,
            false,
            RiskLevel::Medium,
        ),
        product(
            5,
            "Ações A",
            ProductType::Stock,
            18.0,
            RatePeriod::Daily,
            2,
            0,
            false,
            RiskLevel::High,
        ),
        product(
            6,
            "Ações B",
            ProductType::Stock,
            18.0,
            RatePeriod::Daily,
            2,
            0,
            false,
            RiskLevel::High,
        ),
    ]
}

fn build_store() -> (SimStore, Vec<Product>) {
    let store = SimStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    let catalog = twin_catalog();
    store.seed_catalog(&catalog).expect("seed catalog");
    (store, catalog)
}

fn invest(store: &SimStore, client_id: i64, product: &Product, amount: f64, day: u32) {
    store
        .insert_investment(&Investment {
            id: None,
            client_id,
            product_id: product.id,
            amount,
            invested_on: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            snapshot: ProductSnapshot::of(product),
        })
        .expect("insert investment");
}

#[test]
fn six_high_three_medium_one_low_is_aggressive() {
    let (store, catalog) = build_store();
    invest(&store, 1, &catalog[0], 1_000.0, 1);
    for day in 2..5 {
        invest(&store, 1, &catalog[2], 2_000.0, day);
    }
    for day in 5..11 {
        invest(&store, 1, &catalog[4], 3_000.0, day);
    }

    let market = MarketConfig::default();
    let orchestrator = SimulationOrchestrator::new(&store, &store, &store, &market);
    let profile = orchestrator.risk_profile(1).unwrap();

    assert_eq!(profile.client_id, 1);
    assert_eq!(profile.profile, RiskProfileTag::Aggressive);
    assert!((67..=100).contains(&profile.score));
    // proportion 0.1×0 + 0.3×50 + 0.6×100 = 75 → 67 + round(0.75 × 33)
    assert_eq!(profile.score, 92);
}

#[test]
fn falls_back_to_simulation_history() {
    let (store, _) = build_store();
    let market = MarketConfig::default();
    let orchestrator =
        SimulationOrchestrator::new(&store, &store, &store, &market).with_events(&store);
    let bank = RngBank::new(77);

    for sequence in 0..3 {
        let request = SimulationRequest {
            product_id: Some(1),
            ..SimulationRequest::for_months(2, 5_000.0, 6)
        };
        orchestrator
            .simulate(&request, &mut bank.for_request(sequence))
            .unwrap();
    }

    let profile = orchestrator.risk_profile(2).unwrap();
    assert_eq!(profile.profile, RiskProfileTag::Conservative);
    assert_eq!(profile.score, 0);

    let events = store.events_of_type("risk_profile_computed").unwrap();
    assert_eq!(events.len(), 1);
    match events[0].decode().unwrap() {
        SimEvent::RiskProfileComputed { client_id, profile, score } => {
            assert_eq!(client_id, 2);
            assert_eq!(profile, RiskProfileTag::Conservative);
            assert_eq!(score, 0);
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn client_without_history_is_rejected() {
    let (store, _) = build_store();
    let market = MarketConfig::default();
    let orchestrator = SimulationOrchestrator::new(&store, &store, &store, &market);

    assert!(matches!(
        orchestrator.risk_profile(99),
        Err(SimError::NoHistoryAvailable { client_id: 99 })
    ));
    assert!(matches!(
        orchestrator.recommend_products(99, 3),
        Err(SimError::NoHistoryAvailable { client_id: 99 })
    ));
}

#[test]
fn recommendations_rank_by_invested_weight() {
    let (store, catalog) = build_store();
    invest(&store, 3, &catalog[0], 5_000.0, 1);
    invest(&store, 3, &catalog[4], 20_000.0, 2);
    invest(&store, 3, &catalog[2], 1_000.0, 3);

    let market = MarketConfig::default();
    let orchestrator = SimulationOrchestrator::new(&store, &store, &store, &market);

    let ranked = orchestrator.recommend_products(3, 10).unwrap();
    let ids: Vec<i64> = ranked.iter().map(|r| r.product.id).collect();
    assert_eq!(ids, vec![6, 2, 4]);
    assert_eq!(ranked[0].weight, 20_000);

    let top = orchestrator.recommend_products(3, 2).unwrap();
    assert_eq!(top.len(), 2);
    assert_eq!(top[1].product.id, 2);
}

#[test]
fn huge_holdings_saturate_the_ranking_weight() {
    let (store, catalog) = build_store();
    invest(&store, 4, &catalog[0], 1e19, 1);
    invest(&store, 4, &catalog[0], 1e19, 2);

    let market = MarketConfig::default();
    let orchestrator = SimulationOrchestrator::new(&store, &store, &store, &market);

    let ranked = orchestrator.recommend_products(4, 3).unwrap();
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].product.id, 2);
    assert_eq!(ranked[0].weight, i64::MAX);
}

#[test]
fn profile_maps_to_accepted_products() {
    let (store, _) = build_store();

    let ids = |tag| -> Vec<i64> {
        products_for_profile(&store, tag)
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect()
    };
    assert_eq!(ids(RiskProfileTag::Conservative), vec![1, 2]);
    assert_eq!(ids(RiskProfileTag::Moderate), vec![1, 2, 3, 4]);
    assert_eq!(ids(RiskProfileTag::Aggressive), vec![3, 4, 5, 6]);
}
