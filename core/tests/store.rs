//! SQLite store: catalog queries, history aggregates, atomic saves.

use chrono::{NaiveDate, TimeZone, Utc};
use investsim_core::{
    catalog::{ProductCatalog, ProductFilter},
    config::SimConfig,
    event::SimEvent,
    history::{ClientHistory, Investment, ProductSnapshot, SimulationRecord, SimulationRepository},
    product::{BenchmarkIndex, RateType},
    store::SimStore,
};

fn seeded_store() -> (SimStore, SimConfig) {
    let store = SimStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    let config = SimConfig::default_test();
    store.seed_catalog(&config.products).expect("seed");
    (store, config)
}

fn record(client_id: i64, product_id: i64, final_value: f64, day: u32) -> SimulationRecord {
    SimulationRecord {
        id: None,
        client_id,
        product_id,
        product_name: format!("product {product_id}"),
        invested_amount: 1_000.0,
        term_months: Some(12),
        term_days: None,
        term_years: None,
        final_value,
        effective_rate: 10.0,
        yield_amount: final_value - 1_000.0,
        scenario_description: "Stable with stable outlook over the medium term".into(),
        synthetic_index_rate: false,
        simulated_at: Utc.with_ymd_and_hms(2024, 5, day, 10, 30, 0).unwrap(),
    }
}

#[test]
fn catalog_round_trips_through_sqlite() {
    let (store, config) = seeded_store();

    assert_eq!(store.product_count().unwrap(), config.products.len() as i64);
    assert_eq!(store.list_all().unwrap(), config.products);
    assert_eq!(
        store.find_by_id(8).unwrap().map(|p| p.liquidity_days),
        Some(-1)
    );
    assert!(store.find_by_id(404).unwrap().is_none());

    let by_name = store.find_by_name("etf ibovespa").unwrap().unwrap();
    assert_eq!(by_name.benchmark_index, BenchmarkIndex::Ibovespa);

    // Seeding again replaces rather than duplicates.
    store.seed_catalog(&config.products).unwrap();
    assert_eq!(store.product_count().unwrap(), config.products.len() as i64);
    assert_eq!(store.events_of_type("catalog_seeded").unwrap().len(), 2);
}

#[test]
fn filter_matches_in_memory_definition() {
    let (store, config) = seeded_store();
    let filters = [
        ProductFilter::default(),
        ProductFilter {
            rate_type: Some(RateType::Indexed),
            ..ProductFilter::default()
        },
        ProductFilter {
            benchmark_index: Some(BenchmarkIndex::Cdi),
            fgc_protected: Some(true),
            ..ProductFilter::default()
        },
        ProductFilter {
            max_liquidity_days: Some(30),
            ..ProductFilter::default()
        },
        ProductFilter {
            max_liquidity_days: Some(-1),
            ..ProductFilter::default()
        },
    ];

    for filter in &filters {
        let expected: Vec<i64> = config
            .products
            .iter()
            .filter(|p| filter.matches(p))
            .map(|p| p.id)
            .collect();
        let actual: Vec<i64> = store
            .find_by_filter(filter)
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(actual, expected, "filter {filter:?}");
    }

    let illiquid = store
        .find_by_filter(&ProductFilter {
            max_liquidity_days: Some(-1),
            ..ProductFilter::default()
        })
        .unwrap();
    assert_eq!(illiquid.len(), 1);
    assert_eq!(illiquid[0].id, 8);
}

#[test]
fn investment_history_and_aggregates() {
    let (store, config) = seeded_store();
    let cdb = &config.products[1];
    for (day, amount) in [(20, 1_500.0), (3, 500.0), (11, 250.5)] {
        store
            .insert_investment(&Investment {
                id: None,
                client_id: 5,
                product_id: cdb.id,
                amount,
                invested_on: NaiveDate::from_ymd_opt(2024, 2, day).unwrap(),
                snapshot: ProductSnapshot::of(cdb),
            })
            .unwrap();
    }

    let history = store.investments_by_client(5).unwrap();
    let days: Vec<String> = history
        .iter()
        .map(|i| i.invested_on.format("%d").to_string())
        .collect();
    assert_eq!(days, vec!["03", "11", "20"]);
    assert_eq!(history[0].snapshot, ProductSnapshot::of(cdb));

    assert_eq!(store.investment_count(5).unwrap(), 3);
    assert!((store.total_invested(5).unwrap() - 2_250.5).abs() < 1e-9);
    assert_eq!(store.investment_count(6).unwrap(), 0);
    assert_eq!(store.total_invested(6).unwrap(), 0.0);
}

#[test]
fn save_assigns_ids_and_logs_event() {
    let (store, _) = seeded_store();

    let first = store.save(record(1, 2, 1_100.0, 1)).unwrap();
    let second = store.save(record(1, 3, 1_120.0, 2)).unwrap();
    assert!(first.id.is_some());
    assert!(second.id > first.id);

    let last = store.last_simulation(1).unwrap().unwrap();
    assert_eq!(last, second);
    assert!(store.last_simulation(2).unwrap().is_none());
    assert_eq!(store.simulations_by_client(1).unwrap(), vec![first, second.clone()]);

    let events = store.events_of_type("simulation_recorded").unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].component, "orchestrator");
    match events[1].decode().unwrap() {
        SimEvent::SimulationRecorded { simulation_id, product_id, .. } => {
            assert_eq!(Some(simulation_id), second.id);
            assert_eq!(product_id, 3);
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn failed_save_writes_nothing() {
    let (store, _) = seeded_store();
    let events_before = store.event_count().unwrap();

    let mut bad = record(1, 2, 1_100.0, 1);
    bad.term_days = Some(30);
    assert!(store.save(bad).is_err());

    assert_eq!(store.simulation_count().unwrap(), 0);
    assert_eq!(store.event_count().unwrap(), events_before);
}

#[test]
fn daily_summary_groups_product_and_day() {
    let (store, _) = seeded_store();
    store.save(record(1, 2, 1_100.0, 1)).unwrap();
    store.save(record(2, 2, 1_300.0, 1)).unwrap();
    store.save(record(1, 3, 1_050.0, 1)).unwrap();
    store.save(record(1, 2, 1_200.0, 2)).unwrap();

    let summary = store.simulations_per_product_per_day().unwrap();
    let rows: Vec<(String, i64, i64)> = summary
        .iter()
        .map(|s| (s.day.clone(), s.product_id, s.simulation_count))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("2024-05-01".to_string(), 2, 2),
            ("2024-05-01".to_string(), 3, 1),
            ("2024-05-02".to_string(), 2, 1),
        ]
    );
    assert!((summary[0].average_final_value - 1_200.0).abs() < 1e-9);
}
