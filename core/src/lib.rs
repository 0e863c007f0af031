//! Investment simulation and recommendation engine.
//!
//! Pure components (feature normalization, matching, scenarios, index
//! rates, rentability, risk classification) are wired together by
//! `orchestrator::SimulationOrchestrator`. `store::SimStore` provides
//! the SQLite-backed catalog, history and repository.

pub mod catalog;
pub mod config;
pub mod error;
pub mod event;
pub mod feature;
pub mod history;
pub mod index_rate;
pub mod market_scenario;
pub mod nearest_neighbor;
pub mod orchestrator;
pub mod product;
pub mod rentability;
pub mod risk_profile;
pub mod rng;
pub mod store;
pub mod types;
