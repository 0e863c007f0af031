//! Simulation orchestrator: the entry point for simulations, risk
//! profiles and recommendations.
//!
//! SIMULATION ORDER (fixed):
//!   1. Candidate selection (explicit product id, else catalog filter)
//!   2. Ranking against investment history, when the client has any
//!   3. Market scenario for the chosen product
//!   4. Index rate (indexed products only)
//!   5. Rentability projection
//!   6. Persist the record (record and audit event in one transaction)
//!
//! RULES:
//!   - Nothing is persisted unless every earlier step succeeded.
//!   - All randomness comes from the caller's `RandomSource`.
//!   - Draw order is scenario first, then index rate.

use crate::{
    catalog::{ProductCatalog, ProductFilter},
    config::MarketConfig,
    error::{SimError, SimResult},
    event::{EventSink, SimEvent},
    feature::product_features,
    history::{
        ClientHistory, HasTermFields, SimulationQuery, SimulationRecord, SimulationRepository,
        Term,
    },
    index_rate::{IndexRateQuote, IndexRateSimulator},
    market_scenario::{MarketScenarioGenerator, MarketScenarioResult},
    nearest_neighbor::NearestNeighborMatcher,
    product::{HasRateProfile, Product, RateType},
    rentability::RentabilityCalculator,
    risk_profile::{RiskProfile, RiskProfileClassifier},
    rng::RandomSource,
    types::{ClientId, ProductId},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One simulation request. Exactly one term field must be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub client_id: ClientId,
    pub amount: f64,
    #[serde(default)]
    pub term_months: Option<u32>,
    #[serde(default)]
    pub term_days: Option<u32>,
    #[serde(default)]
    pub term_years: Option<u32>,
    /// Takes precedence over `filter` when it resolves.
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub filter: ProductFilter,
}

impl SimulationRequest {
    pub fn for_months(client_id: ClientId, amount: f64, months: u32) -> Self {
        Self {
            client_id,
            amount,
            term_months: Some(months),
            ..Self::default()
        }
    }
}

impl HasTermFields for SimulationRequest {
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

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutcome {
    pub product: Product,
    pub record: SimulationRecord,
    pub scenario: MarketScenarioResult,
    pub index_quote: Option<IndexRateQuote>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub product: Product,
    /// Summed invested amount of the history items that voted for it.
    pub weight: i64,
}

pub struct SimulationOrchestrator<'a> {
    catalog: &'a dyn ProductCatalog,
    history: &'a dyn ClientHistory,
    repository: &'a dyn SimulationRepository,
    events: Option<&'a dyn EventSink>,
    scenarios: MarketScenarioGenerator,
    index_rates: IndexRateSimulator,
    rentability: RentabilityCalculator,
    classifier: RiskProfileClassifier,
}

impl<'a> SimulationOrchestrator<'a> {
    pub fn new(
        catalog: &'a dyn ProductCatalog,
        history: &'a dyn ClientHistory,
        repository: &'a dyn SimulationRepository,
        market: &MarketConfig,
    ) -> Self {
        Self {
            catalog,
            history,
            repository,
            events: None,
            scenarios: MarketScenarioGenerator::new(),
            index_rates: IndexRateSimulator::new(market.index_params.clone()),
            rentability: RentabilityCalculator::new(market.payoff_strategy),
            classifier: RiskProfileClassifier::new(),
        }
    }

    /// Also log risk profile results to `sink`.
    pub fn with_events(mut self, sink: &'a dyn EventSink) -> Self {
        self.events = Some(sink);
        self
    }

    pub fn simulate<R: RandomSource + ?Sized>(
        &self,
        request: &SimulationRequest,
        rng: &mut R,
    ) -> SimResult<SimulationOutcome> {
        if !request.amount.is_finite() || request.amount <= 0.0 {
            return Err(SimError::InvalidAmount {
                amount: request.amount,
            });
        }
        let term = request.term()?;
        request.filter.check_rate_profile()?;

        let product = self.choose_product(request)?;
        product.check_rate_profile()?;

        let months = term.months();
        let scenario = self.scenarios.generate(product.product_type, months, rng);
        let index_quote = match product.rate_type {
            RateType::Indexed => {
                Some(self.index_rates.simulate(product.benchmark_index, months, rng))
            }
            RateType::Fixed => None,
        };
        let projection = self
            .rentability
            .project(&product, request.amount, term, &scenario, index_quote)?;

        let (term_months, term_days, term_years) = match term {
            Term::Months(m) => (Some(m), None, None),
            Term::Days(d) => (None, Some(d), None),
            Term::Years(y) => (None, None, Some(y)),
        };
        let synthetic_index_rate = projection.synthetic_index_rate();
        let record = SimulationRecord {
            id: None,
            client_id: request.client_id,
            product_id: product.id,
            product_name: product.name.clone(),
            invested_amount: request.amount,
            term_months,
            term_days,
            term_years,
            final_value: projection.final_value,
            effective_rate: projection.effective_rate,
            yield_amount: projection.yield_amount,
            scenario_description: scenario.description.clone(),
            synthetic_index_rate,
            simulated_at: Utc::now(),
        };
        let record = self.repository.save(record)?;

        log::info!(
            "simulate: client={} product={} rate={:.4} final={:.2} id={:?}",
            record.client_id,
            product.id,
            record.effective_rate,
            record.final_value,
            record.id
        );

        Ok(SimulationOutcome {
            product,
            record,
            scenario,
            index_quote: projection.index_quote,
        })
    }

    fn choose_product(&self, request: &SimulationRequest) -> SimResult<Product> {
        if let Some(id) = request.product_id {
            match self.catalog.find_by_id(id)? {
                // A resolved explicit id is simulated as asked; history ranking is skipped.
                Some(product) => {
                    log::debug!("simulate: explicit product {id}");
                    return Ok(product);
                }
                None => log::debug!("simulate: product {id} not in catalog, filtering instead"),
            }
        }

        let candidates = self.catalog.find_by_filter(&request.filter)?;
        log::debug!(
            "simulate: {} candidates for client {}",
            candidates.len(),
            request.client_id
        );
        if candidates.is_empty() {
            return Err(SimError::NoProductAvailable);
        }

        let investments = self.history.investments_by_client(request.client_id)?;
        if investments.is_empty() {
            return candidates
                .into_iter()
                .next()
                .ok_or(SimError::NoProductAvailable);
        }

        let matcher = NearestNeighborMatcher::new(&candidates, product_features);
        let ranked = matcher.rank(&investments);
        match ranked.first() {
            Some((product, weight)) => {
                log::debug!(
                    "simulate: history ranked product {} first (weight {weight})",
                    product.id
                );
                Ok((*product).clone())
            }
            None => Err(SimError::NoProductAvailable),
        }
    }

    /// Classify the client's risk appetite from history.
    pub fn risk_profile(&self, client_id: ClientId) -> SimResult<RiskProfile> {
        let profile = self
            .classifier
            .classify(client_id, self.catalog, self.history)?;
        if let Some(sink) = self.events {
            sink.record(&SimEvent::RiskProfileComputed {
                client_id,
                profile: profile.profile,
                score: profile.score,
            })?;
        }
        Ok(profile)
    }

    /// Catalog products ranked by the client's history, best first.
    /// Investments are used when present, past simulations otherwise.
    pub fn recommend_products(
        &self,
        client_id: ClientId,
        limit: usize,
    ) -> SimResult<Vec<Recommendation>> {
        let products = self.catalog.list_all()?;
        let matcher = NearestNeighborMatcher::new(&products, product_features);

        let investments = self.history.investments_by_client(client_id)?;
        let ranked = if !investments.is_empty() {
            matcher.rank(&investments)
        } else {
            let simulations = self.history.simulations_by_client(client_id)?;
            if simulations.is_empty() {
                return Err(SimError::NoHistoryAvailable { client_id });
            }
            let by_id: HashMap<_, _> = products.iter().map(|p| (p.id, p)).collect();
            let queries = simulations
                .iter()
                .map(|s| SimulationQuery::from_record(s, by_id.get(&s.product_id).copied()))
                .collect::<SimResult<Vec<_>>>()?;
            matcher.rank(&queries)
        };

        if ranked.is_empty() {
            return Err(SimError::NoProductAvailable);
        }
        log::debug!("recommend: client={client_id} {} ranked products", ranked.len());

        Ok(ranked
            .into_iter()
            .take(limit)
            .map(|(product, weight)| Recommendation {
                product: product.clone(),
                weight,
            })
            .collect())
    }
}
