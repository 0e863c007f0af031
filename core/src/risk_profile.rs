//! Risk profile classification from client history.
//!
//! Every history item votes for the risk level of its nearest catalog
//! product. The majority level picks the profile band; the weighted
//! proportion of levels places the score inside that band.
//!
//!   low ≥ medium && low ≥ high  → Conservative  0..=33
//!   medium ≥ high               → Moderate     34..=66
//!   otherwise                   → Aggressive   67..=100

use crate::{
    catalog::ProductCatalog,
    error::{SimError, SimResult},
    feature::{product_features, FeatureSource},
    history::{ClientHistory, SimulationQuery},
    nearest_neighbor::{MajorityVote, NearestNeighborMatcher},
    product::{Product, RiskLevel},
    types::ClientId,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskProfileTag {
    Conservative,
    Moderate,
    Aggressive,
}

impl RiskProfileTag {
    /// Inclusive score band.
    pub fn band(&self) -> (u8, u8) {
        match self {
            Self::Conservative => (0, 33),
            Self::Moderate => (34, 66),
            Self::Aggressive => (67, 100),
        }
    }

    /// Catalog risk levels suitable for this profile.
    pub fn accepted_risk_levels(&self) -> &'static [RiskLevel] {
        match self {
            Self::Conservative => &[RiskLevel::Low],
            Self::Moderate => &[RiskLevel::Low, RiskLevel::Medium],
            Self::Aggressive => &[RiskLevel::Medium, RiskLevel::High],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Conservative => "conservative",
            Self::Moderate => "moderate",
            Self::Aggressive => "aggressive",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskProfile {
    pub client_id: ClientId,
    pub profile: RiskProfileTag,
    /// 0..=100, inside the profile's band.
    pub score: u8,
}

/// Votes per risk level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskTally {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

impl RiskTally {
    pub fn total(&self) -> usize {
        self.low + self.medium + self.high
    }

    fn from_counts(counts: &BTreeMap<RiskLevel, usize>) -> Self {
        let get = |level: RiskLevel| counts.get(&level).copied().unwrap_or(0);
        Self {
            low: get(RiskLevel::Low),
            medium: get(RiskLevel::Medium),
            high: get(RiskLevel::High),
        }
    }

    /// Majority level, ties resolved toward the lower risk.
    pub fn profile(&self) -> RiskProfileTag {
        if self.low >= self.medium && self.low >= self.high {
            RiskProfileTag::Conservative
        } else if self.medium >= self.high {
            RiskProfileTag::Moderate
        } else {
            RiskProfileTag::Aggressive
        }
    }

    /// 0×P(low) + 50×P(medium) + 100×P(high). Zero for an empty tally.
    pub fn proportion_score(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (50.0 * self.medium as f64 + 100.0 * self.high as f64) / total as f64
    }

    pub fn score(&self) -> u8 {
        let (min, max) = self.profile().band();
        let width = (max - min) as f64;
        let offset = ((self.proportion_score() / 100.0) * width).round();
        (min as f64 + offset).clamp(min as f64, max as f64) as u8
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RiskProfileClassifier;

impl RiskProfileClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Tally nearest-product risk levels for `sources` against `catalog`.
    pub fn tally<S: FeatureSource>(&self, catalog: &[Product], sources: &[S]) -> RiskTally {
        let matcher = NearestNeighborMatcher::new(catalog, product_features);
        let counts = matcher.vote(sources, MajorityVote::new(|p: &Product| p.risk_level));
        RiskTally::from_counts(&counts)
    }

    /// Classify `client_id` from investments, falling back to past
    /// simulations.
    pub fn classify(
        &self,
        client_id: ClientId,
        catalog: &dyn ProductCatalog,
        history: &dyn ClientHistory,
    ) -> SimResult<RiskProfile> {
        let products = catalog.list_all()?;

        let investments = history.investments_by_client(client_id)?;
        let tally = if !investments.is_empty() {
            self.tally(&products, &investments)
        } else {
            let simulations = history.simulations_by_client(client_id)?;
            if simulations.is_empty() {
                return Err(SimError::NoHistoryAvailable { client_id });
            }
            let by_id: HashMap<_, _> = products.iter().map(|p| (p.id, p)).collect();
            let queries = simulations
                .iter()
                .map(|s| SimulationQuery::from_record(s, by_id.get(&s.product_id).copied()))
                .collect::<SimResult<Vec<_>>>()?;
            self.tally(&products, &queries)
        };

        if tally.total() == 0 {
            log::warn!("risk: client={client_id} history matched no catalog product");
            return Err(SimError::NoProductAvailable);
        }

        let profile = RiskProfile {
            client_id,
            profile: tally.profile(),
            score: tally.score(),
        };
        log::info!(
            "risk: client={client_id} tally={}/{}/{} -> {} ({})",
            tally.low,
            tally.medium,
            tally.high,
            profile.profile.as_str(),
            profile.score
        );
        Ok(profile)
    }
}

/// Catalog products suited to `profile`, in catalog order.
pub fn products_for_profile(
    catalog: &dyn ProductCatalog,
    profile: RiskProfileTag,
) -> SimResult<Vec<Product>> {
    let accepted = profile.accepted_risk_levels();
    Ok(catalog
        .list_all()?
        .into_iter()
        .filter(|p| accepted.contains(&p.risk_level))
        .collect())
}
