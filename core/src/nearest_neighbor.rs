//! Weighted nearest-neighbor voting over a candidate list.
//!
//! One matcher serves two call sites:
//!   - product recommendation: `WeightedVote`, summing truncated
//!     invested amounts per winning candidate;
//!   - risk classification: `MajorityVote`, counting wins per key
//!     read off the winning candidate (its risk level).
//!
//! RULES:
//!   - A source never votes for its own product.
//!   - Equal distances resolve to the earliest candidate in input order.
//!   - A source with no eligible candidate casts no vote.
//!   - The matcher never fails; an empty result is the caller's call.

use crate::{
    feature::{distance, FeatureSource},
    product::Product,
    types::{FeatureVector, ProductId},
};
use std::collections::BTreeMap;

/// A matchable catalog entry.
pub trait Candidate {
    fn candidate_id(&self) -> ProductId;
}

impl Candidate for Product {
    fn candidate_id(&self) -> ProductId {
        self.id
    }
}

/// Collects one vote per source.
pub trait VoteAggregator<C> {
    type Output;

    fn record(&mut self, winner_index: usize, winner: &C, weight: i64);

    fn finish(self, candidates: &[C]) -> Self::Output;
}

/// A candidate's accumulated result under `WeightedVote`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankedCandidate {
    pub index: usize,
    pub weight: i64,
    pub wins: usize,
}

/// Sums source weights per winner; ranks descending by weight.
#[derive(Debug, Default)]
pub struct WeightedVote {
    tallies: BTreeMap<usize, (i64, usize)>,
}

impl WeightedVote {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C> VoteAggregator<C> for WeightedVote {
    type Output = Vec<RankedCandidate>;

    fn record(&mut self, winner_index: usize, _winner: &C, weight: i64) {
        let entry = self.tallies.entry(winner_index).or_insert((0, 0));
        entry.0 = entry.0.saturating_add(weight);
        entry.1 += 1;
    }

    fn finish(self, _candidates: &[C]) -> Vec<RankedCandidate> {
        // BTreeMap yields candidate order; the stable sort keeps it for ties.
        let mut ranked: Vec<RankedCandidate> = self
            .tallies
            .into_iter()
            .map(|(index, (weight, wins))| RankedCandidate { index, weight, wins })
            .collect();
        ranked.sort_by(|a, b| b.weight.cmp(&a.weight));
        ranked
    }
}

/// Counts one win per source under the key `key_of(winner)`.
pub struct MajorityVote<K, F> {
    key_of: F,
    counts: BTreeMap<K, usize>,
}

impl<K: Ord, F> MajorityVote<K, F> {
    pub fn new(key_of: F) -> Self {
        Self {
            key_of,
            counts: BTreeMap::new(),
        }
    }
}

impl<C, K, F> VoteAggregator<C> for MajorityVote<K, F>
where
    K: Ord,
    F: Fn(&C) -> K,
{
    type Output = BTreeMap<K, usize>;

    fn record(&mut self, _winner_index: usize, winner: &C, _weight: i64) {
        *self.counts.entry((self.key_of)(winner)).or_insert(0) += 1;
    }

    fn finish(self, _candidates: &[C]) -> BTreeMap<K, usize> {
        self.counts
    }
}

pub struct NearestNeighborMatcher<'a, C> {
    candidates: &'a [C],
    features: Vec<FeatureVector>,
}

impl<'a, C: Candidate> NearestNeighborMatcher<'a, C> {
    /// Precompute candidate vectors with `extract`.
    pub fn new<F>(candidates: &'a [C], extract: F) -> Self
    where
        F: Fn(&C) -> FeatureVector,
    {
        Self {
            candidates,
            features: candidates.iter().map(extract).collect(),
        }
    }

    pub fn candidates(&self) -> &'a [C] {
        self.candidates
    }

    /// Index of the closest eligible candidate for `source`.
    pub fn nearest<S: FeatureSource + ?Sized>(&self, source: &S) -> Option<usize> {
        let target = source.features();
        let excluded = source.own_product_id();

        let mut best: Option<(usize, f64)> = None;
        for (index, (candidate, features)) in
            self.candidates.iter().zip(self.features.iter()).enumerate()
        {
            if excluded == Some(candidate.candidate_id()) {
                continue;
            }
            let d = distance(&target, features);
            // Strict comparison: the first of equally distant candidates stays.
            if best.is_none_or(|(_, best_d)| d < best_d) {
                best = Some((index, d));
            }
        }
        best.map(|(index, _)| index)
    }

    /// Run every source through `nearest` and feed the winners to
    /// `aggregator`.
    pub fn vote<S, A>(&self, sources: &[S], mut aggregator: A) -> A::Output
    where
        S: FeatureSource,
        A: VoteAggregator<C>,
    {
        let mut abstained = 0usize;
        for source in sources {
            match self.nearest(source) {
                Some(index) => {
                    aggregator.record(index, &self.candidates[index], source.vote_weight())
                }
                None => abstained += 1,
            }
        }
        if abstained > 0 {
            log::debug!(
                "matcher: {abstained} of {} sources had no eligible candidate",
                sources.len()
            );
        }
        aggregator.finish(self.candidates)
    }

    /// Weighted ranking of candidates, best first.
    pub fn rank<S: FeatureSource>(&self, sources: &[S]) -> Vec<(&'a C, i64)> {
        let candidates = self.candidates;
        self.vote(sources, WeightedVote::new())
            .into_iter()
            .map(|r| (&candidates[r.index], r.weight))
            .collect()
    }
}
