use std::cmp::Ordering;
use std::sync::{Mutex, PoisonError};

use log::{debug, warn};

use crate::config::EngineSettings;
use crate::domain::{Prediction, Respondent, RespondentId};
use crate::errors::InsufficientDataError;
use crate::panel::PanelRepository;
use crate::prediction::similarity::SimilarityCache;

/// Neighbors selected for one query, with their distances in parallel.
pub struct Neighborhood<'a> {
    pub neighbors: Vec<&'a Respondent>,
    pub distances: Vec<f64>,
    constrained: bool,
}

impl Neighborhood<'_> {
    /// True when the candidate pool was smaller than the configured
    /// neighbor minimum, so the selection is best-effort.
    pub fn constrained(&self) -> bool {
        self.constrained
    }
}

/// Predicts a query respondent's unreported rating for a target item by
/// aggregating the ratings of the most similar panel members.
///
/// The engine owns the panel and its similarity cache; the cache sits
/// behind a lock so one engine instance can serve concurrent requests.
pub struct PredictionEngine {
    panel: PanelRepository,
    settings: EngineSettings,
    cache: Mutex<SimilarityCache>,
}

impl PredictionEngine {
    pub fn new(panel: PanelRepository, settings: EngineSettings) -> Self {
        Self {
            panel,
            settings,
            cache: Mutex::new(SimilarityCache::new()),
        }
    }

    pub fn panel(&self) -> &PanelRepository {
        &self.panel
    }

    /// Distance between two respondents: the mean absolute rating
    /// difference over their common items, or infinity when they share
    /// fewer than `min_common` items. Symmetric by construction.
    pub fn distance(&self, a: &Respondent, b: &Respondent) -> f64 {
        let mut cache = self.lock_cache();
        self.distance_with(&mut cache, a, b)
    }

    fn distance_with(&self, cache: &mut SimilarityCache, a: &Respondent, b: &Respondent) -> f64 {
        let common = cache.common_items(a, b);
        if common.len() < self.settings.min_common {
            // Too little shared evidence to compare; a legitimate
            // outcome, not an error.
            return f64::INFINITY;
        }

        let mut total = 0.0;
        for item in common {
            if let (Some(ra), Some(rb)) = (a.rating(item), b.rating(item)) {
                total += (f64::from(ra) - f64::from(rb)).abs();
            }
        }
        total / common.len() as f64
    }

    /// Select the panel members a prediction for `query` should aggregate.
    ///
    /// Candidates with distance within `max_distance` are admitted in
    /// evaluation order. If that admits fewer than `min_neighbors`, the
    /// closest remaining candidates are appended, nearest first, ties
    /// broken toward the earlier candidate, until the minimum is met or
    /// the pool runs out. Fallback neighbors may sit beyond the distance
    /// threshold, or at infinity on a sparse panel; that is deliberate
    /// best-effort relaxation.
    ///
    /// With `target` set the pool is restricted to respondents who rated
    /// that item, so every selected neighbor can contribute a rating.
    /// Without it the pool is the whole panel; that variant only supports
    /// enumeration-style probing and the selected neighbors need not know
    /// any particular item.
    pub fn find_neighbors<'a>(
        &'a self,
        query: &Respondent,
        target: Option<&str>,
    ) -> Result<Neighborhood<'a>, InsufficientDataError> {
        let candidates: Vec<&Respondent> = match target {
            Some(item) => self.panel.valid_respondents_for(item),
            None => self.panel.respondents().iter().collect(),
        };
        if candidates.is_empty() {
            return Err(InsufficientDataError::EmptyCandidatePool(
                target.unwrap_or_default().to_string(),
            ));
        }
        let constrained = candidates.len() < self.settings.min_neighbors;
        if constrained {
            warn!(
                "Only {} candidates for target {:?}, below the minimum of {}",
                candidates.len(),
                target,
                self.settings.min_neighbors
            );
        }

        let mut cache = self.lock_cache();
        let mut neighbors = Vec::new();
        let mut distances = Vec::new();
        let mut remaining: Vec<(&Respondent, f64)> = Vec::new();
        for candidate in candidates {
            let distance = self.distance_with(&mut cache, query, candidate);
            if distance <= self.settings.max_distance {
                neighbors.push(candidate);
                distances.push(distance);
            } else {
                remaining.push((candidate, distance));
            }
        }

        if neighbors.len() < self.settings.min_neighbors {
            let needed = self.settings.min_neighbors - neighbors.len();
            // Stable sort keeps evaluation order among equal distances.
            remaining.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
            for (candidate, distance) in remaining.into_iter().take(needed) {
                neighbors.push(candidate);
                distances.push(distance);
            }
        }

        debug!(
            "Selected {} neighbors for target {:?}",
            neighbors.len(),
            target
        );
        Ok(Neighborhood {
            neighbors,
            distances,
            constrained,
        })
    }

    /// Predict the query respondent's rating for `target`, with a
    /// confidence estimate.
    ///
    /// The prediction is the mean of the neighbors' ratings. Confidence
    /// starts at 1 and pays two penalties: `rho` times the mean neighbor
    /// distance and `mu` times the population standard deviation of the
    /// neighbor ratings, each capped at 1 before weighting. The combined
    /// value is not clamped and may fall below zero.
    pub fn predict(
        &self,
        query: &Respondent,
        target: &str,
        rho: f64,
        mu: f64,
    ) -> Result<Prediction, InsufficientDataError> {
        let neighborhood = self.find_neighbors(query, Some(target))?;
        let ratings = Self::neighbor_ratings(&neighborhood, target)?;

        let rho_part = mean(&neighborhood.distances).min(1.0);
        let mu_part = population_std_dev(&ratings).min(1.0);
        Ok(Prediction {
            value: mean(&ratings),
            confidence: 1.0 - rho * rho_part - mu * mu_part,
        })
    }

    /// Prediction only, skipping the confidence computation.
    pub fn predict_value(
        &self,
        query: &Respondent,
        target: &str,
    ) -> Result<f64, InsufficientDataError> {
        let neighborhood = self.find_neighbors(query, Some(target))?;
        let ratings = Self::neighbor_ratings(&neighborhood, target)?;
        Ok(mean(&ratings))
    }

    fn neighbor_ratings(
        neighborhood: &Neighborhood<'_>,
        target: &str,
    ) -> Result<Vec<f64>, InsufficientDataError> {
        let ratings: Vec<f64> = neighborhood
            .neighbors
            .iter()
            .filter_map(|n| n.rating(target))
            .map(f64::from)
            .collect();
        if ratings.is_empty() {
            // Only reachable through the unrestricted candidate pool.
            return Err(InsufficientDataError::NoNeighborRatings(target.to_string()));
        }
        Ok(ratings)
    }

    /// Evict all similarity-cache entries involving the given respondent.
    /// Callers running transient query respondents through the engine
    /// should drop their entries once the session is done, keeping the
    /// cache bounded by panel pairs rather than by request volume.
    pub fn forget_respondent(&self, id: RespondentId) {
        self.lock_cache().forget(id);
    }

    /// Number of respondent pairs currently memoized.
    pub fn cached_pairs(&self) -> usize {
        self.lock_cache().entry_count()
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, SimilarityCache> {
        // Cache entries are pure values, so a poisoned lock is still usable.
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn population_std_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RespondentId;

    fn respondent(id: u32, items: &[(&str, u8)]) -> Respondent {
        let mut r = Respondent::panel(id);
        for (item, rating) in items {
            r.add_rating(*item, *rating);
        }
        r
    }

    fn engine(panel: Vec<Respondent>, settings: EngineSettings) -> PredictionEngine {
        PredictionEngine::new(PanelRepository::from_respondents(panel), settings)
    }

    fn loose_settings(min_neighbors: usize) -> EngineSettings {
        EngineSettings {
            max_distance: 0.0,
            min_common: 1,
            min_neighbors,
        }
    }

    #[test]
    fn distance_is_symmetric() {
        let a = respondent(1, &[("Q1_1", 1), ("Q1_2", 4), ("Q1_3", 3)]);
        let b = respondent(2, &[("Q1_1", 5), ("Q1_2", 2), ("Q1_3", 3)]);
        let engine = engine(vec![a.clone(), b.clone()], loose_settings(1));

        assert_eq!(engine.distance(&a, &b), engine.distance(&b, &a));
        assert!((engine.distance(&a, &b) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn distance_is_zero_to_self() {
        let a = respondent(1, &[("Q1_1", 1), ("Q1_2", 4), ("Q1_3", 3)]);
        let engine = engine(
            vec![a.clone()],
            EngineSettings {
                min_common: 3,
                ..loose_settings(1)
            },
        );
        assert_eq!(engine.distance(&a, &a), 0.0);
    }

    #[test]
    fn too_little_overlap_is_infinite() {
        // Four shared items, five required.
        let a = respondent(
            1,
            &[("Q1_1", 1), ("Q1_2", 2), ("Q1_3", 3), ("Q1_4", 4), ("Q9_1", 5)],
        );
        let b = respondent(
            2,
            &[("Q1_1", 1), ("Q1_2", 2), ("Q1_3", 3), ("Q1_4", 4), ("Q9_2", 5)],
        );
        let engine = engine(
            vec![a.clone(), b.clone()],
            EngineSettings {
                min_common: 5,
                ..loose_settings(1)
            },
        );
        assert_eq!(engine.distance(&a, &b), f64::INFINITY);
    }

    #[test]
    fn fallback_admits_nearest_candidates() {
        // Threshold of 0 admits only the exact match; the fallback must
        // then pull in the next nearest by absolute difference.
        let panel = vec![
            respondent(1, &[("X", 1), ("A", 1)]),
            respondent(2, &[("X", 3), ("A", 3)]),
            respondent(3, &[("X", 5), ("A", 5)]),
        ];
        let engine = engine(panel, loose_settings(2));

        let mut query = Respondent::session(1);
        query.add_rating("A", 1);

        let hood = engine.find_neighbors(&query, Some("X")).unwrap();
        let ids: Vec<_> = hood.neighbors.iter().map(|n| n.id()).collect();
        assert_eq!(ids, vec![RespondentId::Panel(1), RespondentId::Panel(2)]);
        assert_eq!(hood.distances, vec![0.0, 2.0]);

        let prediction = engine.predict_value(&query, "X").unwrap();
        assert!((prediction - 2.0).abs() < 1e-12);
    }

    #[test]
    fn fallback_breaks_ties_toward_earlier_candidates() {
        let panel = vec![
            respondent(1, &[("X", 5), ("A", 3)]),
            respondent(2, &[("X", 1), ("A", 1)]),
        ];
        let engine = engine(panel, loose_settings(1));

        let mut query = Respondent::session(1);
        query.add_rating("A", 2);

        // Both candidates sit at distance 1; the first evaluated wins.
        let hood = engine.find_neighbors(&query, Some("X")).unwrap();
        assert_eq!(hood.neighbors[0].id(), RespondentId::Panel(1));
    }

    #[test]
    fn returns_whole_pool_when_smaller_than_minimum() {
        let panel = vec![
            respondent(1, &[("X", 2), ("A", 1)]),
            respondent(2, &[("A", 5)]),
        ];
        let engine = engine(panel, loose_settings(5));

        let mut query = Respondent::session(1);
        query.add_rating("A", 1);

        let hood = engine.find_neighbors(&query, Some("X")).unwrap();
        assert_eq!(hood.neighbors.len(), 1);
        assert!(hood.constrained());
    }

    #[test]
    fn empty_candidate_pool_is_an_error() {
        let panel = vec![respondent(1, &[("A", 1)])];
        let engine = engine(panel, loose_settings(1));

        let mut query = Respondent::session(1);
        query.add_rating("A", 1);

        let err = engine.predict(&query, "X", 0.5, 0.5).unwrap_err();
        assert!(matches!(err, InsufficientDataError::EmptyCandidatePool(_)));
    }

    #[test]
    fn prediction_stays_on_scale_and_confidence_capped() {
        let panel = vec![
            respondent(1, &[("X", 1), ("A", 1)]),
            respondent(2, &[("X", 5), ("A", 5)]),
            respondent(3, &[("X", 3), ("A", 3)]),
        ];
        let engine = engine(panel, loose_settings(3));

        let mut query = Respondent::session(1);
        query.add_rating("A", 4);

        let prediction = engine.predict(&query, "X", 1.0, 1.0).unwrap();
        assert!((1.0..=5.0).contains(&prediction.value));
        assert!(prediction.confidence <= 1.0);
    }

    #[test]
    fn confidence_blends_distance_and_disagreement() {
        // Both neighbors at distance 0; ratings 1 and 3 have population
        // std dev 1.0, so with mu = 0.5 the confidence lands on 0.5.
        let panel = vec![
            respondent(1, &[("X", 1), ("A", 1)]),
            respondent(2, &[("X", 3), ("A", 1)]),
        ];
        let engine = engine(panel, loose_settings(2));

        let mut query = Respondent::session(1);
        query.add_rating("A", 1);

        let prediction = engine.predict(&query, "X", 0.5, 0.5).unwrap();
        assert!((prediction.value - 2.0).abs() < 1e-12);
        assert!((prediction.confidence - 0.5).abs() < 1e-12);
    }

    #[test]
    fn single_neighbor_pays_no_disagreement_penalty() {
        let panel = vec![respondent(1, &[("X", 4), ("A", 2)])];
        let engine = engine(panel, loose_settings(1));

        let mut query = Respondent::session(1);
        query.add_rating("A", 2);

        let prediction = engine.predict(&query, "X", 0.5, 0.5).unwrap();
        assert_eq!(prediction.value, 4.0);
        assert_eq!(prediction.confidence, 1.0);
    }

    #[test]
    fn infinite_fallback_distance_caps_the_rho_penalty() {
        // The only candidate shares nothing with the query, so its
        // distance is infinite; the rho term must cap at 1, not poison
        // the confidence with a NaN or -inf.
        let panel = vec![respondent(1, &[("X", 2)])];
        let engine = engine(panel, loose_settings(1));

        let mut query = Respondent::session(1);
        query.add_rating("A", 3);

        let prediction = engine.predict(&query, "X", 0.5, 0.5).unwrap();
        assert_eq!(prediction.value, 2.0);
        assert!((prediction.confidence - 0.5).abs() < 1e-12);
    }

    #[test]
    fn forgetting_query_respondents_keeps_the_cache_bounded() {
        let panel = vec![
            respondent(1, &[("X", 1), ("A", 1)]),
            respondent(2, &[("X", 3), ("A", 3)]),
            respondent(3, &[("X", 5), ("A", 5)]),
        ];
        let engine = engine(panel, loose_settings(2));

        // A long-lived server mints a fresh token per request; without
        // eviction each one would leave panel-size entries behind.
        for token in 1..=100 {
            let mut query = Respondent::session(token);
            query.add_rating("A", 1);
            engine.predict(&query, "X", 0.5, 0.5).unwrap();
            engine.forget_respondent(query.id());
        }

        assert_eq!(engine.cached_pairs(), 0);
    }

    #[test]
    fn predictions_are_idempotent() {
        let panel = vec![
            respondent(1, &[("X", 1), ("A", 2)]),
            respondent(2, &[("X", 4), ("A", 3)]),
            respondent(3, &[("X", 5), ("A", 1)]),
        ];
        let engine = engine(panel, loose_settings(2));

        let mut query = Respondent::session(1);
        query.add_rating("A", 2);

        let first = engine.predict(&query, "X", 0.5, 0.5).unwrap();
        let second = engine.predict(&query, "X", 0.5, 0.5).unwrap();
        assert_eq!(first, second);
    }
}
