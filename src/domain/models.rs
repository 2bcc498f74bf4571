use std::collections::HashMap;

/// Survey item identifier, e.g. "Q12_1".
pub type ItemId = String;

/// Ordinal acceptability rating on the 1 (completely unacceptable)
/// to 5 (completely acceptable) scale.
pub type Rating = u8;

/// Identity of a respondent. Panel members carry the row id they were
/// loaded under; query subjects built by the serving layer carry a
/// session token instead, so the two namespaces never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RespondentId {
    Panel(u32),
    Session(u64),
}

/// An individual with a (possibly partial) mapping of item id to rating.
///
/// Panel respondents are fully built at load time and read-only afterward.
/// A query respondent is built incrementally by the caller before being
/// handed to the engine.
#[derive(Debug, Clone)]
pub struct Respondent {
    id: RespondentId,
    ratings: HashMap<ItemId, Rating>,
}

impl Respondent {
    pub fn panel(id: u32) -> Self {
        Self {
            id: RespondentId::Panel(id),
            ratings: HashMap::new(),
        }
    }

    pub fn session(token: u64) -> Self {
        Self {
            id: RespondentId::Session(token),
            ratings: HashMap::new(),
        }
    }

    pub fn id(&self) -> RespondentId {
        self.id
    }

    /// Record a rating. A later write to the same item id overwrites.
    pub fn add_rating(&mut self, item: impl Into<ItemId>, rating: Rating) {
        self.ratings.insert(item.into(), rating);
    }

    pub fn rating(&self, item: &str) -> Option<Rating> {
        self.ratings.get(item).copied()
    }

    pub fn has_rating(&self, item: &str) -> bool {
        self.ratings.contains_key(item)
    }

    pub fn items(&self) -> impl Iterator<Item = &ItemId> {
        self.ratings.keys()
    }

    pub fn rating_count(&self) -> usize {
        self.ratings.len()
    }
}

/// Output of the prediction engine for one target item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Predicted rating, in [1, 5].
    pub value: f64,
    /// Heuristic confidence, at most 1.0. May fall below zero when the
    /// neighbors were both dissimilar and in disagreement; callers must
    /// read that as "very low confidence", not clamp it away.
    pub confidence: f64,
}
