use std::collections::HashMap;

use crate::domain::{ItemId, Respondent, RespondentId};

/// Cache key for an unordered respondent pair: lookups for (a, b) and
/// (b, a) hit the same entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PairKey(RespondentId, RespondentId);

impl PairKey {
    pub fn new(a: RespondentId, b: RespondentId) -> Self {
        if a <= b { Self(a, b) } else { Self(b, a) }
    }

    pub fn involves(&self, id: RespondentId) -> bool {
        self.0 == id || self.1 == id
    }
}

/// Memo of the item ids each respondent pair has in common.
///
/// The intersection is a pure function of respondent content, and panel
/// respondents are immutable once loaded, so entries never invalidate.
/// Entries are added lazily; panel-pair entries live for the cache's
/// lifetime, while entries for transient query respondents are dropped
/// via [`SimilarityCache::forget`] once their session is done. The cache
/// is owned by one engine instance so separate engines cannot
/// cross-contaminate. Query respondents must use a fresh session token
/// per session so their entries are never reused with different content.
#[derive(Debug, Default)]
pub struct SimilarityCache {
    common: HashMap<PairKey, Vec<ItemId>>,
}

impl SimilarityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Item ids rated by both respondents, computed on first call for the
    /// pair and served from the cache afterward.
    pub fn common_items(&mut self, a: &Respondent, b: &Respondent) -> &[ItemId] {
        let key = PairKey::new(a.id(), b.id());
        self.common
            .entry(key)
            .or_insert_with(|| {
                a.items()
                    .filter(|item| b.has_rating(item.as_str()))
                    .cloned()
                    .collect()
            })
            .as_slice()
    }

    /// Drop every entry involving the given respondent. Called for
    /// transient query respondents once their session is done; their
    /// tokens are never seen again, so keeping the entries would grow
    /// the cache with every request instead of bounding it by the panel.
    pub fn forget(&mut self, id: RespondentId) {
        self.common.retain(|key, _| !key.involves(id));
    }

    pub fn entry_count(&self) -> usize {
        self.common.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn respondent(id: u32, items: &[(&str, u8)]) -> Respondent {
        let mut r = Respondent::panel(id);
        for (item, rating) in items {
            r.add_rating(*item, *rating);
        }
        r
    }

    #[test]
    fn intersects_known_items() {
        let a = respondent(1, &[("Q1_1", 1), ("Q1_2", 3), ("Q2_1", 5)]);
        let b = respondent(2, &[("Q1_2", 2), ("Q2_1", 4), ("Q3_1", 1)]);
        let mut cache = SimilarityCache::new();

        let mut common = cache.common_items(&a, &b).to_vec();
        common.sort();
        assert_eq!(common, vec!["Q1_2".to_string(), "Q2_1".to_string()]);
    }

    #[test]
    fn pair_order_does_not_matter() {
        let a = respondent(1, &[("Q1_1", 1), ("Q1_2", 3)]);
        let b = respondent(2, &[("Q1_2", 2)]);
        let mut cache = SimilarityCache::new();

        cache.common_items(&a, &b);
        assert_eq!(cache.entry_count(), 1);
        cache.common_items(&b, &a);
        assert_eq!(cache.entry_count(), 1);
    }

    #[test]
    fn forget_drops_only_entries_involving_the_respondent() {
        let a = respondent(1, &[("Q1_1", 1), ("Q1_2", 3)]);
        let b = respondent(2, &[("Q1_1", 2), ("Q1_2", 2)]);
        let mut query = Respondent::session(9);
        query.add_rating("Q1_1", 4);

        let mut cache = SimilarityCache::new();
        cache.common_items(&a, &b);
        cache.common_items(&query, &a);
        cache.common_items(&query, &b);
        assert_eq!(cache.entry_count(), 3);

        cache.forget(query.id());
        assert_eq!(cache.entry_count(), 1);
        // The panel pair survives and is still served from the memo.
        cache.common_items(&b, &a);
        assert_eq!(cache.entry_count(), 1);
    }

    #[test]
    fn self_pair_covers_all_items() {
        let a = respondent(1, &[("Q1_1", 1), ("Q1_2", 3)]);
        let mut cache = SimilarityCache::new();
        assert_eq!(cache.common_items(&a, &a).len(), 2);
    }
}
