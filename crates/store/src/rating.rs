use dashmap::DashMap;
use vitrine_core::Rating;

/// Per-record score aggregates.
///
/// Each [`add`](Self::add) is an atomic read-modify-write on one key: the
/// entry API holds the shard lock for the duration of the update, so
/// concurrent ratings of the same record never lose a score.
#[derive(Debug, Default)]
pub struct RatingStore {
    ratings: DashMap<String, Rating>,
}

impl RatingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold `score` into the aggregate for `record_id` and return a copy of
    /// the updated aggregate.
    pub fn add(&self, record_id: &str, score: f64) -> Rating {
        *self
            .ratings
            .entry(record_id.to_owned())
            .and_modify(|rating| rating.record(score))
            .or_insert_with(|| Rating::first(score))
    }

    /// Snapshot of the aggregate for `record_id`, if it was ever rated.
    pub fn get(&self, record_id: &str) -> Option<Rating> {
        self.ratings.get(record_id).map(|entry| *entry)
    }

    /// Number of records with at least one score.
    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }
}
