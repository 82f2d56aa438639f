use serde::{Deserialize, Serialize};

/// Running aggregate of the scores submitted for one record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Rating {
    /// Number of scores submitted.
    pub count: u32,
    /// Sum of all submitted scores.
    pub sum: f64,
}

impl Rating {
    /// Aggregate holding a single score.
    pub const fn first(score: f64) -> Self {
        Self {
            count: 1,
            sum: score,
        }
    }

    /// Fold another score into the aggregate.
    pub fn record(&mut self, score: f64) {
        self.count = self.count.saturating_add(1);
        self.sum += score;
    }

    /// Mean score, or `0.0` for an empty aggregate.
    pub fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / f64::from(self.count)
        }
    }
}
