//! Aggregate statistics over a set of feedback records.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

use super::record::{Feedback, MAX_RATING, MIN_RATING};

/// Summary of the records returned by a feedback query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackStats {
    /// Number of records summarized.
    pub total: usize,

    /// Mean rating, 0 when there are no records.
    #[serde(serialize_with = "serialize_average")]
    pub average_rating: f64,

    /// Count per rating, keyed "1" through "5".
    pub rating_distribution: BTreeMap<String, usize>,
}

impl FeedbackStats {
    pub fn from_records(records: &[Feedback]) -> Self {
        let mut rating_distribution: BTreeMap<String, usize> = (MIN_RATING..=MAX_RATING)
            .map(|r| (r.to_string(), 0))
            .collect();

        let mut sum = 0u64;
        for fb in records {
            sum += u64::from(fb.rating);
            *rating_distribution.entry(fb.rating.to_string()).or_insert(0) += 1;
        }

        let average_rating = if records.is_empty() {
            0.0
        } else {
            sum as f64 / records.len() as f64
        };

        Self {
            total: records.len(),
            average_rating,
            rating_distribution,
        }
    }
}

// An empty set reports a plain integer 0 rather than 0.0.
fn serialize_average<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if *value == 0.0 {
        serializer.serialize_u64(0)
    } else {
        serializer.serialize_f64(*value)
    }
}
