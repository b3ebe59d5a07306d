//! Feedback records and submission validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clock;

/// Lowest accepted rating.
pub const MIN_RATING: i64 = 1;
/// Highest accepted rating.
pub const MAX_RATING: i64 = 5;

/// User id recorded when a submission does not name one.
pub const ANONYMOUS_USER: &str = "anonymous";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedbackError {
    #[error("chatId and rating (1-5) are required")]
    Invalid,
}

/// A stored rating for one chat session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: String,
    pub chat_id: String,
    pub user_id: String,
    pub rating: u8,
    pub comment: String,
    /// Submission time in epoch milliseconds.
    pub timestamp: u64,
}

/// Raw fields of a feedback submission, as received.
#[derive(Debug, Clone, Default)]
pub struct FeedbackSubmission {
    pub chat_id: Option<String>,
    pub user_id: Option<String>,
    pub rating: Option<i64>,
    pub comment: Option<String>,
}

impl Feedback {
    /// Validate a submission and stamp it with a fresh id and timestamp.
    ///
    /// Empty `chat_id` counts as missing. Empty `user_id` falls back to
    /// [`ANONYMOUS_USER`].
    pub fn from_submission(submission: FeedbackSubmission) -> Result<Self, FeedbackError> {
        let chat_id = submission
            .chat_id
            .filter(|id| !id.is_empty())
            .ok_or(FeedbackError::Invalid)?;
        let rating = submission
            .rating
            .filter(|r| (MIN_RATING..=MAX_RATING).contains(r))
            .ok_or(FeedbackError::Invalid)?;

        let millis = clock::epoch_millis();
        Ok(Self {
            id: feedback_id(millis, clock::epoch_micros()),
            chat_id,
            user_id: submission
                .user_id
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| ANONYMOUS_USER.to_string()),
            rating: rating as u8,
            comment: submission.comment.unwrap_or_default(),
            timestamp: millis,
        })
    }
}

/// `feedback-<millis>-<hex>`, the suffix taken from the sub-second microseconds.
fn feedback_id(millis: u64, micros: u64) -> String {
    format!("feedback-{millis}-{:06x}", micros % 1_000_000)
}
