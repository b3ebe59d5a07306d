//! User feedback ratings.
//!
//! - [`record`]: Feedback records and submission validation
//! - [`stats`]: Rating aggregates over a query result
//! - [`store`]: Storage trait, in-memory store and queries

pub mod record;
pub mod stats;
pub mod store;

pub use record::{Feedback, FeedbackError, FeedbackSubmission};
pub use stats::FeedbackStats;
pub use store::{
    query_feedback, FeedbackPage, FeedbackQuery, FeedbackStore, InMemoryFeedbackStore,
    SharedFeedbackStore,
};
