//! Feedback storage.
//!
//! The router only sees the [`FeedbackStore`] trait. The in-memory
//! implementation keeps records in arrival order behind a single
//! `RwLock`, so appends are serialized while reads proceed concurrently.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

use super::record::Feedback;
use super::stats::FeedbackStats;

/// Default number of records returned by a query.
pub const DEFAULT_QUERY_LIMIT: usize = 50;

#[async_trait]
pub trait FeedbackStore: Send + Sync {
    /// Append a record. Records are never updated or removed.
    async fn append(&self, feedback: Feedback);

    /// All records in arrival order.
    async fn list_all(&self) -> Vec<Feedback>;

    /// Records whose chat id equals `chat_id`, in arrival order.
    async fn list_by_chat_id(&self, chat_id: &str) -> Vec<Feedback>;

    /// Number of stored records.
    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

pub type SharedFeedbackStore = Arc<dyn FeedbackStore>;

/// Process-lifetime store. Contents are lost on restart.
#[derive(Default)]
pub struct InMemoryFeedbackStore {
    records: RwLock<Vec<Feedback>>,
}

impl InMemoryFeedbackStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedFeedbackStore {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl FeedbackStore for InMemoryFeedbackStore {
    async fn append(&self, feedback: Feedback) {
        let mut records = self.records.write().await;
        debug!(id = feedback.id, chat_id = feedback.chat_id, "Storing feedback");
        records.push(feedback);
    }

    async fn list_all(&self) -> Vec<Feedback> {
        self.records.read().await.clone()
    }

    async fn list_by_chat_id(&self, chat_id: &str) -> Vec<Feedback> {
        self.records
            .read()
            .await
            .iter()
            .filter(|fb| fb.chat_id == chat_id)
            .cloned()
            .collect()
    }

    async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

/// Parameters of a feedback listing.
#[derive(Debug, Clone)]
pub struct FeedbackQuery {
    /// Exact chat id to filter by. `None` or empty lists everything.
    pub chat_id: Option<String>,
    pub limit: usize,
}

impl Default for FeedbackQuery {
    fn default() -> Self {
        Self {
            chat_id: None,
            limit: DEFAULT_QUERY_LIMIT,
        }
    }
}

/// Result of a feedback listing.
#[derive(Debug, Clone, Serialize)]
pub struct FeedbackPage {
    pub feedbacks: Vec<Feedback>,
    pub stats: FeedbackStats,
    /// Size of the whole store, regardless of filter and limit.
    pub total: usize,
}

impl FeedbackPage {
    /// Newest-first view of `records`, truncated to `limit`.
    ///
    /// Ties on timestamp keep arrival order.
    pub fn build(mut records: Vec<Feedback>, limit: usize, store_total: usize) -> Self {
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        records.truncate(limit);
        let stats = FeedbackStats::from_records(&records);
        Self {
            feedbacks: records,
            stats,
            total: store_total,
        }
    }
}

/// Run a listing against any store.
pub async fn query_feedback(store: &dyn FeedbackStore, query: &FeedbackQuery) -> FeedbackPage {
    let records = match query.chat_id.as_deref().filter(|id| !id.is_empty()) {
        Some(chat_id) => store.list_by_chat_id(chat_id).await,
        None => store.list_all().await,
    };
    let total = store.len().await;
    FeedbackPage::build(records, query.limit, total)
}
