use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reddit_client::RedditClient;
use tracing::{debug, warn};

/// Most reactions kept per item, in source order.
pub const MAX_REACTIONS: usize = 10;

// --- CommentFetcher trait ---

#[async_trait]
pub trait CommentFetcher: Send + Sync {
    /// Top-level comment bodies for an item, in thread order.
    async fn top_level_comments(&self, item_id: &str) -> Result<Vec<String>>;
}

#[async_trait]
impl CommentFetcher for RedditClient {
    async fn top_level_comments(&self, item_id: &str) -> Result<Vec<String>> {
        Ok(RedditClient::top_level_comments(self, item_id).await?)
    }
}

// --- ReactionSource ---

/// Fetches up to [`MAX_REACTIONS`] reaction texts for an item. Errors and
/// timeouts collapse to an empty list.
pub struct ReactionSource {
    fetcher: Arc<dyn CommentFetcher>,
    timeout: Duration,
}

impl ReactionSource {
    pub fn new(fetcher: Arc<dyn CommentFetcher>, timeout: Duration) -> Self {
        Self { fetcher, timeout }
    }

    pub async fn fetch(&self, item_id: &str) -> Vec<String> {
        let comments =
            match tokio::time::timeout(self.timeout, self.fetcher.top_level_comments(item_id))
                .await
            {
                Ok(Ok(comments)) => comments,
                Ok(Err(e)) => {
                    warn!(item_id, error = %e, "Reaction fetch failed");
                    return Vec::new();
                }
                Err(_) => {
                    warn!(
                        item_id,
                        timeout_secs = self.timeout.as_secs_f64(),
                        "Reaction fetch timed out"
                    );
                    return Vec::new();
                }
            };

        let reactions: Vec<String> = comments
            .into_iter()
            .filter(|text| !text.trim().is_empty())
            .take(MAX_REACTIONS)
            .collect();

        debug!(item_id, count = reactions.len(), "Fetched reactions");
        reactions
    }
}
