use anyhow::Result;
use async_trait::async_trait;
use reddit_client::{RedditClient, RedditPost};
use tracing::{info, warn};

use newspulse_common::{Category, ContentItem};

// --- FeedSource trait ---

#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Ranked items for one category, best first.
    async fn listing(&self, category: Category, limit: u32) -> Result<Vec<ContentItem>>;
}

#[async_trait]
impl FeedSource for RedditClient {
    async fn listing(&self, category: Category, limit: u32) -> Result<Vec<ContentItem>> {
        let posts = RedditClient::listing(self, category.as_str(), limit).await?;
        Ok(posts.into_iter().map(content_item_from_post).collect())
    }
}

pub fn content_item_from_post(post: RedditPost) -> ContentItem {
    ContentItem {
        id: post.id,
        title: post.title,
        external_url: post.external_url,
        popularity: post.score,
        created_at: post.created_at,
        native_preview: post.preview_url,
    }
}

/// Fetch each category in turn and flatten into pipeline input: category
/// order first, then rank. A category whose listing fails contributes no
/// items, and posts the listing returned without an id are dropped.
pub async fn collect_items(
    source: &dyn FeedSource,
    categories: &[Category],
    limit: u32,
) -> Vec<(Category, ContentItem)> {
    let mut all_items = Vec::new();

    for &category in categories {
        match source.listing(category, limit).await {
            Ok(items) => {
                let fetched = items.len();
                let items: Vec<_> = items
                    .into_iter()
                    .filter(|item| !item.id.trim().is_empty())
                    .collect();
                if items.len() < fetched {
                    warn!(
                        category = category.as_str(),
                        dropped = fetched - items.len(),
                        "Dropped posts without an id"
                    );
                }
                info!(category = category.as_str(), count = items.len(), "Fetched items");
                all_items.extend(items.into_iter().map(|item| (category, item)));
            }
            Err(e) => {
                warn!(category = category.as_str(), error = %e, "Listing failed, skipping category");
            }
        }
    }

    all_items
}
