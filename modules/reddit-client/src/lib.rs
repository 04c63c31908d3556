pub mod error;
pub mod types;

pub use error::{RedditError, Result};
pub use types::{CommentData, Listing, PostData, RedditPost};

use std::time::Duration;

use reqwest::header::USER_AGENT;

const BASE_URL: &str = "https://www.reddit.com/r/news";

/// Reddit throttles the default reqwest agent hard; present as a browser.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/110.0.0.0 Safari/537.36";

pub struct RedditClient {
    client: reqwest::Client,
    base_url: String,
    user_agent: String,
    timeout: Option<Duration>,
}

impl RedditClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: None,
        }
    }

    /// Subreddit root, e.g. `https://www.reddit.com/r/worldnews`.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        let mut request = self.client.get(url).header(USER_AGENT, &self.user_agent);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let resp = request.send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RedditError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(resp.text().await?)
    }

    /// Fetch one page of a sorted listing (`hot`, `new`, `rising`, ...).
    pub async fn listing(&self, sort: &str, limit: u32) -> Result<Vec<RedditPost>> {
        let url = format!("{}/{}.json?limit={}", self.base_url, sort, limit);
        tracing::debug!(sort, limit, "Fetching listing");

        let body = self.get_text(&url).await?;
        let posts = parse_listing(&body)?;
        tracing::info!(sort, count = posts.len(), "Fetched listing");

        Ok(posts)
    }

    /// Fetch the bodies of a post's top-level comments, in thread order.
    pub async fn top_level_comments(&self, post_id: &str) -> Result<Vec<String>> {
        let url = format!("{}/comments/{}/.json", self.base_url, post_id);
        tracing::debug!(post_id, "Fetching comments");

        let body = self.get_text(&url).await?;
        parse_comments(&body)
    }
}

/// Parse a listing body into posts, in listing order.
pub fn parse_listing(body: &str) -> Result<Vec<RedditPost>> {
    let listing: Listing<PostData> = serde_json::from_str(body)?;
    Ok(listing
        .data
        .children
        .into_iter()
        .map(|thing| RedditPost::from(thing.data))
        .collect())
}

/// Parse a comment-thread body. The endpoint returns `[post_listing,
/// comment_listing]`; only the second is read. Stubs without a body and
/// blank bodies are skipped.
pub fn parse_comments(body: &str) -> Result<Vec<String>> {
    let (_post, comments): (serde_json::Value, Listing<CommentData>) =
        serde_json::from_str(body)?;

    Ok(comments
        .data
        .children
        .into_iter()
        .filter_map(|thing| thing.data.body)
        .filter(|body| !body.trim().is_empty())
        .collect())
}
