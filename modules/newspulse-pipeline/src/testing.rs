// Test mocks for the enrichment pipeline.
//
// One mock per trait seam:
// - MockMarkup (MarkupFetcher): URL → page markup
// - MockComments (CommentFetcher): item id → comment bodies, peak concurrency
// - MockCompletion (CompletionService): reaction text → reply, with delays
// - MockFeed (FeedSource): category → items
//
// Unregistered keys return `Err`. `hang_on` registers a call that never
// completes, for exercising timeouts. Every mock counts its calls.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::DateTime;

use newspulse_common::{Category, Config, ContentItem};

use crate::feed::FeedSource;
use crate::preview::MarkupFetcher;
use crate::reactions::CommentFetcher;
use crate::tone::CompletionService;

/// Long enough to outlive any timeout used in tests.
const HANG: Duration = Duration::from_secs(3600);

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// An item with external URL `https://news.example.com/{id}`, popularity 10,
/// created 2023-11-14, and no native preview.
pub fn content_item(id: &str, title: &str) -> ContentItem {
    ContentItem {
        id: id.to_string(),
        title: title.to_string(),
        external_url: format!("https://news.example.com/{id}"),
        popularity: 10,
        created_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default(),
        native_preview: None,
    }
}

/// Minimal page carrying only an `og:image` tag.
pub fn og_page(image_url: &str) -> String {
    format!(r#"<html><head><meta property="og:image" content="{image_url}"></head><body></body></html>"#)
}

/// Minimal page carrying only a `twitter:image` tag.
pub fn twitter_page(image_url: &str) -> String {
    format!(r#"<html><head><meta name="twitter:image" content="{image_url}"></head><body></body></html>"#)
}

pub fn test_config(sample_seed: Option<u64>) -> Config {
    Config {
        tone_api_key: "test-key".to_string(),
        tone_api_url: "http://localhost:0".to_string(),
        tone_model: "test-model".to_string(),
        reddit_base_url: "http://localhost:0/r/news".to_string(),
        user_agent: None,
        post_limit: 10,
        max_concurrent_items: 4,
        sample_size: 5,
        sample_seed,
        preview_timeout: Duration::from_secs(1),
        reaction_timeout: Duration::from_secs(1),
        scoring_timeout: Duration::from_secs(1),
    }
}

// ---------------------------------------------------------------------------
// MockMarkup
// ---------------------------------------------------------------------------

pub struct MockMarkup {
    pages: HashMap<String, String>,
    hanging: HashSet<String>,
    calls: AtomicUsize,
}

impl MockMarkup {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            hanging: HashSet::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn on_page(mut self, url: &str, markup: String) -> Self {
        self.pages.insert(url.to_string(), markup);
        self
    }

    pub fn hang_on(mut self, url: &str) -> Self {
        self.hanging.insert(url.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockMarkup {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarkupFetcher for MockMarkup {
    async fn fetch_markup(&self, url: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.hanging.contains(url) {
            tokio::time::sleep(HANG).await;
        }
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("MockMarkup: no page for {url}"))
    }
}

// ---------------------------------------------------------------------------
// MockComments
// ---------------------------------------------------------------------------

pub struct MockComments {
    items: HashMap<String, Vec<String>>,
    hanging: HashSet<String>,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockComments {
    pub fn new() -> Self {
        Self {
            items: HashMap::new(),
            hanging: HashSet::new(),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// Every fetch takes at least `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Most fetches that were ever running at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn on_item(mut self, item_id: &str, comments: Vec<String>) -> Self {
        self.items.insert(item_id.to_string(), comments);
        self
    }

    pub fn hang_on(mut self, item_id: &str) -> Self {
        self.hanging.insert(item_id.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockComments {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommentFetcher for MockComments {
    async fn top_level_comments(&self, item_id: &str) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let _guard = InFlight::enter(&self.in_flight, &self.peak_in_flight);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.hanging.contains(item_id) {
            tokio::time::sleep(HANG).await;
        }
        self.items
            .get(item_id)
            .cloned()
            .ok_or_else(|| anyhow!("MockComments: no thread for {item_id}"))
    }
}

/// Counts a call as running until dropped, including when a timeout
/// cancels it.
struct InFlight<'a> {
    current: &'a AtomicUsize,
}

impl<'a> InFlight<'a> {
    fn enter(current: &'a AtomicUsize, peak: &AtomicUsize) -> Self {
        let now = current.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        Self { current }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// MockCompletion
// ---------------------------------------------------------------------------

enum Reply {
    Text { text: String, delay: Duration },
    Fail,
    Hang,
}

/// Replies keyed by the reaction text embedded in the scoring prompt.
pub struct MockCompletion {
    replies: Vec<(String, Reply)>,
    calls: AtomicUsize,
}

impl MockCompletion {
    pub fn new() -> Self {
        Self {
            replies: Vec::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn on_text(self, text: &str, reply: &str) -> Self {
        self.on_text_after(text, reply, Duration::ZERO)
    }

    /// Reply only after `delay`, to force out-of-order completion.
    pub fn on_text_after(mut self, text: &str, reply: &str, delay: Duration) -> Self {
        self.replies.push((
            text.to_string(),
            Reply::Text {
                text: reply.to_string(),
                delay,
            },
        ));
        self
    }

    pub fn fail_on(mut self, text: &str) -> Self {
        self.replies.push((text.to_string(), Reply::Fail));
        self
    }

    pub fn hang_on(mut self, text: &str) -> Self {
        self.replies.push((text.to_string(), Reply::Hang));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockCompletion {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionService for MockCompletion {
    async fn complete(&self, _system: &str, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let reply = self
            .replies
            .iter()
            .find(|(text, _)| prompt.contains(&format!("Text: \"{text}\"")))
            .map(|(_, reply)| reply);

        match reply {
            Some(Reply::Text { text, delay }) => {
                if !delay.is_zero() {
                    tokio::time::sleep(*delay).await;
                }
                Ok(text.clone())
            }
            Some(Reply::Fail) => bail!("MockCompletion: scripted failure"),
            Some(Reply::Hang) => {
                tokio::time::sleep(HANG).await;
                bail!("MockCompletion: hung call returned")
            }
            None => bail!("MockCompletion: no reply registered for prompt"),
        }
    }
}

// ---------------------------------------------------------------------------
// MockFeed
// ---------------------------------------------------------------------------

pub struct MockFeed {
    listings: HashMap<Category, Vec<ContentItem>>,
}

impl MockFeed {
    pub fn new() -> Self {
        Self {
            listings: HashMap::new(),
        }
    }

    pub fn on_category(mut self, category: Category, items: Vec<ContentItem>) -> Self {
        self.listings.insert(category, items);
        self
    }
}

impl Default for MockFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeedSource for MockFeed {
    async fn listing(&self, category: Category, limit: u32) -> Result<Vec<ContentItem>> {
        let items = self
            .listings
            .get(&category)
            .ok_or_else(|| anyhow!("MockFeed: no listing for {category}"))?;
        Ok(items.iter().take(limit as usize).cloned().collect())
    }
}
