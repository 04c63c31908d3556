use std::sync::{Arc, LazyLock};
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use scraper::{Html, Selector};
use tracing::{debug, warn};
use url::Url;

use newspulse_common::{ContentItem, PREVIEW_UNAVAILABLE};

/// Social preview meta tags, in priority order.
const PREVIEW_META_TAGS: [&str; 2] = ["og:image", "twitter:image"];

static META_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("meta[content]").unwrap());

// --- MarkupFetcher trait ---

#[async_trait]
pub trait MarkupFetcher: Send + Sync {
    /// Return the raw markup of a page. Non-success statuses are errors.
    async fn fetch_markup(&self, url: &str) -> Result<String>;
}

/// Plain GET against the page itself, no rendering.
pub struct HttpMarkupFetcher {
    client: reqwest::Client,
    user_agent: String,
}

impl HttpMarkupFetcher {
    pub fn new(client: reqwest::Client, user_agent: &str) -> Self {
        Self {
            client,
            user_agent: user_agent.to_string(),
        }
    }
}

#[async_trait]
impl MarkupFetcher for HttpMarkupFetcher {
    async fn fetch_markup(&self, url: &str) -> Result<String> {
        let resp = self
            .client
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            bail!("page fetch returned {status}");
        }

        Ok(resp.text().await?)
    }
}

// --- PreviewResolver ---

/// Resolves a representative image for an item: the source's own preview
/// if it is a web URL, else the page's social meta tags, else
/// [`PREVIEW_UNAVAILABLE`]. Never fails.
pub struct PreviewResolver {
    fetcher: Arc<dyn MarkupFetcher>,
    timeout: Duration,
}

impl PreviewResolver {
    pub fn new(fetcher: Arc<dyn MarkupFetcher>, timeout: Duration) -> Self {
        Self { fetcher, timeout }
    }

    pub async fn resolve(&self, item: &ContentItem) -> String {
        if let Some(native) = item.native_preview.as_deref() {
            if is_web_url(native) {
                return native.to_string();
            }
        }

        self.scrape_preview(&item.external_url)
            .await
            .unwrap_or_else(|| PREVIEW_UNAVAILABLE.to_string())
    }

    async fn scrape_preview(&self, page_url: &str) -> Option<String> {
        if !is_web_url(page_url) {
            debug!(url = page_url, "No fetchable page for preview");
            return None;
        }

        let markup =
            match tokio::time::timeout(self.timeout, self.fetcher.fetch_markup(page_url)).await {
                Ok(Ok(markup)) => markup,
                Ok(Err(e)) => {
                    warn!(url = page_url, error = %e, "Preview page fetch failed");
                    return None;
                }
                Err(_) => {
                    warn!(
                        url = page_url,
                        timeout_secs = self.timeout.as_secs_f64(),
                        "Preview page fetch timed out"
                    );
                    return None;
                }
            };

        let found = extract_preview_meta(&markup, page_url);
        if found.is_none() {
            debug!(url = page_url, "Page has no usable preview meta tag");
        }
        found
    }
}

/// Find the preview image URL in a page's meta tags. The first tag in
/// [`PREVIEW_META_TAGS`] with non-empty content wins; relative values are
/// resolved against `page_url`. Returns `None` if the winning value is not
/// an http(s) URL.
pub fn extract_preview_meta(html: &str, page_url: &str) -> Option<String> {
    let document = Html::parse_document(html);

    let content = PREVIEW_META_TAGS.iter().find_map(|tag| {
        document.select(&META_SELECTOR).find_map(|meta| {
            let el = meta.value();
            let key = el.attr("property").or_else(|| el.attr("name"))?;
            if !key.trim().eq_ignore_ascii_case(tag) {
                return None;
            }
            let content = el.attr("content")?.trim();
            (!content.is_empty()).then(|| content.to_string())
        })
    })?;

    let base = Url::parse(page_url).ok();
    let resolved = match base {
        Some(base) => base.join(&content).ok()?,
        None => Url::parse(&content).ok()?,
    };

    is_web_url(resolved.as_str()).then(|| resolved.to_string())
}

fn is_web_url(candidate: &str) -> bool {
    Url::parse(candidate.trim())
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host().is_some())
        .unwrap_or(false)
}
