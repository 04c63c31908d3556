use chrono::{DateTime, Utc};
use serde::Deserialize;

// --- Wire types ---

/// A Reddit listing envelope: `{"kind": "Listing", "data": {"children": [...]}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Listing<T> {
    pub data: ListingData<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListingData<T> {
    #[serde(default = "Vec::new")]
    pub children: Vec<Thing<T>>,
}

/// One child of a listing. `kind` is `t3` for posts, `t1` for comments and
/// `more` for collapsed comment stubs.
#[derive(Debug, Clone, Deserialize)]
pub struct Thing<T> {
    #[serde(default)]
    pub kind: String,
    pub data: T,
}

/// The fields of a `t3` post we read. Everything is optional on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostData {
    pub id: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub score: Option<i64>,
    pub created_utc: Option<f64>,
    pub preview: Option<Preview>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Preview {
    #[serde(default)]
    pub images: Vec<PreviewImage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PreviewImage {
    pub source: Option<ImageSource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageSource {
    pub url: Option<String>,
}

/// The fields of a `t1` comment we read. `more` stubs have no body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentData {
    pub body: Option<String>,
}

// --- Normalized types ---

/// A post from a subreddit listing with defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct RedditPost {
    /// Empty when the listing omitted it.
    pub id: String,
    pub title: String,
    pub external_url: String,
    pub score: i64,
    pub created_at: DateTime<Utc>,
    /// First preview image URL, HTML-unescaped. `None` when absent.
    pub preview_url: Option<String>,
}

impl From<PostData> for RedditPost {
    fn from(data: PostData) -> Self {
        let preview_url = data
            .preview
            .and_then(|p| p.images.into_iter().next())
            .and_then(|img| img.source)
            .and_then(|src| src.url)
            .map(|url| url.replace("&amp;", "&"));

        let created_at = data
            .created_utc
            .and_then(timestamp_from_secs)
            .unwrap_or_default();

        Self {
            id: data.id.unwrap_or_default(),
            title: data.title.unwrap_or_else(|| "No Title".to_string()),
            external_url: data.url.unwrap_or_else(|| "No external URL".to_string()),
            score: data.score.unwrap_or(0),
            created_at,
            preview_url,
        }
    }
}

/// Reddit reports `created_utc` as fractional epoch seconds.
fn timestamp_from_secs(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.trunc() as i64;
    let nanos = ((secs - secs.trunc()) * 1e9).round() as u32;
    DateTime::from_timestamp(whole, nanos.min(999_999_999))
}
