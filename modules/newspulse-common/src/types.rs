use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Placeholder for a preview that could not be resolved.
pub const PREVIEW_UNAVAILABLE: &str = "unavailable";

// --- Category ---

/// The sort order a content item was ranked under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Hot,
    New,
    Rising,
}

impl Category {
    /// Every category, in report order.
    pub const ALL: [Category; 3] = [Category::Hot, Category::New, Category::Rising];

    /// Listing path segment, e.g. `hot`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Hot => "hot",
            Category::New => "new",
            Category::Rising => "rising",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hot" => Ok(Category::Hot),
            "new" => Ok(Category::New),
            "rising" => Ok(Category::Rising),
            other => Err(format!(
                "unknown category '{other}' (expected hot, new or rising)"
            )),
        }
    }
}

// --- Content ---

/// One ranked item from the content source. Read-only input to the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ContentItem {
    pub id: String,
    pub title: String,
    pub external_url: String,
    /// Net votes; negative for downvoted items.
    pub popularity: i64,
    pub created_at: DateTime<Utc>,
    /// Preview supplied by the source itself, if any. Not validated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_preview: Option<String>,
}

/// A reaction and its tone score. `tone` is `None` when the reaction was not
/// scored or scoring failed; that is distinct from a score of zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScoredReaction {
    pub text: String,
    pub tone: Option<f64>,
}

impl ScoredReaction {
    pub fn new(text: impl Into<String>, tone: Option<f64>) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }
}

/// A content item with its resolved preview, sampled reactions and
/// aggregate tone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EnrichedItem {
    pub category: Category,
    #[serde(flatten)]
    pub item: ContentItem,
    /// A URL, or [`PREVIEW_UNAVAILABLE`].
    pub preview_url: String,
    /// Source order, not score order.
    pub reactions: Vec<ScoredReaction>,
    pub aggregate_tone: Option<f64>,
}

impl EnrichedItem {
    /// Build an enriched item. The aggregate is always derived from
    /// `reactions`, never supplied.
    pub fn new(
        category: Category,
        item: ContentItem,
        preview_url: String,
        reactions: Vec<ScoredReaction>,
    ) -> Self {
        let aggregate_tone = aggregate_tone(&reactions);
        Self {
            category,
            item,
            preview_url,
            reactions,
            aggregate_tone,
        }
    }

    pub fn has_preview(&self) -> bool {
        self.preview_url != PREVIEW_UNAVAILABLE
    }
}

/// Mean of the present tone scores, rounded to two decimals. `None` when no
/// reaction carries a score.
pub fn aggregate_tone(reactions: &[ScoredReaction]) -> Option<f64> {
    let scores: Vec<f64> = reactions.iter().filter_map(|r| r.tone).collect();
    if scores.is_empty() {
        return None;
    }
    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    Some(round2(mean))
}

/// Round to two decimals the way `{:.2}` prints: exact ties go to the even
/// digit, so 45.125 becomes 45.12.
pub fn round2(value: f64) -> f64 {
    format!("{value:.2}").parse().unwrap_or(value)
}

// --- Report ---

/// The output of one run. Items are in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub items: Vec<EnrichedItem>,
}

impl Report {
    pub fn new(items: Vec<EnrichedItem>) -> Self {
        Self {
            generated_at: Utc::now(),
            items,
        }
    }

    pub fn stats(&self) -> ReportStats {
        ReportStats {
            items: self.items.len(),
            with_preview: self.items.iter().filter(|i| i.has_preview()).count(),
            reactions: self.items.iter().map(|i| i.reactions.len()).sum(),
            scored_reactions: self
                .items
                .iter()
                .flat_map(|i| &i.reactions)
                .filter(|r| r.tone.is_some())
                .count(),
            with_aggregate: self
                .items
                .iter()
                .filter(|i| i.aggregate_tone.is_some())
                .count(),
        }
    }
}

/// Coverage counters for logging after a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportStats {
    pub items: usize,
    pub with_preview: usize,
    pub reactions: usize,
    pub scored_reactions: usize,
    pub with_aggregate: usize,
}
