use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tracing::info;

use newspulse_common::{Category, Config, ContentItem, PipelineError, Report};

use crate::enricher::ItemEnricher;
use crate::preview::{MarkupFetcher, PreviewResolver};
use crate::reactions::{CommentFetcher, ReactionSource};
use crate::sampling::SamplingPolicy;
use crate::tone::{CompletionService, ToneScorer};

/// Knobs for one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Items enriched at once. Keeps the external services under their rate
    /// limits; has no effect on output order.
    pub max_concurrent_items: usize,
    pub sampling: SamplingPolicy,
    pub preview_timeout: Duration,
    pub reaction_timeout: Duration,
    pub scoring_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_items: 8,
            sampling: SamplingPolicy::default(),
            preview_timeout: Duration::from_secs(10),
            reaction_timeout: Duration::from_secs(15),
            scoring_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&Config> for PipelineConfig {
    fn from(config: &Config) -> Self {
        let sampling = match config.sample_seed {
            Some(seed) => SamplingPolicy::Seeded {
                size: config.sample_size,
                seed,
            },
            None => SamplingPolicy::Prefix {
                size: config.sample_size,
            },
        };
        Self {
            max_concurrent_items: config.max_concurrent_items,
            sampling,
            preview_timeout: config.preview_timeout,
            reaction_timeout: config.reaction_timeout,
            scoring_timeout: config.scoring_timeout,
        }
    }
}

/// Enriches a batch of categorized items concurrently and assembles them
/// into a [`Report`] in input order.
pub struct PipelineRunner {
    enricher: ItemEnricher,
    max_concurrent_items: usize,
}

impl PipelineRunner {
    pub fn new(
        config: PipelineConfig,
        markup: Arc<dyn MarkupFetcher>,
        comments: Arc<dyn CommentFetcher>,
        completions: Arc<dyn CompletionService>,
    ) -> Self {
        let enricher = ItemEnricher::new(
            PreviewResolver::new(markup, config.preview_timeout),
            ReactionSource::new(comments, config.reaction_timeout),
            ToneScorer::new(completions, config.scoring_timeout),
            config.sampling,
        );
        Self {
            enricher,
            max_concurrent_items: config.max_concurrent_items.max(1),
        }
    }

    /// Enrich every item. Fails only if an input item is unusable; network
    /// and payload failures degrade inside the items instead.
    pub async fn run(&self, items: Vec<(Category, ContentItem)>) -> Result<Report, PipelineError> {
        validate(&items)?;

        info!(
            items = items.len(),
            max_concurrent = self.max_concurrent_items,
            "Enriching items"
        );

        // `buffered` keeps up to N enrichments in flight but yields in input
        // order regardless of which finishes first.
        let enriched: Vec<_> = stream::iter(
            items
                .iter()
                .map(|(category, item)| self.enricher.enrich(*category, item)),
        )
        .buffered(self.max_concurrent_items)
        .collect()
        .await;

        let report = Report::new(enriched);
        let stats = report.stats();
        info!(
            items = stats.items,
            with_preview = stats.with_preview,
            reactions = stats.reactions,
            scored_reactions = stats.scored_reactions,
            with_aggregate = stats.with_aggregate,
            "Run complete"
        );

        Ok(report)
    }
}

fn validate(items: &[(Category, ContentItem)]) -> Result<(), PipelineError> {
    for (index, (_, item)) in items.iter().enumerate() {
        if item.id.trim().is_empty() {
            return Err(PipelineError::InvalidItem {
                index,
                reason: format!("item '{}' has no id", item.title),
            });
        }
    }
    Ok(())
}
