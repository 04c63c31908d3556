use futures::future::join_all;
use tracing::debug;

use newspulse_common::{Category, ContentItem, EnrichedItem, ScoredReaction};

use crate::preview::PreviewResolver;
use crate::reactions::ReactionSource;
use crate::sampling::SamplingPolicy;
use crate::tone::ToneScorer;

/// Per-item enrichment: preview, reactions, and tone scores for a sample of
/// the reactions.
pub struct ItemEnricher {
    previews: PreviewResolver,
    reactions: ReactionSource,
    scorer: ToneScorer,
    sampling: SamplingPolicy,
}

impl ItemEnricher {
    pub fn new(
        previews: PreviewResolver,
        reactions: ReactionSource,
        scorer: ToneScorer,
        sampling: SamplingPolicy,
    ) -> Self {
        Self {
            previews,
            reactions,
            scorer,
            sampling,
        }
    }

    /// Never fails: every sub-call already degrades to a sentinel or an
    /// absent value.
    pub async fn enrich(&self, category: Category, item: &ContentItem) -> EnrichedItem {
        let (preview_url, texts) = tokio::join!(
            self.previews.resolve(item),
            self.reactions.fetch(&item.id)
        );

        let sample = self.sampling.select(texts.len());
        let scores = join_all(sample.iter().map(|&i| self.scorer.score(&texts[i]))).await;

        // join_all yields in sample order, so scores line up with indices.
        let mut tones: Vec<Option<f64>> = vec![None; texts.len()];
        for (&index, score) in sample.iter().zip(scores) {
            tones[index] = score;
        }

        let reactions: Vec<ScoredReaction> = texts
            .into_iter()
            .zip(tones)
            .map(|(text, tone)| ScoredReaction::new(text, tone))
            .collect();

        let enriched = EnrichedItem::new(category, item.clone(), preview_url, reactions);
        debug!(
            item_id = item.id.as_str(),
            reactions = enriched.reactions.len(),
            sampled = sample.len(),
            aggregate = ?enriched.aggregate_tone,
            "Enriched item"
        );
        enriched
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::testing::*;

    fn enricher(
        comments: MockComments,
        completion: Arc<MockCompletion>,
        sampling: SamplingPolicy,
    ) -> ItemEnricher {
        let timeout = Duration::from_millis(200);
        ItemEnricher::new(
            PreviewResolver::new(Arc::new(MockMarkup::new()), timeout),
            ReactionSource::new(Arc::new(comments), timeout),
            ToneScorer::new(completion, timeout),
            sampling,
        )
    }

    #[tokio::test]
    async fn only_sample_is_scored() {
        let completion = Arc::new(
            MockCompletion::new()
                .on_text("one", "10")
                .on_text("two", "20")
                .on_text("three", "90"),
        );
        let comments = MockComments::new().on_item(
            "a",
            vec!["one".to_string(), "two".to_string(), "three".to_string()],
        );
        let enricher = enricher(comments, completion.clone(), SamplingPolicy::Prefix { size: 2 });

        let enriched = enricher.enrich(Category::Hot, &content_item("a", "Story")).await;

        assert_eq!(completion.calls(), 2);
        assert_eq!(
            enriched.reactions,
            vec![
                ScoredReaction::new("one", Some(10.0)),
                ScoredReaction::new("two", Some(20.0)),
                ScoredReaction::new("three", None),
            ]
        );
        assert_eq!(enriched.aggregate_tone, Some(15.0));
    }

    #[tokio::test]
    async fn scores_match_reactions_under_out_of_order_completion() {
        // The first reaction answers last.
        let completion = Arc::new(
            MockCompletion::new()
                .on_text_after("slow", "30", Duration::from_millis(60))
                .on_text("fast", "70"),
        );
        let comments =
            MockComments::new().on_item("a", vec!["slow".to_string(), "fast".to_string()]);
        let enricher = enricher(comments, completion, SamplingPolicy::Prefix { size: 5 });

        let enriched = enricher.enrich(Category::New, &content_item("a", "Story")).await;

        assert_eq!(enriched.reactions[0], ScoredReaction::new("slow", Some(30.0)));
        assert_eq!(enriched.reactions[1], ScoredReaction::new("fast", Some(70.0)));
        assert_eq!(enriched.aggregate_tone, Some(50.0));
    }

    #[tokio::test]
    async fn sample_calls_run_concurrently() {
        let delay = Duration::from_millis(100);
        let completion = Arc::new(
            MockCompletion::new()
                .on_text_after("one", "10", delay)
                .on_text_after("two", "20", delay)
                .on_text_after("three", "30", delay),
        );
        let comments = MockComments::new().on_item(
            "a",
            vec!["one".to_string(), "two".to_string(), "three".to_string()],
        );
        let enricher = enricher(comments, completion, SamplingPolicy::Prefix { size: 3 });

        let started = std::time::Instant::now();
        let enriched = enricher.enrich(Category::Hot, &content_item("a", "Story")).await;

        assert_eq!(enriched.aggregate_tone, Some(20.0));
        assert!(
            started.elapsed() < delay * 2,
            "scoring ran sequentially: {:?}",
            started.elapsed()
        );
    }

    #[tokio::test]
    async fn no_reactions_means_no_aggregate() {
        let completion = Arc::new(MockCompletion::new());
        let comments = MockComments::new().on_item("a", Vec::new());
        let enricher = enricher(comments, completion.clone(), SamplingPolicy::default());

        let enriched = enricher.enrich(Category::Rising, &content_item("a", "Story")).await;

        assert!(enriched.reactions.is_empty());
        assert_eq!(enriched.aggregate_tone, None);
        assert_eq!(completion.calls(), 0);
    }
}
