//! End-to-end pipeline tests against mock collaborators.
//!
//! No network: every seam is a mock from `newspulse_pipeline::testing`.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use newspulse_common::{Category, ContentItem, ScoredReaction, PREVIEW_UNAVAILABLE};
use newspulse_pipeline::testing::*;
use newspulse_pipeline::{
    ItemEnricher, PipelineConfig, PipelineRunner, PreviewResolver, ReactionSource,
    SamplingPolicy, ToneScorer,
};

fn config(scoring_timeout: Duration) -> PipelineConfig {
    PipelineConfig {
        max_concurrent_items: 4,
        sampling: SamplingPolicy::Prefix { size: 5 },
        preview_timeout: Duration::from_millis(200),
        reaction_timeout: Duration::from_millis(200),
        scoring_timeout,
    }
}

fn strings(texts: &[&str]) -> Vec<String> {
    texts.iter().map(|t| t.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Three-item scenario
// ---------------------------------------------------------------------------

#[tokio::test]
async fn three_items_keep_order_and_derived_values() {
    let comments = MockComments::new()
        .on_item("scored", strings(&["Great outcome", "Decent start"]))
        .on_item("quiet", Vec::new())
        .on_item("stalled", strings(&["Nobody knows yet"]));
    let completion = MockCompletion::new()
        .on_text("Great outcome", "80")
        .on_text("Decent start", "60")
        .hang_on("Nobody knows yet");

    let runner = PipelineRunner::new(
        config(Duration::from_millis(50)),
        Arc::new(MockMarkup::new()),
        Arc::new(comments),
        Arc::new(completion),
    );

    let items = vec![
        (Category::Hot, content_item("scored", "Scored")),
        (Category::Hot, content_item("quiet", "Quiet")),
        (Category::New, content_item("stalled", "Stalled")),
    ];
    let report = runner.run(items).await.unwrap();

    let ids: Vec<_> = report.items.iter().map(|i| i.item.id.as_str()).collect();
    assert_eq!(ids, vec!["scored", "quiet", "stalled"]);

    let scored = &report.items[0];
    assert_eq!(scored.aggregate_tone, Some(70.0));
    assert_eq!(
        scored.reactions,
        vec![
            ScoredReaction::new("Great outcome", Some(80.0)),
            ScoredReaction::new("Decent start", Some(60.0)),
        ]
    );

    let quiet = &report.items[1];
    assert!(quiet.reactions.is_empty());
    assert_eq!(quiet.aggregate_tone, None);

    let stalled = &report.items[2];
    assert_eq!(stalled.category, Category::New);
    assert_eq!(
        stalled.reactions,
        vec![ScoredReaction::new("Nobody knows yet", None)]
    );
    assert_eq!(stalled.aggregate_tone, None);

    // No markup registered: every preview degrades to the sentinel.
    assert!(report.items.iter().all(|i| i.preview_url == PREVIEW_UNAVAILABLE));
}

// ---------------------------------------------------------------------------
// Ordering under out-of-order completion
// ---------------------------------------------------------------------------

#[tokio::test]
async fn report_order_is_input_order_under_random_delays() {
    let mut rng = StdRng::seed_from_u64(2024);
    let mut comments = MockComments::new();
    let mut completion = MockCompletion::new();
    let mut items = Vec::new();

    for n in 0..12 {
        let id = format!("item{n}");
        let texts: Vec<String> = (0..3).map(|r| format!("reaction {n}-{r}")).collect();
        for text in &texts {
            let delay = Duration::from_millis(rng.random_range(0..40));
            completion = completion.on_text_after(text, &format!("{}", n * 5), delay);
        }
        comments = comments.on_item(&id, texts);
        let category = Category::ALL[n / 4];
        items.push((category, content_item(&id, &format!("Story {n}"))));
    }

    let runner = PipelineRunner::new(
        config(Duration::from_secs(1)),
        Arc::new(MockMarkup::new()),
        Arc::new(comments),
        Arc::new(completion),
    );
    let expected: Vec<(Category, String)> =
        items.iter().map(|(c, i)| (*c, i.id.clone())).collect();

    let report = runner.run(items).await.unwrap();

    let actual: Vec<(Category, String)> = report
        .items
        .iter()
        .map(|i| (i.category, i.item.id.clone()))
        .collect();
    assert_eq!(actual, expected);

    for (n, enriched) in report.items.iter().enumerate() {
        assert_eq!(enriched.aggregate_tone, Some((n * 5) as f64));
        let texts: Vec<_> = enriched.reactions.iter().map(|r| r.text.as_str()).collect();
        let want: Vec<String> = (0..3).map(|r| format!("reaction {n}-{r}")).collect();
        assert_eq!(texts, want);
    }
}

#[tokio::test]
async fn slow_first_item_keeps_its_position() {
    let comments = MockComments::new()
        .on_item("first", strings(&["slow one"]))
        .on_item("second", strings(&["fast one"]));
    let completion = MockCompletion::new()
        .on_text_after("slow one", "10", Duration::from_millis(80))
        .on_text("fast one", "90");

    let runner = PipelineRunner::new(
        config(Duration::from_secs(1)),
        Arc::new(MockMarkup::new()),
        Arc::new(comments),
        Arc::new(completion),
    );
    let report = runner
        .run(vec![
            (Category::Hot, content_item("first", "First")),
            (Category::Hot, content_item("second", "Second")),
        ])
        .await
        .unwrap();

    assert_eq!(report.items[0].item.id, "first");
    assert_eq!(report.items[0].aggregate_tone, Some(10.0));
    assert_eq!(report.items[1].item.id, "second");
    assert_eq!(report.items[1].aggregate_tone, Some(90.0));
}

// ---------------------------------------------------------------------------
// Bounded item concurrency
// ---------------------------------------------------------------------------

fn bounded_config(max_concurrent_items: usize) -> PipelineConfig {
    PipelineConfig {
        max_concurrent_items,
        reaction_timeout: Duration::from_secs(5),
        ..config(Duration::from_secs(1))
    }
}

fn quiet_items(count: usize) -> (MockComments, Vec<(Category, ContentItem)>) {
    let mut comments = MockComments::new();
    let mut items = Vec::new();
    for n in 0..count {
        let id = format!("item{n}");
        comments = comments.on_item(&id, Vec::new());
        items.push((Category::Hot, content_item(&id, &format!("Story {n}"))));
    }
    (comments, items)
}

#[tokio::test]
async fn items_are_enriched_concurrently() {
    let delay = Duration::from_millis(100);
    let (comments, items) = quiet_items(6);
    let comments = Arc::new(comments.with_delay(delay));

    let runner = PipelineRunner::new(
        bounded_config(8),
        Arc::new(MockMarkup::new()),
        comments.clone(),
        Arc::new(MockCompletion::new()),
    );

    let started = std::time::Instant::now();
    let report = runner.run(items).await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(report.items.len(), 6);
    assert_eq!(comments.peak_in_flight(), 6);
    assert!(elapsed < delay * 2, "items ran one at a time: {elapsed:?}");
}

#[tokio::test]
async fn in_flight_items_never_exceed_ceiling() {
    let (comments, items) = quiet_items(10);
    let comments = Arc::new(comments.with_delay(Duration::from_millis(20)));

    let runner = PipelineRunner::new(
        bounded_config(3),
        Arc::new(MockMarkup::new()),
        comments.clone(),
        Arc::new(MockCompletion::new()),
    );
    let expected: Vec<String> = items.iter().map(|(_, i)| i.id.clone()).collect();

    let report = runner.run(items).await.unwrap();

    assert_eq!(comments.calls(), 10);
    assert_eq!(comments.peak_in_flight(), 3);
    let ids: Vec<String> = report.items.iter().map(|i| i.item.id.clone()).collect();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn later_items_finishing_first_keep_input_order() {
    // The first item's scoring is slowest; all three run at once.
    let comments = MockComments::new()
        .on_item("a", strings(&["slowest"]))
        .on_item("b", strings(&["middle"]))
        .on_item("c", strings(&["fastest"]));
    let completion = MockCompletion::new()
        .on_text_after("slowest", "10", Duration::from_millis(120))
        .on_text_after("middle", "50", Duration::from_millis(60))
        .on_text("fastest", "90");

    let runner = PipelineRunner::new(
        bounded_config(3),
        Arc::new(MockMarkup::new()),
        Arc::new(comments),
        Arc::new(completion),
    );

    let started = std::time::Instant::now();
    let report = runner
        .run(vec![
            (Category::Hot, content_item("a", "A")),
            (Category::New, content_item("b", "B")),
            (Category::Rising, content_item("c", "C")),
        ])
        .await
        .unwrap();
    let elapsed = started.elapsed();

    let got: Vec<_> = report
        .items
        .iter()
        .map(|i| (i.item.id.as_str(), i.aggregate_tone))
        .collect();
    assert_eq!(got, vec![("a", Some(10.0)), ("b", Some(50.0)), ("c", Some(90.0))]);
    // One at a time would take at least 180ms.
    assert!(elapsed < Duration::from_millis(180), "items ran one at a time: {elapsed:?}");
}

// ---------------------------------------------------------------------------
// Preview fallback chain
// ---------------------------------------------------------------------------

#[tokio::test]
async fn preview_fallback_chain() {
    let native = {
        let mut item = content_item("native", "Native");
        item.native_preview = Some("https://preview.redd.it/native.jpg".to_string());
        item
    };
    let secondary = content_item("secondary", "Secondary");
    let neither = content_item("neither", "Neither");

    let markup = Arc::new(
        MockMarkup::new()
            .on_page(
                &native.external_url,
                og_page("https://img.example.com/should-not-be-used.jpg"),
            )
            .on_page(
                &secondary.external_url,
                twitter_page("https://img.example.com/twitter.jpg"),
            )
            .on_page(&neither.external_url, "<html><head></head></html>".to_string()),
    );

    let runner = PipelineRunner::new(
        config(Duration::from_secs(1)),
        markup.clone(),
        Arc::new(MockComments::new()),
        Arc::new(MockCompletion::new()),
    );
    let report = runner
        .run(vec![
            (Category::Hot, native),
            (Category::Hot, secondary),
            (Category::Hot, neither),
        ])
        .await
        .unwrap();

    assert_eq!(report.items[0].preview_url, "https://preview.redd.it/native.jpg");
    assert_eq!(report.items[1].preview_url, "https://img.example.com/twitter.jpg");
    assert_eq!(report.items[2].preview_url, PREVIEW_UNAVAILABLE);
    // The native preview short-circuits its page fetch.
    assert_eq!(markup.calls(), 2);
}

// ---------------------------------------------------------------------------
// Idempotence
// ---------------------------------------------------------------------------

fn deterministic_enricher(sampling: SamplingPolicy) -> ItemEnricher {
    let item = content_item("repeat", "Repeat");
    let timeout = Duration::from_secs(1);
    ItemEnricher::new(
        PreviewResolver::new(
            Arc::new(MockMarkup::new().on_page(
                &item.external_url,
                og_page("https://img.example.com/repeat.jpg"),
            )),
            timeout,
        ),
        ReactionSource::new(
            Arc::new(MockComments::new().on_item(
                "repeat",
                strings(&["alpha", "beta", "gamma", "delta", "epsilon", "zeta"]),
            )),
            timeout,
        ),
        ToneScorer::new(
            Arc::new(
                MockCompletion::new()
                    .on_text_after("alpha", "12", Duration::from_millis(15))
                    .on_text("beta", "about 34.5")
                    .on_text_after("gamma", "56", Duration::from_millis(5))
                    .on_text("delta", "no idea")
                    .on_text("epsilon", "78")
                    .on_text("zeta", "90"),
            ),
            timeout,
        ),
        sampling,
    )
}

async fn enrich_twice(sampling: SamplingPolicy) -> (String, String) {
    let enricher = deterministic_enricher(sampling);
    let item: ContentItem = content_item("repeat", "Repeat");

    let first = enricher.enrich(Category::Rising, &item).await;
    let second = enricher.enrich(Category::Rising, &item).await;

    (
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap(),
    )
}

#[tokio::test]
async fn prefix_enrichment_is_idempotent() {
    let (first, second) = enrich_twice(SamplingPolicy::Prefix { size: 5 }).await;
    assert_eq!(first, second);

    let value: serde_json::Value = serde_json::from_str(&first).unwrap();
    assert_eq!(value["preview_url"], "https://img.example.com/repeat.jpg");
    // 12, 34.5, 56 and 78 scored; "no idea" and the unsampled sixth are absent.
    // The mean 45.125 is an exact tie and rounds to even.
    assert_eq!(value["aggregate_tone"], 45.12);
    assert!(value["reactions"][5]["tone"].is_null());
}

#[tokio::test]
async fn seeded_enrichment_is_idempotent() {
    let (first, second) = enrich_twice(SamplingPolicy::Seeded { size: 3, seed: 11 }).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn separate_runs_produce_identical_items() {
    let runner = || {
        PipelineRunner::new(
            config(Duration::from_secs(1)),
            Arc::new(MockMarkup::new()),
            Arc::new(MockComments::new().on_item("x", strings(&["fine", "meh"]))),
            Arc::new(MockCompletion::new().on_text("fine", "66").on_text("meh", "44")),
        )
    };
    let items = || vec![(Category::Hot, content_item("x", "X"))];

    let first = runner().run(items()).await.unwrap();
    let second = runner().run(items()).await.unwrap();

    assert_eq!(
        serde_json::to_string(&first.items).unwrap(),
        serde_json::to_string(&second.items).unwrap()
    );
}
