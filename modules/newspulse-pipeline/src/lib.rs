pub mod enricher;
pub mod feed;
pub mod preview;
pub mod reactions;
pub mod report;
pub mod runner;
pub mod sampling;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod tone;

pub use enricher::ItemEnricher;
pub use feed::{collect_items, FeedSource};
pub use preview::{HttpMarkupFetcher, MarkupFetcher, PreviewResolver};
pub use reactions::{CommentFetcher, ReactionSource, MAX_REACTIONS};
pub use report::{render, render_json, render_text, ReportFormat};
pub use runner::{PipelineConfig, PipelineRunner};
pub use sampling::SamplingPolicy;
pub use tone::{CompletionService, ToneScorer};
