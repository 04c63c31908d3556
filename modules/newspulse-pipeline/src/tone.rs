use std::sync::{Arc, LazyLock};
use std::time::Duration;

use ai_client::{truncate_to_char_boundary, OpenAi, Sampling};
use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, warn};

const SYSTEM_PROMPT: &str =
    "You are a sentiment analysis tool. Provide a sentiment score from 0 to 100.";

/// Longest reaction text embedded in a prompt, in bytes.
const MAX_PROMPT_TEXT_BYTES: usize = 4000;

const MIN_SCORE: f64 = 0.0;
const MAX_SCORE: f64 = 100.0;

static NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-?\d+(?:\.\d+)?").unwrap());

/// Sampling parameters sent with every scoring request.
pub fn scoring_sampling() -> Sampling {
    Sampling {
        max_tokens: Some(100),
        temperature: Some(0.75),
        top_p: Some(1.0),
        frequency_penalty: Some(0.0),
        presence_penalty: Some(0.3),
        n: Some(1),
        stop: vec!["\n".to_string(), "User:".to_string()],
    }
}

// --- CompletionService trait ---

#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Submit one prompt and return the service's free-form reply.
    async fn complete(&self, system: &str, prompt: &str) -> Result<String>;
}

#[async_trait]
impl CompletionService for OpenAi {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        Ok(self.chat_completion(system, prompt).await?)
    }
}

// --- ToneScorer ---

/// Scores one text from 0 (extremely negative) to 100 (extremely positive).
/// Any failure yields `None`.
pub struct ToneScorer {
    service: Arc<dyn CompletionService>,
    timeout: Duration,
}

impl ToneScorer {
    pub fn new(service: Arc<dyn CompletionService>, timeout: Duration) -> Self {
        Self { service, timeout }
    }

    pub async fn score(&self, text: &str) -> Option<f64> {
        let prompt = build_prompt(text);

        let reply =
            match tokio::time::timeout(self.timeout, self.service.complete(SYSTEM_PROMPT, &prompt))
                .await
            {
                Ok(Ok(reply)) => reply,
                Ok(Err(e)) => {
                    warn!(error = %e, "Tone scoring call failed");
                    return None;
                }
                Err(_) => {
                    warn!(
                        timeout_secs = self.timeout.as_secs_f64(),
                        "Tone scoring call timed out"
                    );
                    return None;
                }
            };

        let score = parse_score(&reply);
        if score.is_none() {
            debug!(reply = reply.as_str(), "No usable score in reply");
        }
        score
    }
}

pub fn build_prompt(text: &str) -> String {
    let text = truncate_to_char_boundary(text, MAX_PROMPT_TEXT_BYTES);
    format!(
        "Analyze the sentiment of the following text on a scale from 0 to 100, \
         where 0 is extremely negative, 50 is neutral, and 100 is extremely positive.\n\
         Text: \"{text}\"\n\
         Respond only with the numerical score."
    )
}

/// Read a score out of a free-form reply: the whole trimmed reply as a
/// number, else the first numeral in it, sign included. Values outside 0..=100 are
/// rejected, not clamped.
pub fn parse_score(reply: &str) -> Option<f64> {
    let trimmed = reply.trim();
    let value = match trimmed.parse::<f64>() {
        Ok(v) => v,
        Err(_) => NUMBER.find(trimmed)?.as_str().parse().ok()?,
    };

    (value.is_finite() && (MIN_SCORE..=MAX_SCORE).contains(&value)).then_some(value)
}
