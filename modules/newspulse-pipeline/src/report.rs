use std::fmt::Write;

use anyhow::Result;

use newspulse_common::{EnrichedItem, Report};

const SEPARATOR_WIDTH: usize = 80;

/// Output format for a rendered report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Text => "txt",
            ReportFormat::Json => "json",
        }
    }
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            other => Err(format!("unknown format '{other}' (expected text or json)")),
        }
    }
}

pub fn render(report: &Report, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(render_text(report)),
        ReportFormat::Json => render_json(report),
    }
}

pub fn render_json(report: &Report) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Human-readable listing, one numbered block per item.
pub fn render_text(report: &Report) -> String {
    let mut out = String::new();
    for (idx, item) in report.items.iter().enumerate() {
        write_item(&mut out, idx + 1, item);
    }
    out
}

fn write_item(out: &mut String, number: usize, enriched: &EnrichedItem) {
    let item = &enriched.item;
    // Writing to a String cannot fail.
    let _ = writeln!(
        out,
        "{}. [{}] {}",
        number,
        enriched.category.as_str().to_uppercase(),
        item.title
    );
    let _ = writeln!(out, "    External URL: {}", item.external_url);
    let _ = writeln!(
        out,
        "    Upvotes: {} | Date: {}",
        item.popularity,
        item.created_at.format("%m/%d/%Y")
    );
    let _ = writeln!(out, "    Thumbnail: {}", enriched.preview_url);

    if enriched.reactions.is_empty() {
        let _ = writeln!(out, "    No comments found.");
    } else {
        let _ = writeln!(out, "    Top Comments:");
        for reaction in &enriched.reactions {
            let _ = writeln!(out, "        - {}", reaction.text);
        }
    }

    match enriched.aggregate_tone {
        Some(score) => {
            let _ = writeln!(out, "    Aggregate Sentiment Score: {score:.2}");
        }
        None => {
            let _ = writeln!(out, "    Aggregate Sentiment Score: N/A");
        }
    }

    let _ = writeln!(out, "\n{}\n", "-".repeat(SEPARATOR_WIDTH));
}
