use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ai_client::OpenAi;
use newspulse_common::{Category, Config, Report};
use newspulse_pipeline::tone::scoring_sampling;
use newspulse_pipeline::{
    collect_items, render, HttpMarkupFetcher, PipelineConfig, PipelineRunner, ReportFormat,
};
use reddit_client::{RedditClient, DEFAULT_USER_AGENT};

/// Fetch ranked news posts, score the tone of their comments, and write a report.
#[derive(Parser, Debug)]
#[command(name = "newspulse", version)]
struct Cli {
    /// Posts per category. Overrides POST_LIMIT.
    #[arg(long)]
    limit: Option<u32>,

    /// Category to fetch; repeat for several, in report order.
    /// Defaults to hot, new, rising.
    #[arg(long = "category")]
    categories: Vec<Category>,

    /// Report format: text or json.
    #[arg(long, default_value = "text")]
    format: ReportFormat,

    /// Report file. Defaults to newspulse_report.<txt|json>.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Print the report without writing a file.
    #[arg(long)]
    no_file: bool,

    /// Print the JSON schema of the report and exit.
    #[arg(long)]
    print_schema: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("newspulse=info".parse()?)
                .add_directive("newspulse_pipeline=info".parse()?)
                .add_directive("newspulse_common=info".parse()?)
                .add_directive("reddit_client=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    if cli.print_schema {
        let schema = schemars::schema_for!(Report);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    info!("newspulse starting...");

    let config = Config::from_env()?;
    config.log_redacted();

    let limit = cli.limit.unwrap_or(config.post_limit);
    let categories = if cli.categories.is_empty() {
        Category::ALL.to_vec()
    } else {
        cli.categories.clone()
    };
    let user_agent = config.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);

    // One pooled client for every request of the run.
    let http = reqwest::Client::builder()
        .build()
        .context("Failed to build HTTP client")?;

    let reddit = Arc::new(
        RedditClient::new(http.clone())
            .with_base_url(&config.reddit_base_url)
            .with_user_agent(user_agent)
            .with_timeout(config.reaction_timeout),
    );
    let markup = Arc::new(HttpMarkupFetcher::new(http.clone(), user_agent));
    let tone = Arc::new(
        OpenAi::new(&config.tone_api_key, &config.tone_model)
            .with_base_url(&config.tone_api_url)
            .with_http(http)
            .with_sampling(scoring_sampling())
            .with_timeout(config.scoring_timeout),
    );

    let items = collect_items(reddit.as_ref(), &categories, limit).await;
    info!(items = items.len(), "Collected items");

    let runner = PipelineRunner::new(PipelineConfig::from(&config), markup, reddit, tone);
    let report = runner.run(items).await?;

    let rendered = render(&report, cli.format)?;
    println!("{rendered}");

    if !cli.no_file {
        let path = cli.output.unwrap_or_else(|| {
            PathBuf::from(format!("newspulse_report.{}", cli.format.extension()))
        });
        tokio::fs::write(&path, &rendered)
            .await
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        info!(path = %path.display(), "Saved report");
    }

    Ok(())
}
