use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use shared::{
    Config, DigestOutcome, DigestPipeline, DigestSink, EmailSender, FormatDirective,
    NewsletterRenderer, OpenAiFormatter, PipelineSettings, RecencyEvaluator, RecencyWindow,
    RelaxationPolicy, RelevanceRuleSet, SerpApiClient, UnparseableDatePolicy,
};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Html,
    Text,
}

impl From<OutputFormat> for FormatDirective {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Html => FormatDirective::Html,
            OutputFormat::Text => FormatDirective::Text,
        }
    }
}

#[derive(Parser)]
#[command(name = "daily-digest")]
#[command(about = "Search recent AI news from India, pick the best few and email a digest")]
struct Args {
    /// Search query (defaults to the built-in India AI news query)
    #[arg(short, long)]
    query: Option<String>,

    /// Maximum article age in days
    #[arg(short, long, default_value = "14")]
    days: u32,

    /// Number of articles in the digest
    #[arg(short, long, default_value = "3")]
    count: usize,

    /// Treat articles with unreadable dates as recent
    #[arg(long)]
    accept_undated: bool,

    /// When strict matches run out, keep relevance but stop checking dates
    #[arg(long)]
    relax_recency: bool,

    /// JSON keyword rule set replacing the built-in vocabulary
    #[arg(short, long)]
    rules: Option<PathBuf>,

    /// Output format requested from the language model
    #[arg(short, long, value_enum, default_value = "html")]
    format: OutputFormat,

    /// Print the digest instead of emailing it
    #[arg(long)]
    dry_run: bool,

    /// Recipient address (defaults to DIGEST_RECIPIENT or EMAIL_USER)
    #[arg(long)]
    to: Option<String>,
}

impl Args {
    fn settings(&self) -> PipelineSettings {
        let defaults = PipelineSettings::default();
        let on_unparseable_date = if self.accept_undated {
            UnparseableDatePolicy::Accept
        } else {
            UnparseableDatePolicy::Reject
        };

        PipelineSettings {
            query: self.query.clone().unwrap_or(defaults.query),
            target_count: self.count,
            window: Some(RecencyWindow::new(self.days, on_unparseable_date)),
            relaxation: if self.relax_recency {
                RelaxationPolicy::DropRecency
            } else {
                RelaxationPolicy::Rescan
            },
            format: self.format.into(),
            ..defaults
        }
    }
}

/// Uses JSON lines when `RUST_LOG_FORMAT=json`
fn init_tracing() {
    let use_json = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);
    let filter = EnvFilter::builder()
        .with_default_directive(Level::WARN.into())
        .from_env_lossy();

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().flatten_event(true).with_writer(std::io::stderr))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init();
    }
}

/// Progress line printed once the run has finished
fn outcome_status(outcome: &DigestOutcome) -> &'static str {
    match outcome {
        DigestOutcome::Digest(_) => "✓ Stories selected and summarized",
        DigestOutcome::Placeholder(_) => "⚠ No qualifying stories found, nothing was summarized",
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    let config = Config::from_env()?;
    let settings = args.settings();

    // Email credentials are checked before any network call
    let email = if args.dry_run {
        None
    } else {
        Some(config.require_email()?.clone())
    };

    let rule_set = match &args.rules {
        Some(path) => RelevanceRuleSet::from_json_file(path)?,
        None => RelevanceRuleSet::india_ai(),
    };

    let evaluator = RecencyEvaluator::new();
    let today = evaluator.now().date();
    let max_age_days = args.days;
    let format = settings.format;

    let source = SerpApiClient::new(config.serpapi_api_key.clone())?;
    let formatter = OpenAiFormatter::new(
        config.openai_api_key.clone(),
        &config.openai_api_base,
        &config.openai_model,
    )?;
    let pipeline = DigestPipeline::new(source, formatter, rule_set, evaluator, settings);

    println!("\n🔎 Building digest of up to {} stories...", args.count);
    let outcome = pipeline.run().await.context("Digest run failed")?;
    println!("{}", outcome_status(&outcome));

    let Some(email) = email else {
        println!("\n{}", outcome.text());
        return Ok(());
    };

    let recipient = args.to.clone().unwrap_or_else(|| email.recipient.clone());
    let body = NewsletterRenderer::render(outcome.text(), format, max_age_days, today);

    println!("\n📧 Sending digest to {}...", recipient);
    let sender = EmailSender::new(email);
    sender
        .send(shared::email::SUBJECT, &body, &recipient)
        .await
        .context("Failed to deliver digest")?;

    println!("\n✅ Digest sent to {}", recipient);

    Ok(())
}
