use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use lng_translator::model::config::DEFAULT_CONFIG_FILE;
use lng_translator::parsers::lng;
use lng_translator::services::{console, pipeline};
use lng_translator::{AiClient, AppConfig, PipelineConfig};

#[derive(Parser, Debug)]
#[command(name = "lng-translator", version, about = "Translate a .lng language file with a chat model")]
struct Cli {
    /// Settings file (JSON)
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Source language file, overrides `SourceFile`
    #[arg(short, long)]
    source: Option<PathBuf>,

    /// Directory receiving `<DesiredLanguage>.lng`
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Entries to skip, overrides `StartFromLine`
    #[arg(long)]
    start_from: Option<usize>,

    /// Exit without waiting for a key press
    #[arg(long)]
    no_wait: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("lng_translator=info".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let cfg = AppConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    let source = cli
        .source
        .clone()
        .unwrap_or_else(|| PathBuf::from(&cfg.source_file));
    let output = cli.output_dir.join(cfg.output_file_name());

    let file = lng::load(&source)?;
    tracing::info!(source = %source.display(), entries = file.len(), "source loaded");

    let client = AiClient::new(&cfg).context("building HTTP client")?;
    let mut progress = console::ConsoleProgress::new(&cfg.desired_language, cfg.clear_every);

    let pipeline_cfg = PipelineConfig {
        target_lang: &cfg.desired_language,
        start_from: cli.start_from.unwrap_or(cfg.start_from_line),
        max_empty_attempts: cfg.max_empty_attempts,
        retry_delay: cfg.retry_delay(),
        entry_delay: cfg.entry_delay(),
    };

    pipeline::run(&file, &client, &mut progress, &output, &pipeline_cfg)
        .with_context(|| format!("writing {}", output.display()))?;

    if !cli.no_wait {
        if let Err(e) = console::wait_for_key() {
            tracing::debug!(error = %e, "could not wait for key press");
        }
    }

    Ok(())
}
