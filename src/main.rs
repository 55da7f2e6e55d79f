// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use cc_minify::pipeline::{self, MINIFY_TASK, UNMINIFY_TASK};
use cc_minify::utils::logging::{format_error, format_success, format_warning};
use cc_minify::{Config, Executor, Validator, get_executor};
use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "cc_minify")]
#[command(author = "cipher")]
#[command(version = "0.1.0")]
#[command(about = "Minify and rebuild Common Crawl text shards", long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    /// Executor to use, e.g. `debug` or `mp,task_parallelism=8`
    #[arg(short, long, env = "CC_MINIFY_EXECUTION")]
    execution: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace the text of each document with line fingerprints
    Minify {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        #[arg(short, long, default_value = "./minified")]
        output_dir: PathBuf,
    },

    /// Rebuild full documents from their source segments
    Unminify {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        #[arg(short, long, default_value = "./unminified")]
        output_dir: PathBuf,
    },

    /// Print the line count stored in each minified record
    Inspect {
        file: PathBuf,

        #[arg(short, long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    cc_minify::utils::logging::init_logger(cli.color, cli.verbose);

    info!("Loading configuration from: {}", cli.config.display());

    let config = if cli.config.exists() {
        Config::load(Some(cli.config.as_path())).context("Failed to load configuration")?
    } else {
        warn!(
            "Config file {} not found, using default configuration",
            cli.config.display()
        );
        Config::load(None).unwrap_or_else(|e| {
            warn!("Falling back to built-in defaults: {}", e);
            Config::default_config()
        })
    };

    let execution = cli
        .execution
        .clone()
        .unwrap_or_else(|| config.execution.mode.clone());

    match cli.command {
        Commands::Minify { inputs, output_dir } => {
            cmd_run(config, &execution, MINIFY_TASK, &inputs, &output_dir).await?;
        }
        Commands::Unminify { inputs, output_dir } => {
            cmd_run(config, &execution, UNMINIFY_TASK, &inputs, &output_dir).await?;
        }
        Commands::Inspect { file, limit } => {
            cmd_inspect(&file, limit)?;
        }
    }

    Ok(())
}

async fn cmd_run(
    config: Config,
    execution: &str,
    task: &str,
    inputs: &[PathBuf],
    output_dir: &Path,
) -> Result<()> {
    let start_time = Instant::now();

    let jobs = pipeline::discover_shards(inputs, output_dir)
        .context("Failed to collect input shards")?;
    if jobs.is_empty() {
        println!("{}", format_warning("No shard files found"));
        return Ok(());
    }

    let executor =
        get_executor(execution, &config.execution).context("Invalid execution setting")?;
    let registry =
        pipeline::build_registry(Arc::new(config)).context("Failed to register tasks")?;

    let report = executor
        .execute(&registry, task, jobs)
        .await
        .with_context(|| format!("Failed to run {}", task))?;

    let elapsed = start_time.elapsed();
    info!("{} finished in {:.2}s", task, elapsed.as_secs_f64());

    if report.failed > 0 {
        for failure in &report.failures {
            println!("{}", format_error(failure));
        }
        anyhow::bail!(
            "{} of {} shards failed for {}",
            report.failed,
            report.total(),
            task
        );
    }

    println!(
        "{}",
        format_success(&format!(
            "{}: {} shards written to {}",
            task,
            report.succeeded,
            output_dir.display()
        ))
    );
    Ok(())
}

fn cmd_inspect(file: &Path, limit: Option<usize>) -> Result<()> {
    Validator::validate_file_path(file)?;

    let records = pipeline::inspect_file(file)
        .with_context(|| format!("Failed to inspect {}", file.display()))?;

    println!("\n{} minified record(s) in {}\n", records.len(), file.display());
    println!("{}", "=".repeat(80));

    let shown = limit.unwrap_or(records.len());
    for (idx, record) in records.iter().take(shown).enumerate() {
        println!(
            "{:>5}. {} lines  {}",
            idx + 1,
            record.nlines,
            Validator::truncate_text(&record.url, 60)
        );
        if !record.cc_segment.is_empty() {
            println!("       segment: {}", record.cc_segment);
        }
    }

    let total_lines: usize = records.iter().map(|r| r.nlines).sum();
    println!("\n{}", "=".repeat(80));
    println!("Total lines: {}", total_lines);

    Ok(())
}
