//! Summary Benchmark CLI

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use summary_benchmark::{
    config::{parse_model_specs, Config, ModelSpec},
    providers::{create_summarizer, Credentials},
    reporting::{print_console_report, save_responses, JsonReport},
    runner::{ConsoleProgress, Executor, ExecutorConfig, ModelRun},
    samples::load_dataset,
};

const DEFAULT_DATASET: &str = "summary-benchmark/datasets/sample_dataset.json";

#[derive(Parser)]
#[command(name = "summary-benchmark")]
#[command(about = "Summarization quality benchmark (BLEU / ROUGE) across LLM providers")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate and score summaries for one or more models
    Run {
        /// Models to evaluate, as `provider:model` or a bare OpenAI model
        #[arg(short, long, required = true, num_args = 1..)]
        models: Vec<String>,

        /// Path to the dataset JSON file
        #[arg(short, long, default_value = DEFAULT_DATASET)]
        dataset: PathBuf,

        /// Evaluate only the first N samples
        #[arg(short, long)]
        limit: Option<usize>,

        /// Path of the JSON report (default: <output_dir>/<run_id>/report.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of parallel requests (overrides config)
        #[arg(long)]
        parallel: Option<usize>,

        /// Save each generated summary to the run's responses directory
        #[arg(long)]
        save_responses: bool,
    },

    /// List dataset samples
    ListSamples {
        /// Path to the dataset JSON file
        #[arg(short, long, default_value = DEFAULT_DATASET)]
        dataset: PathBuf,

        /// Show only the first N samples
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Print the console report of a saved JSON report
    Report {
        /// Path to a JSON report
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Generate sample configuration
    InitConfig {
        /// Output path for configuration file
        #[arg(short, long, default_value = "config/models.toml")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("summary_benchmark=debug,info")
    } else {
        EnvFilter::new("summary_benchmark=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    match cli.command {
        Commands::Run {
            models,
            dataset,
            limit,
            output,
            parallel,
            save_responses,
        } => {
            let config = Config::load_or_default(cli.config.as_deref())?;
            let options = RunOptions {
                models,
                dataset,
                limit,
                output,
                parallel,
                save_responses,
                verbose: cli.verbose,
            };
            run_benchmark(config, options).await?;
        }

        Commands::ListSamples { dataset, limit } => {
            list_samples(&dataset, limit)?;
        }

        Commands::Report { input } => {
            let report = JsonReport::read_from_file(&input)?;
            print_console_report(&report, cli.verbose);
        }

        Commands::InitConfig { output } => {
            init_config(&output)?;
        }
    }

    Ok(())
}

struct RunOptions {
    models: Vec<String>,
    dataset: PathBuf,
    limit: Option<usize>,
    output: Option<PathBuf>,
    parallel: Option<usize>,
    save_responses: bool,
    verbose: bool,
}

async fn run_benchmark(mut config: Config, options: RunOptions) -> Result<(), Box<dyn std::error::Error>> {
    let run_id = Utc::now().format("%Y%m%d-%H%M%S").to_string();

    // Validate everything before the first provider call
    let specs = parse_model_specs(&options.models)?;
    let samples = load_dataset(&options.dataset, options.limit)?;

    if let Some(parallel) = options.parallel {
        config.benchmark.parallel_requests = parallel;
    }

    let credentials = Credentials::from_env(&config);
    let summarizers = specs
        .iter()
        .map(|spec| create_summarizer(spec, &config, &credentials).map(Arc::new))
        .collect::<Result<Vec<_>, _>>()?;

    println!("=== Summary Benchmark ===");
    println!("Run ID:  {}", run_id);
    println!("Dataset: {} ({} samples)", options.dataset.display(), samples.len());
    println!(
        "Models:  {}",
        specs.iter().map(ModelSpec::label).collect::<Vec<_>>().join(", ")
    );
    println!();

    let executor = Executor::new(ExecutorConfig::from(&config.benchmark));
    let mut runs: Vec<ModelRun> = Vec::with_capacity(specs.len());
    for (spec, summarizer) in specs.iter().zip(summarizers) {
        let run = executor
            .run_model(spec, summarizer, &samples, &ConsoleProgress)
            .await;
        runs.push(run);
    }

    let report = JsonReport::from_runs(
        &run_id,
        options.dataset.display().to_string(),
        options.limit,
        &runs,
    );
    print_console_report(&report, options.verbose);

    let run_dir = Path::new(&config.benchmark.output.output_dir).join(&run_id);
    let report_path = options.output.unwrap_or_else(|| run_dir.join("report.json"));
    report.write_to_file(&report_path)?;
    println!("\nJSON report written to: {}", report_path.display());

    if options.save_responses || config.benchmark.output.save_responses {
        let responses_dir = run_dir.join("responses");
        let count = save_responses(&responses_dir, &report.samples)?;
        println!("Responses written to: {} ({} files)", responses_dir.display(), count);
    }

    Ok(())
}

fn list_samples(dataset: &Path, limit: Option<usize>) -> Result<(), Box<dyn std::error::Error>> {
    let samples = load_dataset(dataset, limit)?;

    println!("Samples ({}):", samples.len());
    println!("{:-<60}", "");

    for sample in &samples {
        println!(
            "  {} | {} chars | reference: {} | {}",
            sample.id,
            sample.article.chars().count(),
            if sample.has_reference() { "yes" } else { "no" },
            sample.title.as_deref().unwrap_or("-"),
        );
    }

    Ok(())
}

fn init_config(output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    config.save_toml(output)?;
    println!("Configuration written to: {}", output.display());
    Ok(())
}
