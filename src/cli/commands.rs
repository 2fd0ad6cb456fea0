use crate::{
    config::GeneratorConfig,
    executor::ConcurrentExecutor,
    provider::{ChatCompletionProvider, DisabledProvider, GenerationProvider},
    scheduler::schedule,
    spec::{build_endpoints, document_slug, load_document},
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Command-line interface for the API test generator
///
/// Provides commands for generating integration tests from OpenAPI
/// specifications and inspecting the dispatch order without generation.
#[derive(Parser)]
#[command(name = "apitestgen")]
#[command(about = "OpenAPI-driven API test generator", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Generate an integration test file from an OpenAPI spec
    Generate {
        /// Path to the OpenAPI specification file (YAML or JSON)
        #[arg(short, long)]
        spec: PathBuf,

        /// Output path for the generated test file
        #[arg(short, long)]
        output: PathBuf,

        /// Generation model identifier (overrides ATG_MODEL)
        #[arg(long)]
        model: Option<String>,

        /// Chat-completions base URL (overrides ATG_BASE_URL)
        #[arg(long)]
        base_url: Option<String>,

        /// Worker coroutines in the pool (overrides ATG_WORKERS)
        #[arg(long)]
        workers: Option<usize>,

        /// Total attempt budget per job (overrides ATG_MAX_RETRIES)
        #[arg(long)]
        retries: Option<u32>,

        /// Initial backoff in milliseconds (overrides ATG_BACKOFF_MS)
        #[arg(long)]
        backoff_ms: Option<u64>,

        /// Per-call generation timeout in ms (overrides ATG_TIMEOUT_MS)
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Abort the run on retry exhaustion instead of falling back
        #[arg(long, default_value_t = false)]
        no_fallback: bool,

        /// Skip the generation service entirely; every block comes from
        /// the deterministic fallback templates
        #[arg(long, default_value_t = false)]
        offline: bool,
    },
    /// Print the dispatch order for a spec without generating anything
    Schedule {
        /// Path to the OpenAPI specification file (YAML or JSON)
        #[arg(short, long)]
        spec: PathBuf,
    },
}

/// Execute the CLI command provided by the user
///
/// # Errors
///
/// Returns an error if:
/// - The OpenAPI spec cannot be loaded or parsed
/// - The run configuration is invalid
/// - A job fails permanently and fallback cannot resolve it
/// - The output file cannot be written
pub fn run_cli() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    match &cli.command {
        Commands::Generate {
            spec,
            output,
            model,
            base_url,
            workers,
            retries,
            backoff_ms,
            timeout_ms,
            no_fallback,
            offline,
        } => {
            let mut config = GeneratorConfig::from_env();
            if let Some(model) = model {
                config.model = model.clone();
            }
            if let Some(base_url) = base_url {
                config.base_url = base_url.clone();
            }
            if let Some(workers) = workers {
                config.thread_pool_size = *workers;
            }
            if let Some(retries) = retries {
                config.max_retries = *retries;
            }
            if let Some(backoff_ms) = backoff_ms {
                config.initial_backoff_ms = *backoff_ms;
            }
            if let Some(timeout_ms) = timeout_ms {
                config.timeout_ms = *timeout_ms;
            }
            if *no_fallback {
                config.use_fallback_on_error = false;
            }
            config.validate()?;

            let provider: Arc<dyn GenerationProvider> = if *offline {
                Arc::new(DisabledProvider)
            } else {
                Arc::new(ChatCompletionProvider::new(&config)?)
            };
            run_generate(spec, output, provider, config)
        }
        Commands::Schedule { spec } => run_schedule(spec),
    }
}

fn run_generate(
    spec: &Path,
    output: &Path,
    provider: Arc<dyn GenerationProvider>,
    config: GeneratorConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let doc = load_document(spec)?;
    let slug = document_slug(&doc);
    let endpoints = build_endpoints(&doc);
    if endpoints.is_empty() {
        warn!("specification declares no operations; writing an empty test file");
    }
    let plan = schedule(endpoints);
    info!(endpoints = plan.ordered.len(), slug = %slug, "dispatch order computed");

    let executor = ConcurrentExecutor::new(provider, config);
    let counters = executor.counters();
    let report = match executor.run(&plan.ordered) {
        Ok(report) => report,
        Err(e) => {
            println!(
                "processed {} jobs, {} failed",
                counters.processed(),
                counters.failed()
            );
            return Err(e.into());
        }
    };

    let file = render_test_file(&slug, &report.blocks);
    std::fs::write(output, file)?;
    info!(path = %output.display(), blocks = report.blocks.len(), "test file written");
    println!(
        "processed {} jobs, {} failed",
        report.processed, report.failed
    );
    Ok(())
}

fn run_schedule(spec: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let doc = load_document(spec)?;
    let endpoints = build_endpoints(&doc);
    let plan = schedule(endpoints);
    for endpoint in &plan.ordered {
        let key = endpoint.key();
        let deps = plan
            .dependencies
            .get(&key)
            .map(|d| {
                d.dependencies
                    .iter()
                    .map(|k| k.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();
        let priority = plan
            .dependencies
            .get(&key)
            .map(|d| d.priority)
            .unwrap_or_default();
        println!(
            "{:<45} priority={} complexity={:>3} ({:?}){}",
            key.to_string(),
            priority,
            endpoint.complexity_score,
            endpoint.complexity,
            if deps.is_empty() {
                String::new()
            } else {
                format!(" after: {}", deps)
            }
        );
    }
    Ok(())
}

/// Frame the collected blocks into one compilable test file.
fn render_test_file(slug: &str, blocks: &[String]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "//! Integration tests for the `{}` API.\n//!\n//! Generated file; regenerate instead of editing by hand.\n\n",
        slug
    ));
    out.push_str(
        "fn base_url() -> String {\n    std::env::var(\"API_BASE_URL\")\n        .unwrap_or_else(|_| \"http://localhost:8080\".to_string())\n}\n",
    );
    for block in blocks {
        out.push('\n');
        out.push_str(block.trim_end());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_test_file_frames_blocks() {
        let blocks = vec![
            "#[test]\nfn one() {}".to_string(),
            "#[test]\nfn two() {}".to_string(),
        ];
        let file = render_test_file("petstore", &blocks);
        assert!(file.starts_with("//! Integration tests for the `petstore` API."));
        assert!(file.contains("fn base_url() -> String"));
        let one = file.find("fn one").unwrap();
        let two = file.find("fn two").unwrap();
        assert!(one < two);
    }

    #[test]
    fn test_render_test_file_empty_run() {
        let file = render_test_file("empty", &[]);
        assert!(file.contains("fn base_url()"));
        assert!(!file.contains("#[test]"));
    }
}
