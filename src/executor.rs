//! # Concurrent Executor
//!
//! Dispatches one generation job per scheduled endpoint to a fixed-size
//! pool of worker coroutines, applies the per-job retry policy with
//! exponential backoff, and collects results preserving submission
//! order. Concurrency affects throughput, never output ordering.
//!
//! ## Job lifecycle
//!
//! Jobs are built single-threaded (prompt, unique test name, synthesized
//! example body) before any dispatch, so workers share no mutable state
//! beyond the two run counters and the cancellation flag. Each job is
//! owned exclusively by the worker that executes it.
//!
//! ## Retry contract
//!
//! `max_retries` is the total attempt budget. A failed attempt sleeps
//! `initial_backoff_ms`, doubling per retry. Exhaustion resolves to the
//! deterministic fallback when enabled, otherwise the whole run aborts:
//! the cancellation flag stops workers from picking up queued jobs,
//! in-flight jobs finish their current attempt and bail at the next
//! check, and no output is produced.

use crate::config::GeneratorConfig;
use crate::provider::{build_prompt, GenerationProvider, ProviderError};
use crate::spec::{Endpoint, EndpointKey};
use crate::synth::ValueSynthesizer;
use crate::templates::{
    render_fallback_body, render_test_block, sanitize_test_identifier, unique_test_name,
};
use anyhow::bail;
use may::sync::{mpmc, mpsc};
use serde_json::Value;
use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Thread-safe, monotonic per-run counters.
///
/// `processed` counts jobs dispatched (not successes); `failed` counts
/// jobs whose generation failed permanently, whether or not the fallback
/// then produced a block.
#[derive(Debug, Default)]
pub struct ExecutorCounters {
    processed: AtomicU64,
    failed: AtomicU64,
}

impl ExecutorCounters {
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

/// Outcome of a completed run: one rendered block per scheduled
/// endpoint, in dispatch order.
#[derive(Debug)]
pub struct RunReport {
    pub blocks: Vec<String>,
    pub processed: u64,
    pub failed: u64,
}

/// One unit of work: an endpoint plus its pre-rendered prompt payload.
struct GenerationJob {
    index: usize,
    endpoint: Endpoint,
    prompt: String,
    test_name: String,
    example_body: Option<Value>,
}

enum JobResult {
    Block { text: String, used_fallback: bool },
    Fatal {
        endpoint: EndpointKey,
        error: ProviderError,
    },
    Cancelled,
}

/// Terminal states of the per-job retry state machine.
enum Resolution {
    Success(String),
    Exhausted(ProviderError),
    Fatal(ProviderError),
    Cancelled,
}

/// Backoff sleeps between attempts for a given budget: for N attempts
/// there are N-1 sleeps, starting at `initial_backoff_ms` and doubling.
pub fn backoff_schedule(max_retries: u32, initial_backoff_ms: u64) -> Vec<u64> {
    let mut schedule = Vec::new();
    let mut wait_ms = initial_backoff_ms;
    for _ in 1..max_retries {
        schedule.push(wait_ms);
        wait_ms = wait_ms.saturating_mul(2);
    }
    schedule
}

/// Strip markdown code fences and surrounding whitespace from generated
/// content. Returns `None` when nothing usable remains.
pub fn clean_generated(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let body = if trimmed.starts_with("```") {
        let without_open = trimmed.split_once('\n').map(|(_, rest)| rest).unwrap_or("");
        without_open
            .trim_end()
            .strip_suffix("```")
            .unwrap_or(without_open)
            .trim()
    } else {
        trimmed
    };
    if body.is_empty() {
        None
    } else {
        Some(body.to_string())
    }
}

pub struct ConcurrentExecutor {
    provider: Arc<dyn GenerationProvider>,
    config: GeneratorConfig,
    synthesizer: ValueSynthesizer,
    counters: Arc<ExecutorCounters>,
}

impl ConcurrentExecutor {
    pub fn new(provider: Arc<dyn GenerationProvider>, config: GeneratorConfig) -> Self {
        Self {
            provider,
            config,
            synthesizer: ValueSynthesizer::system(),
            counters: Arc::new(ExecutorCounters::default()),
        }
    }

    /// Replace the value synthesizer (tests inject a fixed source).
    pub fn with_synthesizer(mut self, synthesizer: ValueSynthesizer) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    pub fn counters(&self) -> Arc<ExecutorCounters> {
        Arc::clone(&self.counters)
    }

    /// Execute every scheduled endpoint and return one block per
    /// endpoint in submission order, or fail the whole run.
    pub fn run(&self, endpoints: &[Endpoint]) -> anyhow::Result<RunReport> {
        let jobs = self.build_jobs(endpoints);
        let total = jobs.len();
        if total == 0 {
            return Ok(RunReport {
                blocks: Vec::new(),
                processed: 0,
                failed: 0,
            });
        }

        // The job receiver is shared across worker coroutines, which
        // `mpsc::Receiver` does not support; `mpmc` is the multi-consumer
        // channel with the same API.
        let (job_tx, job_rx) = mpmc::channel::<GenerationJob>();
        let (result_tx, result_rx) = mpsc::channel::<(usize, JobResult)>();
        let job_rx = Arc::new(job_rx);
        let cancel = Arc::new(AtomicBool::new(false));

        let workers = self.config.thread_pool_size.min(total);
        info!(workers, jobs = total, "dispatching generation jobs");
        for worker_id in 0..workers {
            let jobs_rx = Arc::clone(&job_rx);
            let results_tx = result_tx.clone();
            let provider = Arc::clone(&self.provider);
            let config = self.config.clone();
            let cancel_flag = Arc::clone(&cancel);
            let counters = Arc::clone(&self.counters);
            let spawn_result = unsafe {
                may::coroutine::Builder::new()
                    .stack_size(self.config.stack_size)
                    .spawn(move || {
                        worker_loop(
                            worker_id, &jobs_rx, &results_tx, &*provider, &config,
                            &cancel_flag, &counters,
                        );
                    })
            };
            if let Err(e) = spawn_result {
                error!(worker_id, error = %e, "failed to spawn worker coroutine");
            }
        }
        drop(result_tx);

        for job in jobs {
            self.counters.processed.fetch_add(1, Ordering::Relaxed);
            if job_tx.send(job).is_err() {
                break;
            }
        }
        // Closing the job channel lets idle workers exit once the queue
        // drains, which bounds the drain after cancellation.
        drop(job_tx);

        let mut slots: Vec<Option<String>> = (0..total).map(|_| None).collect();
        let mut fatal: Option<(EndpointKey, ProviderError)> = None;
        while let Ok((index, result)) = result_rx.recv() {
            match result {
                JobResult::Block { text, used_fallback } => {
                    if used_fallback {
                        debug!(index, "job resolved through fallback");
                    }
                    slots[index] = Some(text);
                }
                JobResult::Fatal { endpoint, error } => {
                    if fatal.is_none() {
                        error!(
                            endpoint = %endpoint,
                            error = %error,
                            "fatal job failure; cancelling run"
                        );
                        cancel.store(true, Ordering::Release);
                        fatal = Some((endpoint, error));
                    }
                }
                JobResult::Cancelled => {}
            }
        }

        let processed = self.counters.processed();
        let failed = self.counters.failed();
        if let Some((endpoint, error)) = fatal {
            bail!(
                "run aborted: {} failed permanently: {} ({} jobs dispatched, {} failed)",
                endpoint,
                error,
                processed,
                failed
            );
        }
        let mut blocks = Vec::with_capacity(total);
        for (index, slot) in slots.into_iter().enumerate() {
            match slot {
                Some(text) => blocks.push(text),
                None => bail!("no result collected for job {}", index),
            }
        }
        info!(processed, failed, "generation run complete");
        Ok(RunReport {
            blocks,
            processed,
            failed,
        })
    }

    /// Build all jobs single-threaded before dispatch: unique test
    /// names, deterministic prompts, synthesized example bodies.
    fn build_jobs(&self, endpoints: &[Endpoint]) -> Vec<GenerationJob> {
        let mut seen = HashSet::new();
        endpoints
            .iter()
            .enumerate()
            .map(|(index, endpoint)| {
                let logical = endpoint.operation_id.clone().unwrap_or_else(|| {
                    format!(
                        "{}_{}",
                        endpoint.method.as_str().to_ascii_lowercase(),
                        endpoint.path
                    )
                });
                let test_name =
                    unique_test_name(&mut seen, &sanitize_test_identifier(&logical));
                let example_body = endpoint
                    .request_body
                    .as_ref()
                    .and_then(|b| b.constraints.as_ref())
                    .map(|c| self.synthesizer.synthesize("request_body", c));
                let prompt = build_prompt(endpoint, example_body.as_ref());
                GenerationJob {
                    index,
                    endpoint: endpoint.clone(),
                    prompt,
                    test_name,
                    example_body,
                }
            })
            .collect()
    }
}

#[allow(clippy::too_many_arguments)]
fn worker_loop(
    worker_id: usize,
    jobs: &mpmc::Receiver<GenerationJob>,
    results: &mpsc::Sender<(usize, JobResult)>,
    provider: &dyn GenerationProvider,
    config: &GeneratorConfig,
    cancel: &AtomicBool,
    counters: &ExecutorCounters,
) {
    debug!(worker_id, "worker coroutine started");
    loop {
        if cancel.load(Ordering::Acquire) {
            break;
        }
        let job = match jobs.recv() {
            Ok(job) => job,
            Err(_) => break,
        };
        let index = job.index;
        let endpoint_key = job.endpoint.key();
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            execute_job(provider, &job, config, cancel, counters)
        }));
        let result = match outcome {
            Ok(result) => result,
            Err(panic) => {
                error!(
                    worker_id,
                    endpoint = %endpoint_key,
                    panic = ?panic,
                    "worker panicked while executing job"
                );
                counters.failed.fetch_add(1, Ordering::Relaxed);
                JobResult::Fatal {
                    endpoint: endpoint_key,
                    error: ProviderError::Fatal("worker panicked during generation".to_string()),
                }
            }
        };
        if results.send((index, result)).is_err() {
            break;
        }
    }
    debug!(worker_id, "worker coroutine exiting");
}

fn execute_job(
    provider: &dyn GenerationProvider,
    job: &GenerationJob,
    config: &GeneratorConfig,
    cancel: &AtomicBool,
    counters: &ExecutorCounters,
) -> JobResult {
    match run_attempts(provider, &job.prompt, config, cancel) {
        Resolution::Success(body) => wrap_block(job, &body, false, counters),
        Resolution::Exhausted(last) => {
            counters.failed.fetch_add(1, Ordering::Relaxed);
            if config.use_fallback_on_error {
                warn!(
                    endpoint = %job.endpoint.key(),
                    error = %last,
                    "retry budget exhausted; using fallback template"
                );
                match render_fallback_body(&job.endpoint, job.example_body.as_ref()) {
                    Ok(body) => wrap_block(job, &body, true, counters),
                    Err(e) => JobResult::Fatal {
                        endpoint: job.endpoint.key(),
                        error: ProviderError::Fatal(format!("fallback rendering failed: {}", e)),
                    },
                }
            } else {
                JobResult::Fatal {
                    endpoint: job.endpoint.key(),
                    error: last,
                }
            }
        }
        Resolution::Fatal(error) => {
            counters.failed.fetch_add(1, Ordering::Relaxed);
            JobResult::Fatal {
                endpoint: job.endpoint.key(),
                error,
            }
        }
        Resolution::Cancelled => JobResult::Cancelled,
    }
}

fn wrap_block(
    job: &GenerationJob,
    body: &str,
    used_fallback: bool,
    counters: &ExecutorCounters,
) -> JobResult {
    match render_test_block(&job.endpoint, &job.test_name, body) {
        Ok(text) => JobResult::Block {
            text,
            used_fallback,
        },
        Err(e) => {
            counters.failed.fetch_add(1, Ordering::Relaxed);
            JobResult::Fatal {
                endpoint: job.endpoint.key(),
                error: ProviderError::Fatal(format!("block rendering failed: {}", e)),
            }
        }
    }
}

/// Bounded retry loop: Attempting → BackingOff → Retrying →
/// Resolved{Success | Exhausted | Fatal | Cancelled}.
fn run_attempts(
    provider: &dyn GenerationProvider,
    prompt: &str,
    config: &GeneratorConfig,
    cancel: &AtomicBool,
) -> Resolution {
    if config.max_retries == 0 {
        return Resolution::Exhausted(ProviderError::Transient(
            "retry budget is zero".to_string(),
        ));
    }
    let mut attempt: u32 = 0;
    let mut wait_ms = config.initial_backoff_ms;
    loop {
        if cancel.load(Ordering::Acquire) {
            return Resolution::Cancelled;
        }
        attempt += 1;
        let failure = match provider.generate(prompt) {
            Ok(raw) => match clean_generated(&raw) {
                Some(body) => return Resolution::Success(body),
                None => {
                    ProviderError::Malformed("generated content empty after cleanup".to_string())
                }
            },
            Err(error) if error.is_fatal() => return Resolution::Fatal(error),
            Err(error) => error,
        };
        debug!(attempt, error = %failure, "generation attempt failed");
        if attempt >= config.max_retries {
            return Resolution::Exhausted(failure);
        }
        may::coroutine::sleep(Duration::from_millis(wait_ms));
        wait_ms = wait_ms.saturating_mul(2);
    }
}
