//! # apitestgen
//!
//! **apitestgen** turns an [OpenAPI 3.1.0](https://spec.openapis.org/oas/v3.1.0)
//! specification into a prioritized, dependency-aware batch of LLM test
//! generation jobs and collects the results into one compilable Rust
//! integration test file.
//!
//! ## Overview
//!
//! The generator parses the specification into endpoint metadata, scores
//! each operation for complexity, orders the batch so that creation
//! endpoints run before the operations that depend on the resources they
//! create, and dispatches one generation job per endpoint to a pool of
//! `may` coroutines. Jobs that exhaust their retry budget resolve to a
//! deterministic fallback template, so a run can always produce a
//! complete test file even with the generation service unreachable.
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//!
//! - **[`spec`]** - OpenAPI 3.1 document loading, `$ref` resolution, and
//!   endpoint metadata extraction with complexity scoring
//! - **[`scheduler`]** - Priority classes, stable ordering, and advisory
//!   resource dependencies between endpoints
//! - **[`executor`]** - Coroutine worker pool, per-job retry state
//!   machine, run counters, and cancellation
//! - **[`provider`]** - Generation service seam (chat-completions client
//!   plus an offline provider)
//! - **[`synth`]** - Constraint-respecting example value synthesis
//! - **[`templates`]** - Test block wrapping and the deterministic
//!   fallback bodies (Askama)
//! - **[`config`]** - Run configuration from environment and CLI
//! - **[`cli`]** - The `apitestgen` command-line surface
//!
//! ### Generation Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant User
//!     participant CLI as CLI<br/>(apitestgen)
//!     participant Spec as spec::load_document
//!     participant Build as spec::build_endpoints
//!     participant Sched as scheduler::schedule
//!     participant Exec as executor::ConcurrentExecutor
//!     participant Prov as provider (LLM)
//!     participant Tmpl as templates (fallback)
//!     participant FS as File System
//!
//!     User->>CLI: apitestgen generate<br/>--spec openapi.yaml --output tests.rs
//!     CLI->>Spec: load_document("openapi.yaml")
//!     Spec->>Build: build_endpoints(&doc)
//!     Build->>Build: Merge parameters,<br/>resolve $refs, score complexity
//!     Build-->>CLI: Vec<Endpoint>
//!
//!     CLI->>Sched: schedule(endpoints)
//!     Sched->>Sched: Priority classes,<br/>advisory dependencies
//!     Sched-->>CLI: Schedule (dispatch order)
//!
//!     CLI->>Exec: run(&schedule.ordered)
//!     loop per endpoint (worker pool)
//!         Exec->>Prov: generate(prompt)
//!         alt success
//!             Prov-->>Exec: test body
//!         else retries exhausted
//!             Exec->>Tmpl: render_fallback_body(endpoint)
//!             Tmpl-->>Exec: deterministic body
//!         end
//!     end
//!     Exec-->>CLI: RunReport (blocks in order)
//!
//!     CLI->>FS: write output file
//!     CLI-->>User: processed N jobs, M failed
//! ```
//!
//! ### Key Architectural Patterns
//!
//! 1. **OpenAPI-Driven**: Every job is derived from the specification;
//!    no endpoint list is maintained by hand
//! 2. **Coroutine-Based Concurrency**: Jobs run in lightweight `may`
//!    coroutines; concurrency affects throughput, never output order
//! 3. **Channel Communication**: Jobs and results travel over MPSC
//!    channels; results are slotted back into submission order
//! 4. **Deterministic Fallback**: Retry exhaustion degrades to templates,
//!    never to a partial output file
//! 5. **Provider Seam**: The executor only knows
//!    `(prompt) -> Result<String, ProviderError>`, so tests inject fakes
//!
//! ## Quick Start
//!
//! ```no_run
//! use apitestgen::config::GeneratorConfig;
//! use apitestgen::executor::ConcurrentExecutor;
//! use apitestgen::provider::DisabledProvider;
//! use apitestgen::scheduler::schedule;
//! use apitestgen::spec::{build_endpoints, load_document};
//! use std::sync::Arc;
//!
//! let doc = load_document("openapi.yaml".as_ref()).expect("failed to load spec");
//! let plan = schedule(build_endpoints(&doc));
//!
//! // Offline run: every block comes from the fallback templates.
//! let executor = ConcurrentExecutor::new(Arc::new(DisabledProvider), GeneratorConfig::default());
//! let report = executor.run(&plan.ordered).expect("run failed");
//! println!("{} blocks generated", report.blocks.len());
//! ```
//!
//! ## Runtime Considerations
//!
//! apitestgen uses the `may` coroutine runtime, not tokio or async-std.
//! This means:
//!
//! - Generation jobs run in coroutines (lightweight threads)
//! - Stack size is configurable via the `ATG_STACK_SIZE` environment
//!   variable
//! - The HTTP client is `reqwest::blocking`; calls park the coroutine,
//!   not the scheduler

pub mod cli;
pub mod config;
pub mod executor;
pub mod provider;
pub mod scheduler;
pub mod spec;
pub mod synth;
pub mod templates;

pub use config::GeneratorConfig;
pub use executor::{ConcurrentExecutor, RunReport};
pub use provider::{GenerationProvider, ProviderError};
pub use scheduler::{schedule, Schedule};
pub use spec::{build_endpoints, load_document, Endpoint, EndpointKey, HttpMethod};
