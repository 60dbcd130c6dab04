//! # Runtime
//!
//! A small, bounded [Tokio](https://tokio.rs) runtime that serves custom-protocol requests off
//! the UI event loop. The worker count is capped so a burst of slow reads cannot starve the host
//! process of threads.
//!
//! ## Example
//!
//! ```rust
//! use schemefs_runtime::{WorkerConfig, build_worker_runtime};
//!
//! let runtime = build_worker_runtime(&WorkerConfig::default().with_worker_threads(2))?;
//! let answer = runtime.block_on(async { 40 + 2 });
//! assert_eq!(answer, 42);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub use anyhow::Result;

use anyhow::Context;
use std::thread::available_parallelism;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

/// Upper bound for protocol workers; reads are I/O bound, more threads buy nothing.
pub const MAX_WORKER_THREADS: usize = 8;
/// 2 `MiB`.
const DEFAULT_STACK_SIZE: usize = 2 * 1024 * 1024;
const MIN_STACK_SIZE: usize = 512 * 1024;
const MAX_STACK_SIZE: usize = 8 * 1024 * 1024;
const DEFAULT_THREAD_NAME: &str = "schemefs-io";
const THREAD_KEEP_ALIVE: Duration = Duration::from_secs(30);

/// Settings for the protocol worker runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    pub worker_threads: usize,
    pub stack_size: usize,
    pub thread_name: String,
    pub thread_keep_alive: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        let detected = available_parallelism().map_or(2, std::num::NonZeroUsize::get);
        Self {
            worker_threads: (detected / 2).clamp(1, MAX_WORKER_THREADS),
            stack_size: DEFAULT_STACK_SIZE,
            thread_name: DEFAULT_THREAD_NAME.to_owned(),
            thread_keep_alive: THREAD_KEEP_ALIVE,
        }
    }
}

impl WorkerConfig {
    /// Clamped to `1..=MAX_WORKER_THREADS`.
    #[must_use = "Returns the adjusted configuration"]
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads.clamp(1, MAX_WORKER_THREADS);
        self
    }

    #[must_use = "Returns the adjusted configuration"]
    pub fn with_stack_size(mut self, size: usize) -> Self {
        self.stack_size = size.clamp(MIN_STACK_SIZE, MAX_STACK_SIZE);
        self
    }

    #[must_use = "Returns the adjusted configuration"]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.thread_name = if name.trim().is_empty() { DEFAULT_THREAD_NAME.to_owned() } else { name };
        self
    }
}

/// Builds the multi-threaded worker runtime described by `config`.
///
/// # Errors
/// Returns an error if the operating system refuses to spawn the worker threads.
pub fn build_worker_runtime(config: &WorkerConfig) -> Result<Runtime> {
    debug!(config = ?config, "Building protocol worker runtime");

    Builder::new_multi_thread()
        .worker_threads(config.worker_threads.clamp(1, MAX_WORKER_THREADS))
        .thread_name(&config.thread_name)
        .thread_stack_size(config.stack_size.clamp(MIN_STACK_SIZE, MAX_STACK_SIZE))
        .thread_keep_alive(config.thread_keep_alive)
        .enable_all()
        .build()
        .context("Failed to initialize protocol worker runtime")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_threads_are_bounded() {
        assert_eq!(WorkerConfig::default().with_worker_threads(0).worker_threads, 1);
        assert_eq!(
            WorkerConfig::default().with_worker_threads(512).worker_threads,
            MAX_WORKER_THREADS
        );
        let default = WorkerConfig::default().worker_threads;
        assert!((1..=MAX_WORKER_THREADS).contains(&default));
    }

    #[test]
    fn stack_size_and_name_are_sanitized() {
        let cfg = WorkerConfig::default().with_stack_size(1).with_thread_name("   ");
        assert_eq!(cfg.stack_size, MIN_STACK_SIZE);
        assert_eq!(cfg.thread_name, DEFAULT_THREAD_NAME);

        let cfg = WorkerConfig::default().with_stack_size(usize::MAX);
        assert_eq!(cfg.stack_size, MAX_STACK_SIZE);
    }

    #[test]
    fn runtime_runs_tasks_on_named_workers() {
        let runtime = build_worker_runtime(
            &WorkerConfig::default().with_worker_threads(1).with_thread_name("proto-test"),
        )
        .expect("runtime");

        let name = runtime
            .block_on(async {
                tokio::spawn(async { std::thread::current().name().map(str::to_owned) }).await
            })
            .expect("task joined");
        assert_eq!(name.as_deref(), Some("proto-test"));
    }
}
