//! Pipeline configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Memory available to the whole pipeline (bytes). Stateful operators
    /// take a fixed fraction of this as their hard state ceiling.
    pub allowed_memory_bytes: usize,

    /// Number of parallel ingest workers; each stateful operator keeps one
    /// shard per worker.
    pub worker_threads: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            allowed_memory_bytes: 512 * 1024 * 1024, // 512 MiB default
            worker_threads: 4,
        }
    }
}

impl PipelineConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `LOGQ_ALLOWED_MEMORY_BYTES`: pipeline memory allowance in bytes
    /// - `LOGQ_WORKER_THREADS`: parallel ingest workers
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("LOGQ_ALLOWED_MEMORY_BYTES") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.allowed_memory_bytes = v;
            }
        }

        if let Ok(s) = std::env::var("LOGQ_WORKER_THREADS") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.worker_threads = v;
            }
        }

        cfg
    }
}
