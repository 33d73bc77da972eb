//! Queue and flush tunables.
//!
//! These are process-wide values captured once at startup; the engine reads
//! an immutable snapshot.

use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// Default interval between periodic flushes
const DEFAULT_FLUSH_INTERVAL_MS: u64 = 1000;

/// Default queue length that triggers an out-of-band flush
const DEFAULT_FLUSH_THRESHOLD: usize = 1024;

/// Default queue length at which shedding starts
const DEFAULT_DROP_THRESHOLD: usize = 4 * 65536;

/// Default hard cap on queued events
const DEFAULT_MAX_QUEUED: usize = 2 * DEFAULT_DROP_THRESHOLD;

/// Pipeline configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Interval between periodic flushes, in milliseconds
    pub flush_interval_ms: u64,

    /// Queue length that triggers an out-of-band flush (also the batch size)
    pub flush_threshold: usize,

    /// Hard cap on queued events (0 = unbounded)
    pub max_queued: usize,

    /// Queue length at which load shedding starts
    pub drop_threshold: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            flush_interval_ms: DEFAULT_FLUSH_INTERVAL_MS,
            flush_threshold: DEFAULT_FLUSH_THRESHOLD,
            max_queued: DEFAULT_MAX_QUEUED,
            drop_threshold: DEFAULT_DROP_THRESHOLD,
        }
    }
}

impl PipelineConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.flush_interval_ms == 0 {
            return Err(ConfigError::validation("pipeline.flush_interval_ms must be nonzero"));
        }
        if self.flush_threshold == 0 {
            return Err(ConfigError::validation("pipeline.flush_threshold must be nonzero"));
        }
        if self.max_queued > 0 && self.max_queued < self.flush_threshold {
            return Err(ConfigError::validation(
                "pipeline.max_queued must be at least pipeline.flush_threshold",
            ));
        }
        Ok(())
    }
}
