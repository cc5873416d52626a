use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{Result, StemMixError};

/// Settings for a mixdown run over a directory of stems.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MixConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// How many times the loop section repeats after the intro.
    pub loops: u32,
    /// Requested worker count. `None` or a negative value uses every
    /// available core.
    pub workers: Option<i64>,
}

impl Default for MixConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::new(),
            output_dir: PathBuf::new(),
            loops: 2,
            workers: None,
        }
    }
}

impl MixConfig {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.loops == 0 {
            return Err(StemMixError::Config(
                "loop count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of workers the scheduler should start.
    pub fn worker_count(&self) -> usize {
        resolve_worker_count(self.workers)
    }
}

/// Resolves a requested worker count into a usable pool size.
///
/// Unset and negative requests fall back to the available parallelism. Zero
/// is clamped to a single worker so queued tracks are always drained.
pub fn resolve_worker_count(requested: Option<i64>) -> usize {
    match requested {
        Some(0) => {
            tracing::warn!("worker count of 0 requested, using a single worker");
            1
        }
        Some(n) if n > 0 => usize::try_from(n).unwrap_or(usize::MAX),
        _ => std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1),
    }
}

/// Settings for splitting a multiregion container into stereo stems.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    pub container: PathBuf,
    pub output_dir: PathBuf,
    /// Export the full song (intro plus loop) per channel pair.
    pub aio: bool,
    pub intro: bool,
    #[serde(rename = "loop")]
    pub loop_section: bool,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            container: PathBuf::new(),
            output_dir: PathBuf::from("."),
            aio: false,
            intro: true,
            loop_section: true,
        }
    }
}

impl ExtractConfig {
    pub fn new(container: impl Into<PathBuf>) -> Self {
        Self {
            container: container.into(),
            ..Self::default()
        }
    }
}
