//! End-to-end mixdown of a directory of stems.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    build_mix_command, discovery, MixConfig, MixStrategy, Result, StemDescriptor, ToolRunner,
    TrackGroup, TrackRegistry, WorkerPool,
};

/// A file that was left out of collation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Tracks ready for dispatch, plus the files that did not classify.
#[derive(Debug)]
pub struct Collation {
    pub tracks: Vec<TrackGroup>,
    pub skipped: Vec<SkippedFile>,
}

/// Classifies every path and groups the stems by track.
///
/// Names that do not parse are logged and reported, never fatal.
pub fn collate<I>(paths: I) -> Collation
where
    I: IntoIterator<Item = PathBuf>,
{
    let mut registry = TrackRegistry::new();
    let mut skipped = Vec::new();

    for path in paths {
        match StemDescriptor::from_path(&path) {
            Ok(stem) => registry.add_stem(stem),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping invalid file");
                skipped.push(SkippedFile {
                    path,
                    reason: err.to_string(),
                });
            }
        }
    }

    Collation {
        tracks: registry.into_tracks(),
        skipped,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TrackStatus {
    Mixed { output: PathBuf },
    Skipped { reason: String },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackOutcome {
    pub track_number: u32,
    pub channel_count: usize,
    pub strategy: MixStrategy,
    pub status: TrackStatus,
}

impl fmt::Display for TrackOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "track {} ({}): ", self.track_number, self.strategy)?;
        match &self.status {
            TrackStatus::Mixed { output } => write!(f, "mixed to {}", output.display()),
            TrackStatus::Skipped { reason } => write!(f, "skipped, {reason}"),
            TrackStatus::Failed { error } => write!(f, "failed, {error}"),
        }
    }
}

/// Picks a strategy for one track, builds its command and runs it.
pub fn process_track(
    track: &TrackGroup,
    config: &MixConfig,
    runner: &dyn ToolRunner,
) -> TrackOutcome {
    let channel_count = track.channel_count();
    let strategy = MixStrategy::for_channel_count(channel_count);
    info!(
        track = track.track_number(),
        channels = channel_count,
        %strategy,
        stems = %track,
        "processing track"
    );

    let outcome = |status| TrackOutcome {
        track_number: track.track_number(),
        channel_count,
        strategy,
        status,
    };

    let command = match build_mix_command(track, strategy, config) {
        Ok(Some(command)) => command,
        Ok(None) => {
            let reason = match strategy {
                MixStrategy::StereoPassthrough => "stereo track needs no mix".to_string(),
                _ => format!("no mix strategy for {channel_count} channels"),
            };
            return outcome(TrackStatus::Skipped { reason });
        }
        Err(err) => {
            warn!(track = track.track_number(), error = %err, "error processing track");
            return outcome(TrackStatus::Failed {
                error: err.to_string(),
            });
        }
    };

    let external = command.to_external();
    debug!(track = track.track_number(), command = %external, "running mixer");
    match runner.run(&external) {
        Ok(()) => outcome(TrackStatus::Mixed {
            output: command.output_path,
        }),
        Err(err) => {
            warn!(track = track.track_number(), error = %err, "error processing track");
            outcome(TrackStatus::Failed {
                error: err.to_string(),
            })
        }
    }
}

/// Per-track results of one batch, in track order.
#[derive(Debug, Default, Serialize)]
pub struct BatchReport {
    pub outcomes: Vec<TrackOutcome>,
    pub skipped_files: Vec<SkippedFile>,
}

impl BatchReport {
    pub fn mixed(&self) -> usize {
        self.count(|status| matches!(status, TrackStatus::Mixed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|status| matches!(status, TrackStatus::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|status| matches!(status, TrackStatus::Failed { .. }))
    }

    pub fn outcome(&self, track_number: u32) -> Option<&TrackOutcome> {
        self.outcomes
            .iter()
            .find(|outcome| outcome.track_number == track_number)
    }

    fn count(&self, predicate: impl Fn(&TrackStatus) -> bool) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| predicate(&outcome.status))
            .count()
    }
}

/// Mixes every track found in `config.input_dir`.
///
/// Only configuration and directory listing errors are returned; per-track
/// failures are recorded in the report.
pub fn mix_directory(config: &MixConfig, runner: &dyn ToolRunner) -> Result<BatchReport> {
    config.validate()?;
    info!(input = %config.input_dir.display(), "processing input directory");

    let files = discovery::list_stem_files(&config.input_dir)?;
    let Collation { tracks, skipped } = collate(files);

    let mut pool = WorkerPool::new(config.worker_count());
    info!(tracks = tracks.len(), workers = pool.workers(), "dispatching tracks");
    let mut outcomes = pool.run(tracks, |track| process_track(&track, config, runner))?;
    outcomes.sort_by_key(|outcome| outcome.track_number);

    let report = BatchReport {
        outcomes,
        skipped_files: skipped,
    };
    info!(
        mixed = report.mixed(),
        skipped = report.skipped(),
        failed = report.failed(),
        invalid_files = report.skipped_files.len(),
        "batch complete"
    );
    Ok(report)
}
