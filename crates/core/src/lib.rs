//! Core library for the stem mixer.
//!
//! Stems exported from multiregion containers are named
//! `<track>_<channel>_<type>.<ext>`. This crate rebuilds the track structure
//! from a flat directory of such files, decides per track how its stems are
//! mixed, builds the external mixer invocation and fans the tracks out over
//! a bounded worker pool. The decoding and mixing themselves are delegated
//! to external tools behind the [`ToolRunner`] trait.

pub mod command;
pub mod config;
pub mod discovery;
pub mod error;
pub mod extract;
pub mod ordering;
pub mod pipeline;
pub mod registry;
pub mod scheduler;
pub mod stem;
pub mod strategy;
pub mod tool;

pub use command::{build_mix_command, mix_filter_graph, mix_output_path, MixCommand};
pub use config::{resolve_worker_count, ExtractConfig, MixConfig};
pub use error::{Result, StemMixError};
pub use extract::{extract_container, ExtractReport, StemSection, StreamInfo};
pub use pipeline::{
    collate, mix_directory, process_track, BatchReport, SkippedFile, TrackOutcome, TrackStatus,
};
pub use registry::{StemTrait, TrackGroup, TrackRegistry};
pub use scheduler::{BatchState, WorkerPool};
pub use stem::{StemDescriptor, StemType};
pub use strategy::MixStrategy;
pub use tool::{DryRunRunner, ExternalCommand, ProcessRunner, ToolRunner};
