use std::fmt;

use serde::{Deserialize, Serialize};

/// How a track's stems are combined into its final mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MixStrategy {
    /// Five intro and five loop pairs mixed into an intro followed by a
    /// repeated loop.
    TwelveChannelMix,
    /// A single stereo pair. Recognised, but no mix is required.
    StereoPassthrough,
    /// Not a track shape we know how to mix. Skipped.
    Unsupported,
}

impl MixStrategy {
    pub fn for_channel_count(channel_count: usize) -> Self {
        match channel_count {
            12 => MixStrategy::TwelveChannelMix,
            2 => MixStrategy::StereoPassthrough,
            _ => MixStrategy::Unsupported,
        }
    }
}

impl fmt::Display for MixStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MixStrategy::TwelveChannelMix => "12-channel mix",
            MixStrategy::StereoPassthrough => "stereo passthrough",
            MixStrategy::Unsupported => "unsupported",
        })
    }
}
