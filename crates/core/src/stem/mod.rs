//! Classification of stem files by their name.
//!
//! Every stem follows `<track>_<channel>_<type>.<ext>`, e.g. `12_04_loop.wav`
//! is the loop section of channel pair 4 of track 12.

use std::{
    cmp::Ordering,
    convert::Infallible,
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::{Result, StemMixError};

/// Section of a track a stem holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StemType {
    Intro,
    Loop,
    OneShot,
    /// Any other token, e.g. `aio`. Grouped like the others but never used
    /// to derive a channel count.
    Other(String),
}

impl StemType {
    fn priority(&self) -> u8 {
        match self {
            StemType::Intro => 0,
            StemType::Loop => 1,
            StemType::OneShot => 2,
            StemType::Other(_) => 3,
        }
    }

    /// Maps a file name token onto a stem type. Never fails.
    pub fn from_token(token: &str) -> Self {
        match token {
            "intro" => StemType::Intro,
            "loop" => StemType::Loop,
            "oneshot" => StemType::OneShot,
            other => StemType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            StemType::Intro => "intro",
            StemType::Loop => "loop",
            StemType::OneShot => "oneshot",
            StemType::Other(token) => token,
        }
    }
}

impl Ord for StemType {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority()
            .cmp(&other.priority())
            .then_with(|| self.as_str().cmp(other.as_str()))
    }
}

impl PartialOrd for StemType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for StemType {
    type Err = Infallible;

    fn from_str(token: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from_token(token))
    }
}

impl fmt::Display for StemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a single stem file, parsed from its name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StemDescriptor {
    pub track_number: u32,
    pub channel_number: u32,
    pub stem_type: StemType,
    pub extension: String,
    pub file_name: String,
    pub path: PathBuf,
}

impl StemDescriptor {
    /// Parses the file name component of `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                StemMixError::parse(&path.to_string_lossy(), "not a UTF-8 file name")
            })?;

        let segments: Vec<&str> = file_name.split('_').collect();
        let [track, channel, tail] = segments.as_slice() else {
            return Err(StemMixError::parse(
                file_name,
                format!(
                    "expected <track>_<channel>_<type>.<ext>, found {} segment(s)",
                    segments.len()
                ),
            ));
        };

        let track_number = parse_index(file_name, track, "track number")?;
        let channel_number = parse_index(file_name, channel, "channel number")?;

        let (token, extension) = tail
            .split_once('.')
            .ok_or_else(|| StemMixError::parse(file_name, "missing file extension"))?;
        if token.is_empty() {
            return Err(StemMixError::parse(file_name, "missing stem type"));
        }
        if extension.is_empty() {
            return Err(StemMixError::parse(file_name, "missing file extension"));
        }

        let stem_type = StemType::from_token(token);

        Ok(Self {
            track_number,
            channel_number,
            stem_type,
            extension: extension.to_string(),
            file_name: file_name.to_string(),
            path: path.to_path_buf(),
        })
    }

    /// Rebuilds the file name from the parsed fields, without zero padding.
    pub fn canonical_file_name(&self) -> String {
        format!(
            "{}_{}_{}.{}",
            self.track_number, self.channel_number, self.stem_type, self.extension
        )
    }
}

impl fmt::Display for StemDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name)
    }
}

fn parse_index(file_name: &str, segment: &str, what: &str) -> Result<u32> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(StemMixError::parse(
            file_name,
            format!("{what} `{segment}` is not a non-negative integer"),
        ));
    }
    segment
        .parse()
        .map_err(|err| StemMixError::parse(file_name, format!("{what} `{segment}`: {err}")))
}
