//! Splitting of a multiregion container into per-channel-pair stems.
//!
//! `vgmstream-cli` does the decoding. This module asks it for the layout of
//! the container, then requests one stereo file per channel pair and
//! section, named so that [`crate::StemDescriptor`] can classify it.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{ExternalCommand, ExtractConfig, Result, ToolRunner};

pub const EXTRACT_PROGRAM: &str = "vgmstream-cli";

/// Metadata printed by `vgmstream-cli -I -m`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamInfo {
    pub channels: u32,
    #[serde(rename = "streamInfo")]
    pub stream: SubstreamInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstreamInfo {
    pub index: u32,
    #[serde(default)]
    pub name: String,
    /// Number of substreams in the container.
    pub total: u32,
}

impl StreamInfo {
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Section of the song an extracted stem covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StemSection {
    /// Intro and one pass of the loop, as the container plays it.
    Aio,
    Intro,
    Loop,
}

impl fmt::Display for StemSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StemSection::Aio => "aio",
            StemSection::Intro => "intro",
            StemSection::Loop => "loop",
        })
    }
}

impl ExtractConfig {
    /// Sections enabled by this configuration, in export order.
    pub fn sections(&self) -> Vec<StemSection> {
        [
            (self.aio, StemSection::Aio),
            (self.intro, StemSection::Intro),
            (self.loop_section, StemSection::Loop),
        ]
        .into_iter()
        .filter_map(|(enabled, section)| enabled.then_some(section))
        .collect()
    }
}

/// First channel of every stereo pair in a stream with `channels` channels.
pub fn channel_pairs(channels: u32) -> impl Iterator<Item = u32> {
    (0..channels.saturating_sub(1)).step_by(2)
}

pub fn info_command(container: &Path, stream: u32) -> ExternalCommand {
    ExternalCommand::new(EXTRACT_PROGRAM)
        .args(["-I", "-m"])
        .path_arg(container)
        .args(["-s".to_string(), stream.to_string()])
}

/// Output pattern for a stem. `?s` is expanded by the tool to the
/// substream number, which becomes the track number.
pub fn stem_output_pattern(output_dir: &Path, channel: u32, section: StemSection) -> PathBuf {
    output_dir.join(format!("?s_{channel:02}_{section}.wav"))
}

pub fn extract_command(
    container: &Path,
    stream: u32,
    channel: u32,
    section: StemSection,
    output_dir: &Path,
) -> ExternalCommand {
    let output = stem_output_pattern(output_dir, channel, section);
    let command = ExternalCommand::new(EXTRACT_PROGRAM)
        .path_arg(container)
        .args(["-s".to_string(), stream.to_string()])
        .args(["-2".to_string(), channel.to_string()]);

    match section {
        StemSection::Aio => command.arg("-o").path_arg(&output),
        // Original sample format, no loop section, no fade out.
        StemSection::Intro => command
            .args(["-w", "-l", "-1", "-f", "0", "-o"])
            .path_arg(&output),
        // Original sample format, intro removed, a single loop, no fade out.
        StemSection::Loop => command
            .args(["-w", "-o"])
            .path_arg(&output)
            .args(["-k", "-2", "-l", "1", "-f", "0"]),
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExtractReport {
    pub streams: u32,
    pub exported: usize,
    pub failed: usize,
}

fn stream_info(runner: &dyn ToolRunner, container: &Path, stream: u32) -> Result<StreamInfo> {
    let stdout = runner.capture(&info_command(container, stream))?;
    StreamInfo::from_json(&stdout)
}

/// Exports every enabled section of every channel pair of every substream.
///
/// Failing to read stream metadata aborts the run. A failed export is
/// logged and counted, and the run continues with the next stem.
pub fn extract_container(
    config: &ExtractConfig,
    runner: &dyn ToolRunner,
) -> Result<ExtractReport> {
    let container = config.container.as_path();
    let sections = config.sections();

    let layout = stream_info(runner, container, 0)?;
    info!(container = %container.display(), streams = layout.stream.total, "stream total");

    let mut report = ExtractReport {
        streams: layout.stream.total,
        ..ExtractReport::default()
    };

    for stream in 1..=layout.stream.total {
        let info = stream_info(runner, container, stream)?;
        info!(stream, channels = info.channels, name = %info.stream.name, "extracting stream");

        for channel in channel_pairs(info.channels) {
            for &section in &sections {
                info!(stream, channel, %section, "exporting stem for channel pair");
                let command =
                    extract_command(container, stream, channel, section, &config.output_dir);
                match runner.run(&command) {
                    Ok(()) => report.exported += 1,
                    Err(err) => {
                        warn!(stream, channel, %section, error = %err, "failed to export stem");
                        report.failed += 1;
                    }
                }
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::StemMixError;

    const CONTAINER_JSON: &str =
        r#"{"channels":2,"sampleRate":48000,"streamInfo":{"index":0,"name":"bgm","total":2}}"#;

    /// Answers info requests from a table of channel counts and fails any
    /// export whose channel is listed in `failing_channels`.
    struct ScriptedRunner {
        channels: Vec<u32>,
        failing_channels: Vec<u32>,
        exports: Mutex<Vec<ExternalCommand>>,
    }

    impl ScriptedRunner {
        fn new(channels: Vec<u32>) -> Self {
            Self {
                channels,
                failing_channels: Vec::new(),
                exports: Mutex::new(Vec::new()),
            }
        }
    }

    impl ToolRunner for ScriptedRunner {
        fn run(&self, command: &ExternalCommand) -> Result<()> {
            self.exports.lock().unwrap().push(command.clone());
            let channel_at = command.args.iter().position(|arg| arg == "-2").unwrap() + 1;
            let channel: u32 = command.args[channel_at].to_str().unwrap().parse().unwrap();
            if self.failing_channels.contains(&channel) {
                Err(StemMixError::tool(EXTRACT_PROGRAM, "exit status: 1"))
            } else {
                Ok(())
            }
        }

        fn capture(&self, command: &ExternalCommand) -> Result<Vec<u8>> {
            let stream: usize = command.args.last().unwrap().to_str().unwrap().parse().unwrap();
            if stream == 0 {
                return Ok(format!(
                    r#"{{"channels":2,"streamInfo":{{"index":0,"name":"","total":{}}}}}"#,
                    self.channels.len()
                )
                .into_bytes());
            }
            Ok(format!(
                r#"{{"channels":{},"streamInfo":{{"index":{stream},"name":"s{stream}","total":{}}}}}"#,
                self.channels[stream - 1],
                self.channels.len()
            )
            .into_bytes())
        }
    }

    #[test]
    fn parses_stream_info_and_ignores_extra_fields() {
        let info = StreamInfo::from_json(CONTAINER_JSON.as_bytes()).unwrap();
        assert_eq!(info.channels, 2);
        assert_eq!(info.stream.name, "bgm");
        assert_eq!(info.stream.total, 2);
    }

    #[test]
    fn malformed_stream_info_is_an_error() {
        let err = StreamInfo::from_json(b"not json").unwrap_err();
        assert!(matches!(err, StemMixError::StreamInfo(_)));
    }

    #[test]
    fn channel_pairs_cover_every_stereo_pair() {
        assert_eq!(channel_pairs(12).collect::<Vec<_>>(), vec![0, 2, 4, 6, 8, 10]);
        assert_eq!(channel_pairs(2).collect::<Vec<_>>(), vec![0]);
        assert_eq!(channel_pairs(3).collect::<Vec<_>>(), vec![0]);
        assert_eq!(channel_pairs(1).count(), 0);
        assert_eq!(channel_pairs(0).count(), 0);
    }

    #[test]
    fn builds_section_specific_commands() {
        let container = Path::new("0xeda82cc0.srsa");
        let out = Path::new("stems");

        let intro = extract_command(container, 3, 4, StemSection::Intro, out);
        assert_eq!(
            intro.to_string(),
            "vgmstream-cli 0xeda82cc0.srsa -s 3 -2 4 -w -l -1 -f 0 -o stems/?s_04_intro.wav"
        );

        let looped = extract_command(container, 3, 10, StemSection::Loop, out);
        assert_eq!(
            looped.to_string(),
            "vgmstream-cli 0xeda82cc0.srsa -s 3 -2 10 -w -o stems/?s_10_loop.wav -k -2 -l 1 -f 0"
        );

        let aio = extract_command(container, 1, 0, StemSection::Aio, out);
        assert_eq!(
            aio.to_string(),
            "vgmstream-cli 0xeda82cc0.srsa -s 1 -2 0 -o stems/?s_00_aio.wav"
        );

        assert_eq!(
            info_command(container, 2).to_string(),
            "vgmstream-cli -I -m 0xeda82cc0.srsa -s 2"
        );
    }

    #[test]
    fn default_sections_are_intro_and_loop() {
        let mut config = ExtractConfig::new("x.srsa");
        assert_eq!(config.sections(), vec![StemSection::Intro, StemSection::Loop]);

        config.aio = true;
        config.intro = false;
        assert_eq!(config.sections(), vec![StemSection::Aio, StemSection::Loop]);
    }

    #[test]
    fn extracts_every_pair_of_every_stream() {
        let runner = ScriptedRunner::new(vec![12, 2]);
        let config = ExtractConfig::new("x.srsa");

        let report = extract_container(&config, &runner).unwrap();

        assert_eq!(report.streams, 2);
        assert_eq!(report.exported, (6 + 1) * 2);
        assert_eq!(report.failed, 0);
    }

    #[test]
    fn failed_exports_do_not_stop_the_run() {
        let mut runner = ScriptedRunner::new(vec![6]);
        runner.failing_channels.push(2);
        let config = ExtractConfig::new("x.srsa");

        let report = extract_container(&config, &runner).unwrap();

        assert_eq!(report.exported, 4);
        assert_eq!(report.failed, 2);
        assert_eq!(runner.exports.lock().unwrap().len(), 6);
    }
}
