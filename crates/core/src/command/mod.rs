//! Construction of mixer invocations.

use std::path::{Path, PathBuf};

use crate::{
    ordering::{mixable_stems, stem_order},
    ExternalCommand, MixConfig, MixStrategy, Result, StemDescriptor, StemMixError, StemType,
    TrackGroup,
};

pub const MIX_PROGRAM: &str = "ffmpeg";
pub const MIX_OUTPUT_EXTENSION: &str = "flac";
/// Stereo pairs per section in a twelve channel track once the silent
/// pair is dropped.
pub const MIX_GROUP_SIZE: usize = 5;
/// Upper bound on the samples `aloop` buffers for the loop section.
const LOOP_SIZE_CEILING: &str = "2e9";

/// A fully resolved mixdown of one track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixCommand {
    pub track_number: u32,
    /// Intro stems first, then loop stems, each in channel order.
    pub inputs: Vec<PathBuf>,
    pub filter_graph: String,
    pub output_path: PathBuf,
}

impl MixCommand {
    pub fn to_external(&self) -> ExternalCommand {
        let mut command = ExternalCommand::new(MIX_PROGRAM).arg("-y");
        for input in &self.inputs {
            command = command.arg("-i").path_arg(input);
        }
        command
            .arg("-filter_complex")
            .arg(self.filter_graph.as_str())
            .path_arg(&self.output_path)
    }
}

/// Output location of a track's mix.
pub fn mix_output_path(output_dir: &Path, track_number: u32) -> PathBuf {
    output_dir.join(format!("{track_number}_mix.{MIX_OUTPUT_EXTENSION}"))
}

/// Filter graph mixing the first `group_size` inputs into an intro bus and
/// the next `group_size` into a loop bus, then appending `loops` repeats of
/// the loop bus to the intro.
pub fn mix_filter_graph(group_size: usize, loops: u32) -> String {
    let labels = |range: std::ops::Range<usize>| -> String {
        range.map(|index| format!("[{index}]")).collect()
    };
    let intro_inputs = labels(0..group_size);
    let loop_inputs = labels(group_size..group_size * 2);

    format!(
        "{intro_inputs}amix=inputs={group_size}[intro];\
         {loop_inputs}amix=inputs={group_size}[loop];\
         [loop]aloop=loop={loops}:size={LOOP_SIZE_CEILING}[loops];\
         [intro][loops]concat=v=0:a=1"
    )
}

/// Builds the mixer invocation for `track`, or `None` when the strategy
/// needs no external work.
pub fn build_mix_command(
    track: &TrackGroup,
    strategy: MixStrategy,
    config: &MixConfig,
) -> Result<Option<MixCommand>> {
    match strategy {
        MixStrategy::TwelveChannelMix => build_twelve_channel_mix(track, config).map(Some),
        MixStrategy::StereoPassthrough | MixStrategy::Unsupported => Ok(None),
    }
}

fn build_twelve_channel_mix(track: &TrackGroup, config: &MixConfig) -> Result<MixCommand> {
    let track_number = track.track_number();
    // Only groups produced by `TrackRegistry::into_tracks` are already in
    // canonical order; a group built with `add_stem` keeps insertion order.
    let mut stems: Vec<&StemDescriptor> = mixable_stems(track.stems()).collect();
    stems.sort_by(|a, b| stem_order(a, b));

    let intro = section(track_number, &stems, StemType::Intro)?;
    let looped = section(track_number, &stems, StemType::Loop)?;

    let intro_channels: Vec<u32> = intro.iter().map(|stem| stem.channel_number).collect();
    let loop_channels: Vec<u32> = looped.iter().map(|stem| stem.channel_number).collect();
    if intro_channels != loop_channels {
        return Err(StemMixError::build(
            track_number,
            format!(
                "intro channels {intro_channels:?} do not match loop channels {loop_channels:?}"
            ),
        ));
    }

    Ok(MixCommand {
        track_number,
        inputs: intro
            .iter()
            .chain(looped.iter())
            .map(|stem| stem.path.clone())
            .collect(),
        filter_graph: mix_filter_graph(MIX_GROUP_SIZE, config.loops),
        output_path: mix_output_path(&config.output_dir, track_number),
    })
}

fn section<'a>(
    track_number: u32,
    stems: &[&'a StemDescriptor],
    stem_type: StemType,
) -> Result<Vec<&'a StemDescriptor>> {
    let selected: Vec<&StemDescriptor> = stems
        .iter()
        .copied()
        .filter(|stem| stem.stem_type == stem_type)
        .collect();

    if selected.len() != MIX_GROUP_SIZE {
        return Err(StemMixError::build(
            track_number,
            format!(
                "expected {MIX_GROUP_SIZE} {stem_type} stems besides channel 0, found {}",
                selected.len()
            ),
        ));
    }
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TrackRegistry;

    const CHANNELS: [u32; 6] = [0, 2, 4, 6, 8, 10];

    fn twelve_channel_track(track_number: u32) -> TrackGroup {
        let mut track = TrackGroup::new(track_number);
        // Deliberately out of canonical order.
        for stem_type in ["loop", "intro"] {
            for channel in CHANNELS.iter().rev() {
                let path = format!("/in/{track_number}_{channel}_{stem_type}.wav");
                track.add_stem(StemDescriptor::from_path(path).unwrap());
            }
        }
        track
    }

    fn config() -> MixConfig {
        MixConfig {
            loops: 3,
            ..MixConfig::new("/in", "/out")
        }
    }

    #[test]
    fn twelve_channel_mix_skips_the_silent_pair() {
        let track = twelve_channel_track(1);
        let command = build_mix_command(&track, MixStrategy::TwelveChannelMix, &config())
            .unwrap()
            .unwrap();

        let expected: Vec<PathBuf> = ["intro", "loop"]
            .iter()
            .flat_map(|stem_type| {
                [2, 4, 6, 8, 10]
                    .iter()
                    .map(move |channel| PathBuf::from(format!("/in/1_{channel}_{stem_type}.wav")))
            })
            .collect();

        assert_eq!(command.inputs, expected);
        assert_eq!(command.output_path, PathBuf::from("/out/1_mix.flac"));
    }

    #[test]
    fn insertion_order_does_not_change_the_command() {
        let unsorted = twelve_channel_track(6);
        let mut registry = TrackRegistry::new();
        for stem in unsorted.stems() {
            registry.add_stem(stem.clone());
        }
        let canonical = registry.into_tracks().remove(0);

        let from_unsorted = build_mix_command(&unsorted, MixStrategy::TwelveChannelMix, &config());
        let from_canonical =
            build_mix_command(&canonical, MixStrategy::TwelveChannelMix, &config());
        assert_eq!(from_unsorted.unwrap(), from_canonical.unwrap());
    }

    #[test]
    fn one_shot_only_twelve_channel_track_is_a_build_error() {
        let mut track = TrackGroup::new(9);
        for channel in CHANNELS {
            let path = format!("9_{channel}_oneshot.wav");
            track.add_stem(StemDescriptor::from_path(path).unwrap());
        }
        assert_eq!(track.channel_count(), 12);
        assert_eq!(
            MixStrategy::for_channel_count(track.channel_count()),
            MixStrategy::TwelveChannelMix
        );

        let err = build_mix_command(&track, MixStrategy::TwelveChannelMix, &config()).unwrap_err();
        assert!(matches!(err, StemMixError::StrategyBuild { track: 9, .. }));
        assert!(format!("{err}").contains("intro"));
    }

    #[test]
    fn filter_graph_interpolates_the_loop_count() {
        assert_eq!(
            mix_filter_graph(MIX_GROUP_SIZE, 3),
            "[0][1][2][3][4]amix=inputs=5[intro];\
             [5][6][7][8][9]amix=inputs=5[loop];\
             [loop]aloop=loop=3:size=2e9[loops];\
             [intro][loops]concat=v=0:a=1"
        );
    }

    #[test]
    fn external_command_lists_inputs_then_filter_then_output() {
        let track = twelve_channel_track(8);
        let command = build_mix_command(&track, MixStrategy::TwelveChannelMix, &config())
            .unwrap()
            .unwrap()
            .to_external();

        assert_eq!(command.program, "ffmpeg");
        assert_eq!(command.args[0], "-y");
        assert_eq!(command.args.iter().filter(|arg| *arg == "-i").count(), 10);
        assert_eq!(command.args[1], "-i");
        assert_eq!(Path::new(&command.args[2]), Path::new("/in/8_2_intro.wav"));

        let filter_at = command
            .args
            .iter()
            .position(|arg| arg == "-filter_complex")
            .unwrap();
        assert_eq!(filter_at, 21);
        let graph = command.args[filter_at + 1].to_str().unwrap();
        assert!(graph.contains("aloop=loop=3"));
        assert_eq!(command.args.last().unwrap(), "/out/8_mix.flac");
    }

    #[test]
    fn missing_intro_stem_is_a_build_error() {
        let mut track = TrackGroup::new(2);
        for channel in CHANNELS {
            track.add_stem(StemDescriptor::from_path(format!("2_{channel}_loop.wav")).unwrap());
        }
        for channel in [2, 4, 6, 8] {
            track.add_stem(StemDescriptor::from_path(format!("2_{channel}_intro.wav")).unwrap());
        }
        assert_eq!(track.channel_count(), 12);

        let err = build_mix_command(&track, MixStrategy::TwelveChannelMix, &config()).unwrap_err();
        assert!(matches!(err, StemMixError::StrategyBuild { track: 2, .. }));
    }

    #[test]
    fn mismatched_sections_are_a_build_error() {
        let mut track = TrackGroup::new(5);
        for channel in CHANNELS {
            track.add_stem(StemDescriptor::from_path(format!("5_{channel}_loop.wav")).unwrap());
        }
        for channel in [2, 4, 6, 8, 12] {
            track.add_stem(StemDescriptor::from_path(format!("5_{channel}_intro.wav")).unwrap());
        }

        let err = build_mix_command(&track, MixStrategy::TwelveChannelMix, &config()).unwrap_err();
        assert!(format!("{err}").contains("do not match"));
    }

    #[test]
    fn other_strategies_build_nothing() {
        let mut track = TrackGroup::new(4);
        track.add_stem(StemDescriptor::from_path("4_0_loop.wav").unwrap());

        for strategy in [MixStrategy::StereoPassthrough, MixStrategy::Unsupported] {
            assert!(build_mix_command(&track, strategy, &config()).unwrap().is_none());
        }
    }
}
