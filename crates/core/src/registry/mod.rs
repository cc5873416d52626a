//! Collation of stems into per-track groups.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{ordering, StemDescriptor, StemType};

/// Key for the per-track trait lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StemTrait {
    pub channel_number: u32,
    pub stem_type: StemType,
}

/// Every stem sharing one track number.
#[derive(Debug, Clone)]
pub struct TrackGroup {
    track_number: u32,
    all_stems: Vec<StemDescriptor>,
    stems_by_type: BTreeMap<StemType, Vec<StemDescriptor>>,
    stems_by_trait: HashMap<StemTrait, StemDescriptor>,
}

impl TrackGroup {
    pub fn new(track_number: u32) -> Self {
        Self {
            track_number,
            all_stems: Vec::new(),
            stems_by_type: BTreeMap::new(),
            stems_by_trait: HashMap::new(),
        }
    }

    pub fn track_number(&self) -> u32 {
        self.track_number
    }

    /// Adds a stem. A second stem with the same channel and type replaces
    /// the first in the trait lookup; both stay in the other views.
    pub fn add_stem(&mut self, stem: StemDescriptor) {
        let key = StemTrait {
            channel_number: stem.channel_number,
            stem_type: stem.stem_type.clone(),
        };
        if let Some(previous) = self.stems_by_trait.insert(key, stem.clone()) {
            tracing::warn!(
                track = self.track_number,
                replaced = %previous,
                by = %stem,
                "duplicate stem for channel and type"
            );
        }

        self.stems_by_type
            .entry(stem.stem_type.clone())
            .or_default()
            .push(stem.clone());
        self.all_stems.push(stem);
    }

    /// Output channel count, assuming every stem is a stereo pair.
    ///
    /// Counted from the loop stems when there are any, otherwise from the
    /// oneshot stems. Intro stems never contribute.
    pub fn channel_count(&self) -> usize {
        [StemType::Loop, StemType::OneShot]
            .iter()
            .map(|stem_type| self.distinct_channels(stem_type))
            .find(|&channels| channels > 0)
            .unwrap_or(0)
            * 2
    }

    fn distinct_channels(&self, stem_type: &StemType) -> usize {
        self.stems_of_type(stem_type)
            .iter()
            .map(|stem| stem.channel_number)
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Stems in the order they were added, or canonical order once
    /// [`TrackGroup::sorted_stems`] has been called.
    pub fn stems(&self) -> &[StemDescriptor] {
        &self.all_stems
    }

    /// Sorts the stored stems into canonical order and returns them.
    pub fn sorted_stems(&mut self) -> &[StemDescriptor] {
        ordering::sort_stems(&mut self.all_stems);
        &self.all_stems
    }

    pub fn stems_of_type(&self, stem_type: &StemType) -> &[StemDescriptor] {
        self.stems_by_type
            .get(stem_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn stems_by_type(&self) -> &BTreeMap<StemType, Vec<StemDescriptor>> {
        &self.stems_by_type
    }

    pub fn stem(&self, channel_number: u32, stem_type: StemType) -> Option<&StemDescriptor> {
        self.stems_by_trait.get(&StemTrait {
            channel_number,
            stem_type,
        })
    }

    pub fn len(&self) -> usize {
        self.all_stems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all_stems.is_empty()
    }
}

impl fmt::Display for TrackGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Track {}:", self.track_number)?;
        for (stem_type, stems) in &self.stems_by_type {
            write!(f, " {stem_type}[")?;
            for (index, stem) in stems.iter().enumerate() {
                if index > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "{stem}")?;
            }
            f.write_str("]")?;
        }
        Ok(())
    }
}

/// Groups stems by track number during a single collation pass.
#[derive(Debug, Default)]
pub struct TrackRegistry {
    tracks: BTreeMap<u32, TrackGroup>,
}

impl TrackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_stem(&mut self, stem: StemDescriptor) {
        self.tracks
            .entry(stem.track_number)
            .or_insert_with(|| TrackGroup::new(stem.track_number))
            .add_stem(stem);
    }

    pub fn track(&self, track_number: u32) -> Option<&TrackGroup> {
        self.tracks.get(&track_number)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Ends collation and hands out the groups in track order, with their
    /// stems already in canonical order.
    pub fn into_tracks(self) -> Vec<TrackGroup> {
        self.tracks
            .into_values()
            .map(|mut track| {
                track.sorted_stems();
                track
            })
            .collect()
    }
}

impl Extend<StemDescriptor> for TrackRegistry {
    fn extend<I: IntoIterator<Item = StemDescriptor>>(&mut self, iter: I) {
        for stem in iter {
            self.add_stem(stem);
        }
    }
}
