use std::cmp::Ordering;

use crate::StemDescriptor;

/// Channel pair 0 of a twelve channel track is silent and never mixed.
pub const SILENT_CHANNEL: u32 = 0;

/// Canonical stem order: track, then channel, then section
/// (intro before loop before oneshot).
pub fn stem_order(a: &StemDescriptor, b: &StemDescriptor) -> Ordering {
    a.track_number
        .cmp(&b.track_number)
        .then(a.channel_number.cmp(&b.channel_number))
        .then_with(|| a.stem_type.cmp(&b.stem_type))
}

/// Stable sort by [`stem_order`]. Stems with equal keys keep their
/// insertion order.
pub fn sort_stems(stems: &mut [StemDescriptor]) {
    stems.sort_by(stem_order);
}

/// Stems that may be fed to the mixer, in the order given.
pub fn mixable_stems<'a>(
    stems: impl IntoIterator<Item = &'a StemDescriptor>,
) -> impl Iterator<Item = &'a StemDescriptor> {
    stems
        .into_iter()
        .filter(|stem| stem.channel_number != SILENT_CHANNEL)
}
