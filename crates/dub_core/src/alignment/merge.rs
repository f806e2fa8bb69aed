//! Merging of consecutive same-speaker segments.

use crate::models::Segment;

/// Merge neighbours with the same speaker whose gap is `<= gap_secs`.
///
/// Input must be sorted by start. Text is joined with one space, the end
/// becomes the later of the two, and indices are renumbered. Running the
/// merge on its own output changes nothing.
pub fn merge_segments(segments: Vec<Segment>, gap_secs: f64) -> Vec<Segment> {
    let mut merged: Vec<Segment> = Vec::with_capacity(segments.len());

    for segment in segments {
        match merged.last_mut() {
            Some(prev)
                if prev.speaker_id() == segment.speaker_id()
                    && segment.start() - prev.end() <= gap_secs =>
            {
                prev.absorb(&segment);
            }
            _ => merged.push(segment),
        }
    }

    for (index, segment) in merged.iter_mut().enumerate() {
        segment.set_index(index);
    }

    merged
}
