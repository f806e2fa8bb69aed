//! Speaker assignment by interval overlap.

use crate::engines::SpeakerTurn;

/// Ties closer than this are treated as equal.
const OVERLAP_EPSILON: f64 = 1e-9;

/// Overlap of two intervals in seconds, never negative.
pub fn overlap(a_start: f64, a_end: f64, b_start: f64, b_end: f64) -> f64 {
    (a_end.min(b_end) - a_start.max(b_start)).max(0.0)
}

/// Speaker of the turn overlapping `[start, end)` the most.
///
/// `turns` must be ordered by start; on equal overlap the earlier turn
/// wins. Returns `None` when no turn overlaps.
pub fn assign_speaker<'a>(turns: &[&'a SpeakerTurn], start: f64, end: f64) -> Option<&'a str> {
    let mut best: Option<(&'a SpeakerTurn, f64)> = None;

    for turn in turns {
        let amount = overlap(start, end, turn.start, turn.end);
        if amount <= 0.0 {
            continue;
        }
        match best {
            Some((_, best_amount)) if amount <= best_amount + OVERLAP_EPSILON => {}
            _ => best = Some((turn, amount)),
        }
    }

    best.map(|(turn, _)| turn.speaker_id.as_str())
}

/// A single turn covering the whole track.
///
/// Stands in for diarization when the engine is unavailable or fails.
pub fn whole_track_turn(speaker_id: &str, duration_secs: f64) -> SpeakerTurn {
    SpeakerTurn::new(speaker_id, 0.0, duration_secs.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_is_clamped() {
        assert_eq!(overlap(0.0, 1.0, 2.0, 3.0), 0.0);
        assert_eq!(overlap(0.0, 3.0, 2.0, 5.0), 1.0);
        assert_eq!(overlap(1.0, 2.0, 0.0, 10.0), 1.0);
    }

    #[test]
    fn equal_overlap_keeps_first() {
        let a = SpeakerTurn::new("A", 0.0, 3.0);
        let b = SpeakerTurn::new("B", 3.0, 5.0);
        assert_eq!(assign_speaker(&[&a, &b], 2.0, 4.0), Some("A"));
    }

    #[test]
    fn nothing_overlapping_is_none() {
        let a = SpeakerTurn::new("A", 0.0, 1.0);
        assert_eq!(assign_speaker(&[&a], 1.0, 2.0), None);
        assert_eq!(assign_speaker(&[], 1.0, 2.0), None);
    }
}
