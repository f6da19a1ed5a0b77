use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::events::{MidiSource, TimedEvent};
use super::score::{Score, ScoreOptions};

/// At 480 ticks per beat and 120 bpm one tick lasts 1/960 s.
pub(crate) const TICKS_PER_SECOND: f64 = 960.0;

pub(crate) fn ticks(seconds: f64) -> u64 {
    (seconds * TICKS_PER_SECOND).round() as u64
}

/// Build a score from `(track, pitch, start_seconds, end_seconds)` notes.
///
/// Same-pitch notes of a track must nest or be disjoint, since Note-Offs pair last in,
/// first out.
pub(crate) fn score_from_seconds(notes: &[(usize, u8, f64, f64)]) -> Score {
    let n_tracks = notes.iter().map(|&(track, ..)| track + 1).max().unwrap_or(0);

    let tracks = (0..n_tracks)
        .map(|track| {
            let mut absolute: Vec<(u64, bool, u8)> = notes
                .iter()
                .filter(|&&(t, ..)| t == track)
                .flat_map(|&(_, pitch, start, end)| [(ticks(start), true, pitch), (ticks(end), false, pitch)])
                .collect();
            absolute.sort_by_key(|&(tick, is_on, _)| (tick, is_on));

            let mut previous = 0;
            absolute
                .into_iter()
                .map(|(tick, is_on, pitch)| {
                    let delta = (tick - previous) as u32;
                    previous = tick;
                    if is_on {
                        TimedEvent::note_on(delta, pitch, 100)
                    } else {
                        TimedEvent::note_off(delta, pitch)
                    }
                })
                .collect()
        })
        .collect();

    let source = MidiSource::new(480, tracks);
    Score::from_source(&source, &ScoreOptions::default()).unwrap()
}

/// Deterministic pseudo-random notes spread over `length` seconds.
pub(crate) fn scattered_notes(count: usize, length: f64, seed: u64) -> Vec<(usize, u8, f64, f64)> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    // One note per (track, pitch, slot) keeps same-pitch notes disjoint.
    let slots = (count as f64 / 24.0).ceil().max(1.0);
    let slot_length = length / slots;
    (0..count)
        .map(|i| {
            let track = i % 3;
            let pitch = 48 + (i / 3 % 8) as u8;
            let slot = (i / 24) as f64;
            let start = slot * slot_length + rng.gen::<f64>() * slot_length * 0.5;
            let end = start + 0.01 + rng.gen::<f64>() * slot_length * 0.45;
            (track, pitch, start, end)
        })
        .collect()
}
