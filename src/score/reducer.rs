use log::{debug, warn};

use crate::constants::{MAX_PITCH, N_PITCHES};

use super::events::{EventKind, TimedEvent};
use super::note::Note;

/// Everything the reducer learned from one track's event stream.
#[derive(Debug, Clone, PartialEq)]
pub struct ReducedTrack {
    /// One start-ordered note sequence per MIDI pitch.
    pub pitches: Vec<Vec<Note>>,
    /// The last tempo event of the track, if any.
    pub last_tempo_bpm: Option<f64>,
    /// Every tempo change as `(absolute tick, bpm)`.
    pub tempo_changes: Vec<(u64, f64)>,
    /// Absolute tick of the final event.
    pub end_tick: u64,
}

impl ReducedTrack {
    pub fn note_count(&self) -> usize {
        self.pitches.iter().map(Vec::len).sum()
    }

    pub fn unfinished_count(&self) -> usize {
        self.pitches.iter().flatten().filter(|note| !note.is_finished()).count()
    }
}

/// Pair Note-On and Note-Off events of one track into notes, pitch by pitch.
///
/// A Note-On with velocity 0 is a Note-Off. A Note-Off closes the most recently opened
/// unfinished note of its pitch; a Note-Off with nothing open is ignored.
///
/// # Arguments
///
/// * `track` - Index of the track, recorded on every note.
/// * `events` - The track's events in stream order.
///
/// # Returns
///
/// * The per-pitch notes together with tempo information and the track length in ticks.
pub fn reduce_track(track: usize, events: &[TimedEvent]) -> ReducedTrack {
    let mut pitches: Vec<Vec<Note>> = vec![Vec::new(); N_PITCHES];
    let mut last_tempo_bpm = None;
    let mut tempo_changes = vec![];
    let mut total_ticks: u64 = 0;

    for event in events {
        total_ticks = total_ticks.saturating_add(u64::from(event.delta));

        match event.kind {
            EventKind::NoteOn { pitch, velocity } | EventKind::NoteOff { pitch, velocity }
                if pitch > MAX_PITCH =>
            {
                warn!("track {track}: skipping event for out of range pitch {pitch} (velocity {velocity})");
            }
            EventKind::NoteOn { pitch, velocity } if velocity > 0 => {
                pitches[usize::from(pitch)].push(Note::open(pitch, velocity, track, total_ticks));
            }
            EventKind::NoteOn { pitch, .. } | EventKind::NoteOff { pitch, .. } => {
                close_latest(&mut pitches[usize::from(pitch)], total_ticks);
            }
            EventKind::TempoChange { bpm } if bpm.is_finite() && bpm > 0.0 => {
                last_tempo_bpm = Some(bpm);
                tempo_changes.push((total_ticks, bpm));
            }
            EventKind::TempoChange { bpm } => {
                warn!("track {track}: ignoring tempo change to {bpm} bpm at tick {total_ticks}");
            }
            EventKind::Other => {}
        }
    }

    let reduced = ReducedTrack {
        pitches,
        last_tempo_bpm,
        tempo_changes,
        end_tick: total_ticks,
    };

    debug!(
        "track {track}: {} notes ({} unfinished), {} tempo changes, {} ticks",
        reduced.note_count(),
        reduced.unfinished_count(),
        reduced.tempo_changes.len(),
        reduced.end_tick
    );

    reduced
}

/// Close the most recently opened note that is still sounding.
fn close_latest(notes: &mut [Note], end_ticks: u64) {
    if let Some(note) = notes.iter_mut().rev().find(|note| !note.is_finished()) {
        note.close(end_ticks);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notes(reduced: &ReducedTrack, pitch: usize) -> Vec<(u64, u64, bool)> {
        reduced.pitches[pitch]
            .iter()
            .map(|n| (n.start_ticks(), n.end_ticks(), n.is_finished()))
            .collect()
    }

    #[test]
    fn single_note_is_paired() {
        let events = vec![TimedEvent::note_on(0, 60, 100), TimedEvent::note_off(480, 60)];
        let reduced = reduce_track(0, &events);

        assert_eq!(notes(&reduced, 60), vec![(0, 480, true)]);
        assert_eq!(reduced.pitches[60][0].velocity(), 100);
        assert_eq!(reduced.end_tick, 480);
        assert_eq!(reduced.note_count(), 1);
    }

    #[test]
    fn ticks_accumulate_before_each_event() {
        let events = vec![
            TimedEvent::new(10, EventKind::Other),
            TimedEvent::note_on(5, 40, 1),
            TimedEvent::new(7, EventKind::Other),
            TimedEvent::note_off(3, 40),
        ];
        let reduced = reduce_track(2, &events);

        assert_eq!(notes(&reduced, 40), vec![(15, 25, true)]);
        assert_eq!(reduced.pitches[40][0].track(), 2);
        assert_eq!(reduced.end_tick, 25);
    }

    #[test]
    fn overlapping_notes_close_last_opened_first() {
        let events = vec![
            TimedEvent::note_on(0, 64, 80),
            TimedEvent::note_on(100, 64, 90),
            TimedEvent::note_off(50, 64),
            TimedEvent::note_off(50, 64),
        ];
        let reduced = reduce_track(0, &events);

        assert_eq!(notes(&reduced, 64), vec![(0, 200, true), (100, 150, true)]);
    }

    #[test]
    fn velocity_zero_note_on_is_note_off() {
        let events = vec![TimedEvent::note_on(0, 72, 64), TimedEvent::note_on(240, 72, 0)];
        let reduced = reduce_track(0, &events);

        assert_eq!(notes(&reduced, 72), vec![(0, 240, true)]);
    }

    #[test]
    fn lone_note_off_changes_nothing() {
        let events = vec![
            TimedEvent::note_on(0, 50, 64),
            TimedEvent::note_off(10, 50),
            TimedEvent::note_off(10, 50),
            TimedEvent::note_off(10, 51),
        ];
        let reduced = reduce_track(0, &events);

        assert_eq!(notes(&reduced, 50), vec![(0, 10, true)]);
        assert!(reduced.pitches[51].is_empty());
    }

    #[test]
    fn note_off_reaches_past_closed_notes() {
        // A held note outlives two short retriggers of the same pitch.
        let events = vec![
            TimedEvent::note_on(0, 30, 64),
            TimedEvent::note_on(10, 30, 64),
            TimedEvent::note_off(10, 30),
            TimedEvent::note_on(10, 30, 64),
            TimedEvent::note_off(10, 30),
            TimedEvent::note_off(10, 30),
        ];
        let reduced = reduce_track(0, &events);

        assert_eq!(notes(&reduced, 30), vec![(0, 50, true), (10, 20, true), (30, 40, true)]);
    }

    #[test]
    fn unterminated_notes_stay_open() {
        let events = vec![TimedEvent::note_on(0, 60, 64), TimedEvent::new(960, EventKind::Other)];
        let reduced = reduce_track(0, &events);

        assert_eq!(reduced.unfinished_count(), 1);
        assert_eq!(reduced.end_tick, 960);
    }

    #[test]
    fn last_tempo_is_reported() {
        let events = vec![
            TimedEvent::tempo(0, 100.0),
            TimedEvent::note_on(0, 60, 64),
            TimedEvent::tempo(480, 140.0),
            TimedEvent::tempo(0, -3.0),
            TimedEvent::note_off(480, 60),
        ];
        let reduced = reduce_track(0, &events);

        assert_eq!(reduced.last_tempo_bpm, Some(140.0));
        assert_eq!(reduced.tempo_changes, vec![(0, 100.0), (480, 140.0)]);
    }

    #[test]
    fn out_of_range_pitch_is_skipped() {
        let events = vec![TimedEvent::note_on(0, 200, 64), TimedEvent::note_off(1, 200)];
        let reduced = reduce_track(0, &events);

        assert_eq!(reduced.note_count(), 0);
        assert_eq!(reduced.pitches.len(), N_PITCHES);
    }

    #[test]
    fn notes_are_start_ordered_within_a_pitch() {
        let events: Vec<TimedEvent> = (0..50)
            .flat_map(|i| {
                [
                    TimedEvent::note_on(if i % 3 == 0 { 0 } else { 7 }, 60, 64),
                    TimedEvent::note_on(i % 4, 60, 64),
                    TimedEvent::note_off(i % 5, 60),
                ]
            })
            .collect();
        let reduced = reduce_track(0, &events);

        let starts: Vec<u64> = reduced.pitches[60].iter().map(Note::start_ticks).collect();
        assert!(starts.windows(2).all(|w| w[0] <= w[1]));
    }
}
