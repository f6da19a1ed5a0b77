use crate::error::{Error, Result};
use crate::score::note::Note;
use crate::score::score::Score;

/// How far around the current time notes stay on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    /// Seconds before the current time.
    pub before: f64,
    /// Seconds after the current time.
    pub after: f64,
}

impl Window {
    pub fn new(before: f64, after: f64) -> Self {
        Window { before, after }
    }

    /// Earliest visible time; notes ending before it have scrolled out.
    pub fn left(&self, time: f64) -> f64 {
        time - self.before
    }

    /// First time past the visible span.
    pub fn right(&self, time: f64) -> f64 {
        time + self.after
    }

    pub fn length(&self) -> f64 {
        self.before + self.after
    }

    /// Whether `note` overlaps the window around `time`.
    pub fn contains(&self, note: &Note, time: f64) -> bool {
        note.end_time() >= self.left(time) && note.start_time() < self.right(time)
    }
}

/// A note that overlaps the window, with whether it sounds at the query time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleNote<'a> {
    pub note: &'a Note,
    pub active: bool,
}

impl<'a> VisibleNote<'a> {
    fn at(note: &'a Note, time: f64) -> Self {
        VisibleNote {
            note,
            active: note.is_active_at(time),
        }
    }
}

/// Sequential visibility scan with one cursor per (track, pitch).
///
/// Query times must strictly increase. Each cursor only moves forward, past notes that
/// ended before the window, so the whole scan touches every note a bounded number of times.
#[derive(Debug, Clone)]
pub struct WindowScanner<'a> {
    score: &'a Score,
    window: Window,
    cursors: Vec<Vec<usize>>,
    last_time: Option<f64>,
    advances: usize,
}

impl<'a> WindowScanner<'a> {
    pub fn new(score: &'a Score, window: Window) -> Self {
        let cursors = score
            .tracks()
            .iter()
            .map(|track| vec![0; track.pitches().len()])
            .collect();

        WindowScanner {
            score,
            window,
            cursors,
            last_time: None,
            advances: 0,
        }
    }

    pub fn window(&self) -> Window {
        self.window
    }

    /// Total number of notes the cursors have moved past so far.
    pub fn cursor_advances(&self) -> usize {
        self.advances
    }

    /// Notes overlapping the window around `time`, ordered by track, pitch and start.
    pub fn visible_at(&mut self, time: f64) -> Result<Vec<VisibleNote<'a>>> {
        let previous = self.last_time.unwrap_or(f64::NEG_INFINITY);
        if time.is_nan() || time <= previous {
            return Err(Error::NonMonotonicQuery {
                previous,
                requested: time,
            });
        }
        self.last_time = Some(time);

        let score = self.score;
        let left = self.window.left(time);
        let right = self.window.right(time);
        let mut visible = vec![];

        for (track, cursors) in score.tracks().iter().zip(self.cursors.iter_mut()) {
            for (notes, cursor) in track.pitches().iter().zip(cursors.iter_mut()) {
                while *cursor < notes.len() && notes[*cursor].end_time() < left {
                    *cursor += 1;
                    self.advances += 1;
                }

                for note in &notes[*cursor..] {
                    if note.start_time() >= right {
                        break;
                    }
                    if note.end_time() >= left {
                        visible.push(VisibleNote::at(note, time));
                    }
                }
            }
        }

        Ok(visible)
    }
}

/// Stateless visibility lookup that answers any query time independently.
///
/// Keeps, per pitch, the running maximum of note end times; its first entry that reaches
/// the window is where the sequential cursor would stand, so both scans agree.
#[derive(Debug, Clone)]
pub struct FrameIndex<'a> {
    score: &'a Score,
    window: Window,
    reach: Vec<Vec<Vec<f64>>>,
}

impl<'a> FrameIndex<'a> {
    pub fn new(score: &'a Score, window: Window) -> Self {
        let reach = score
            .tracks()
            .iter()
            .map(|track| {
                track
                    .pitches()
                    .iter()
                    .map(|notes| {
                        notes
                            .iter()
                            .scan(f64::NEG_INFINITY, |max_end, note| {
                                *max_end = max_end.max(note.end_time());
                                Some(*max_end)
                            })
                            .collect()
                    })
                    .collect()
            })
            .collect();

        FrameIndex { score, window, reach }
    }

    pub fn window(&self) -> Window {
        self.window
    }

    /// Notes overlapping the window around `time`, ordered by track, pitch and start.
    pub fn visible_at(&self, time: f64) -> Vec<VisibleNote<'a>> {
        let score = self.score;
        let left = self.window.left(time);
        let right = self.window.right(time);
        let mut visible = vec![];

        for (track, reach) in score.tracks().iter().zip(&self.reach) {
            for (notes, reach) in track.pitches().iter().zip(reach) {
                let first = reach.partition_point(|&max_end| max_end < left);
                let last = notes.partition_point(|note| note.start_time() < right);
                if first >= last {
                    continue;
                }

                visible.extend(
                    notes[first..last]
                        .iter()
                        .filter(|note| note.end_time() >= left)
                        .map(|note| VisibleNote::at(note, time)),
                );
            }
        }

        visible
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::score::fixtures::{scattered_notes, score_from_seconds};

    fn keys(visible: &[VisibleNote]) -> Vec<(usize, u8, u64)> {
        visible
            .iter()
            .map(|v| (v.note.track(), v.note.pitch(), v.note.start_ticks()))
            .collect()
    }

    #[test]
    fn window_boundaries_are_closed_left_open_right() {
        let score = score_from_seconds(&[(0, 60, 10.0, 10.5)]);
        let index = FrameIndex::new(&score, Window::new(2.0, 14.0));

        // Enters once its start is strictly before time + 14.
        assert!(index.visible_at(-4.0).is_empty());
        assert_eq!(index.visible_at(-3.5).len(), 1);
        assert_eq!(index.visible_at(9.0).len(), 1);
        // Stays while its end is at or after time - 2.
        assert_eq!(index.visible_at(12.5).len(), 1);
        assert!(index.visible_at(12.75).is_empty());
    }

    #[test]
    fn short_note_stays_for_the_lookback() {
        // Ends at tick 970, just past 10.1 s.
        let score = score_from_seconds(&[(0, 60, 10.0, 10.1)]);
        let index = FrameIndex::new(&score, Window::new(2.0, 14.0));
        let mut scanner = WindowScanner::new(&score, Window::new(2.0, 14.0));

        for (time, expected) in [(-4.0, 0), (-3.9, 1), (9.0, 1), (12.1, 1), (12.2, 0), (22.0, 0)] {
            assert_eq!(index.visible_at(time).len(), expected, "at {time}");
            assert_eq!(scanner.visible_at(time).unwrap().len(), expected, "at {time}");
        }
    }

    #[test]
    fn scanner_matches_boundaries() {
        let score = score_from_seconds(&[(0, 60, 10.0, 10.5)]);
        let mut scanner = WindowScanner::new(&score, Window::new(2.0, 14.0));

        let counts: Vec<usize> = [-4.0, -3.5, 9.0, 12.5, 12.75]
            .iter()
            .map(|&t| scanner.visible_at(t).unwrap().len())
            .collect();
        assert_eq!(counts, vec![0, 1, 1, 1, 0]);
        assert_eq!(scanner.cursor_advances(), 1);
    }

    #[test]
    fn active_flag_follows_note_interval() {
        let score = score_from_seconds(&[(0, 60, 1.0, 2.0), (0, 62, 3.0, 4.0)]);
        let mut scanner = WindowScanner::new(&score, Window::new(2.0, 14.0));

        let visible = scanner.visible_at(1.5).unwrap();
        assert_eq!(visible.len(), 2);
        assert!(visible[0].active);
        assert!(!visible[1].active);

        let visible = scanner.visible_at(2.0).unwrap();
        assert!(visible.iter().all(|v| !v.active));
    }

    #[test]
    fn time_must_strictly_increase() {
        let score = score_from_seconds(&[(0, 60, 1.0, 2.0)]);
        let mut scanner = WindowScanner::new(&score, Window::new(1.0, 1.0));

        scanner.visible_at(1.0).unwrap();
        assert!(matches!(scanner.visible_at(1.0), Err(Error::NonMonotonicQuery { .. })));
        assert!(matches!(scanner.visible_at(0.5), Err(Error::NonMonotonicQuery { .. })));
        assert!(matches!(scanner.visible_at(f64::NAN), Err(Error::NonMonotonicQuery { .. })));
        assert!(scanner.visible_at(1.5).is_ok());
    }

    #[test]
    fn short_note_behind_a_long_one_leaves_on_time() {
        // The short note sorts after the long one, so the cursor cannot pass it yet, but it
        // must still drop out of the window.
        let score = score_from_seconds(&[(0, 60, 0.0, 30.0), (0, 60, 1.0, 2.0)]);
        let mut scanner = WindowScanner::new(&score, Window::new(1.0, 5.0));

        assert_eq!(scanner.visible_at(2.5).unwrap().len(), 2);
        assert_eq!(scanner.visible_at(3.5).unwrap().len(), 1);
        assert_eq!(scanner.cursor_advances(), 0);
        assert!(scanner.visible_at(40.0).unwrap().is_empty());
        assert_eq!(scanner.cursor_advances(), 2);
    }

    #[test]
    fn stateful_and_stateless_scans_agree() {
        let score = score_from_seconds(&scattered_notes(480, 60.0, 7));
        let window = Window::new(2.0, 14.0);
        let mut scanner = WindowScanner::new(&score, window);
        let index = FrameIndex::new(&score, window);

        for k in 0..(70 * 30) {
            let time = -5.0 + f64::from(k) / 30.0;
            let sequential = scanner.visible_at(time).unwrap();
            let stateless = index.visible_at(time);
            assert_eq!(keys(&sequential), keys(&stateless), "at {time}s");
            assert_eq!(
                sequential.iter().map(|v| v.active).collect::<Vec<_>>(),
                stateless.iter().map(|v| v.active).collect::<Vec<_>>()
            );
        }
    }

    #[test]
    fn results_match_brute_force() {
        let score = score_from_seconds(&scattered_notes(200, 30.0, 3));
        let window = Window::new(1.5, 4.0);
        let mut scanner = WindowScanner::new(&score, window);

        for k in 0..400 {
            let time = -2.0 + f64::from(k) * 0.1;
            let found: HashSet<_> = keys(&scanner.visible_at(time).unwrap()).into_iter().collect();
            let expected: HashSet<_> = score
                .notes()
                .filter(|note| window.contains(note, time))
                .map(|n| (n.track(), n.pitch(), n.start_ticks()))
                .collect();
            assert_eq!(found, expected, "at {time}s");
        }
    }

    #[test]
    fn excluded_notes_never_return() {
        let score = score_from_seconds(&scattered_notes(300, 40.0, 11));
        let mut scanner = WindowScanner::new(&score, Window::new(2.0, 6.0));

        let mut seen = HashSet::new();
        let mut gone = HashSet::new();
        let mut previous: HashSet<(usize, u8, u64)> = HashSet::new();
        for k in 0..(50 * 24) {
            let current: HashSet<_> = keys(&scanner.visible_at(f64::from(k) / 24.0).unwrap()).into_iter().collect();
            for key in &current {
                assert!(!gone.contains(key), "{key:?} came back at frame {k}");
                seen.insert(*key);
            }
            gone.extend(previous.difference(&current).copied());
            previous = current;
        }
        assert_eq!(seen.len(), score.note_count());
    }

    #[test]
    fn cursor_advances_are_bounded_by_note_count() {
        let score = score_from_seconds(&scattered_notes(240, 20.0, 5));
        let mut scanner = WindowScanner::new(&score, Window::new(0.5, 3.0));

        for k in 0..2000 {
            scanner.visible_at(f64::from(k) * 0.02).unwrap();
            assert!(scanner.cursor_advances() <= score.note_count());
        }
        assert_eq!(scanner.cursor_advances(), score.note_count());
    }

    #[test]
    fn empty_score_has_nothing_visible() {
        let score = score_from_seconds(&[]);
        let mut scanner = WindowScanner::new(&score, Window::new(2.0, 14.0));
        let index = FrameIndex::new(&score, Window::new(2.0, 14.0));

        assert!(scanner.visible_at(0.0).unwrap().is_empty());
        assert!(index.visible_at(0.0).is_empty());
    }
}
