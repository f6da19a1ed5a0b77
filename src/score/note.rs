use super::tempo::TimeBase;

/// One sounded pitch interval.
///
/// Pitch, velocity, track and start tick are fixed at creation. The end tick is written
/// once by the reducer and the second-domain times once by the tempo conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pitch: u8,
    velocity: u8,
    track: usize,
    start_ticks: u64,
    end_ticks: u64,
    start_time: f64,
    end_time: f64,
    finished: bool,
}

impl Note {
    pub(crate) fn open(pitch: u8, velocity: u8, track: usize, start_ticks: u64) -> Self {
        Note {
            pitch,
            velocity,
            track,
            start_ticks,
            end_ticks: start_ticks,
            start_time: 0.0,
            end_time: 0.0,
            finished: false,
        }
    }

    pub fn pitch(&self) -> u8 {
        self.pitch
    }

    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    pub fn track(&self) -> usize {
        self.track
    }

    pub fn start_ticks(&self) -> u64 {
        self.start_ticks
    }

    pub fn end_ticks(&self) -> u64 {
        self.end_ticks
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn end_time(&self) -> f64 {
        self.end_time
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Whether a matching Note-Off has closed this note.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Closed-open test against `[start_time, end_time)`.
    pub fn is_active_at(&self, time: f64) -> bool {
        self.start_time <= time && time < self.end_time
    }

    pub(crate) fn close(&mut self, end_ticks: u64) {
        self.end_ticks = end_ticks.max(self.start_ticks);
        self.finished = true;
    }

    pub(crate) fn assign_times(&mut self, time_base: &TimeBase) {
        self.start_time = time_base.seconds(self.start_ticks);
        self.end_time = time_base.seconds(self.end_ticks).max(self.start_time);
    }

    #[cfg(test)]
    pub(crate) fn timed(pitch: u8, track: usize, start_time: f64, end_time: f64) -> Self {
        Note {
            start_time,
            end_time,
            finished: true,
            ..Note::open(pitch, 100, track, 0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_records_end_and_finishes() {
        let mut note = Note::open(60, 90, 0, 480);
        assert!(!note.is_finished());

        note.close(960);
        assert!(note.is_finished());
        assert_eq!(note.start_ticks(), 480);
        assert_eq!(note.end_ticks(), 960);
        assert_eq!(note.velocity(), 90);
    }

    #[test]
    fn active_interval_is_closed_open() {
        let note = Note::timed(60, 0, 1.0, 2.0);
        assert!(!note.is_active_at(0.999));
        assert!(note.is_active_at(1.0));
        assert!(note.is_active_at(1.5));
        assert!(!note.is_active_at(2.0));
    }
}
