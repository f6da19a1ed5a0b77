/// What a single track event means to the reducer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventKind {
    NoteOn { pitch: u8, velocity: u8 },
    NoteOff { pitch: u8, velocity: u8 },
    /// Tempo in beats per minute.
    TempoChange { bpm: f64 },
    Other,
}

/// A track event with its tick offset relative to the previous event in the track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedEvent {
    pub delta: u32,
    pub kind: EventKind,
}

impl TimedEvent {
    pub fn new(delta: u32, kind: EventKind) -> Self {
        TimedEvent { delta, kind }
    }

    pub fn note_on(delta: u32, pitch: u8, velocity: u8) -> Self {
        TimedEvent::new(delta, EventKind::NoteOn { pitch, velocity })
    }

    pub fn note_off(delta: u32, pitch: u8) -> Self {
        TimedEvent::new(delta, EventKind::NoteOff { pitch, velocity: 0 })
    }

    pub fn tempo(delta: u32, bpm: f64) -> Self {
        TimedEvent::new(delta, EventKind::TempoChange { bpm })
    }
}

/// The decoded event stream of a whole file.
#[derive(Debug, Clone, PartialEq)]
pub struct MidiSource {
    /// Ticks per quarter note.
    pub resolution: u16,
    pub tracks: Vec<Vec<TimedEvent>>,
}

impl MidiSource {
    pub fn new(resolution: u16, tracks: Vec<Vec<TimedEvent>>) -> Self {
        MidiSource { resolution, tracks }
    }
}
