use std::path::Path;

use log::debug;
use midly::num::u7;
use midly::Format;
use midly::Header;
use midly::MetaMessage;
use midly::MidiMessage;
use midly::Smf;
use midly::Timing;
use midly::TrackEvent;
use midly::TrackEventKind;

use crate::constants::MICROSECONDS_PER_MINUTE;
use crate::error::{Error, Result};

use super::events::{EventKind, MidiSource, TimedEvent};

/// A note in the tick domain, as written by [`write_smf`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickNote {
    pub pitch: u8,
    pub velocity: u8,
    pub start_ticks: u32,
    pub end_ticks: u32,
}

fn event_kind(kind: &TrackEventKind<'_>) -> EventKind {
    match *kind {
        TrackEventKind::Midi { message, .. } => match message {
            MidiMessage::NoteOn { key, vel } => EventKind::NoteOn {
                pitch: key.as_int(),
                velocity: vel.as_int(),
            },
            MidiMessage::NoteOff { key, vel } => EventKind::NoteOff {
                pitch: key.as_int(),
                velocity: vel.as_int(),
            },
            _ => EventKind::Other,
        },
        TrackEventKind::Meta(MetaMessage::Tempo(us_per_beat)) if us_per_beat.as_int() > 0 => EventKind::TempoChange {
            bpm: MICROSECONDS_PER_MINUTE / f64::from(us_per_beat.as_int()),
        },
        _ => EventKind::Other,
    }
}

/// Decode a Standard MIDI File held in memory.
///
/// # Arguments
///
/// * `data` - The raw bytes of the file.
///
/// # Returns
///
/// * The file's resolution and, per track, every event with its delta time.
pub fn parse_source(data: &[u8]) -> Result<MidiSource> {
    let smf = Smf::parse(data)?;

    let resolution = match smf.header.timing {
        Timing::Metrical(ticks_per_beat) => ticks_per_beat.as_int(),
        Timing::Timecode(..) => return Err(Error::UnsupportedTiming),
    };

    let tracks: Vec<Vec<TimedEvent>> = smf
        .tracks
        .iter()
        .map(|track| {
            track
                .iter()
                .map(|event| TimedEvent::new(event.delta.as_int(), event_kind(&event.kind)))
                .collect()
        })
        .collect();

    debug!(
        "parsed {:?} file: {} tracks, {} ticks per beat",
        smf.header.format,
        tracks.len(),
        resolution
    );

    Ok(MidiSource::new(resolution, tracks))
}

/// Read and decode a Standard MIDI File.
pub fn load_source<P: AsRef<Path>>(path: P) -> Result<MidiSource> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_source(&data)
}

#[derive(Debug, Clone)]
struct TrackEventAbsolute<'a> {
    tick: u32,
    kind: TrackEventKind<'a>,
}

fn ordered_track_events(notes: &[TickNote]) -> Vec<TrackEvent<'static>> {
    let mut track_events_absolute: Vec<TrackEventAbsolute> = vec![];
    for note in notes {
        let key = u7::from(note.pitch);
        track_events_absolute.push(TrackEventAbsolute {
            tick: note.start_ticks,
            kind: TrackEventKind::Midi {
                channel: 0.into(),
                message: MidiMessage::NoteOn {
                    key,
                    vel: u7::from(note.velocity.max(1)),
                },
            },
        });
        track_events_absolute.push(TrackEventAbsolute {
            tick: note.end_ticks.max(note.start_ticks),
            kind: TrackEventKind::Midi {
                channel: 0.into(),
                message: MidiMessage::NoteOff { key, vel: 0.into() },
            },
        });
    }

    // Note-Offs go first when events share a tick, so back-to-back notes don't overlap.
    track_events_absolute.sort_by_key(|event| {
        let is_note_on = matches!(
            event.kind,
            TrackEventKind::Midi {
                message: MidiMessage::NoteOn { .. },
                ..
            }
        );
        (event.tick, is_note_on)
    });

    let mut previous_tick = 0;
    track_events_absolute
        .into_iter()
        .map(|event| {
            let delta = event.tick - previous_tick;
            previous_tick = event.tick;
            TrackEvent {
                delta: delta.into(),
                kind: event.kind,
            }
        })
        .collect()
}

/// Generate single-track MIDI file data from tick-domain notes.
///
/// # Arguments
///
/// * `notes` - Notes in any order.
/// * `resolution` - Ticks per quarter note.
/// * `beats_per_minute` - Tempo written at the start of the track.
///
/// # Returns
///
/// * A vector of bytes representing the MIDI file.
pub fn write_smf(notes: &[TickNote], resolution: u16, beats_per_minute: f64) -> Result<Vec<u8>> {
    if resolution == 0 || beats_per_minute.is_nan() || beats_per_minute <= 0.0 {
        return Err(Error::Midi(format!(
            "cannot write {resolution} ticks per beat at {beats_per_minute} bpm"
        )));
    }

    let mut smf = Smf::new(Header {
        format: Format::SingleTrack,
        timing: Timing::Metrical(resolution.into()),
    });

    let us_per_beat = (MICROSECONDS_PER_MINUTE / beats_per_minute).round() as u32;
    let mut track = vec![TrackEvent {
        delta: 0.into(),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(us_per_beat.into())),
    }];
    track.extend(ordered_track_events(notes));
    track.push(TrackEvent {
        delta: 0.into(),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    smf.tracks.push(track);

    let mut buffer = Vec::new();
    smf.write_std(&mut buffer)?;

    Ok(buffer)
}
