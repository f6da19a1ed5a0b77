use log::{info, warn};
use serde::Deserialize;

use crate::constants::DEFAULT_TEMPO_BPM;
use crate::error::{Error, Result};

use super::events::MidiSource;
use super::note::Note;
use super::reducer::{reduce_track, ReducedTrack};
use super::tempo::{TempoMap, TempoMode, TimeBase};

/// What to do with notes that never receive a Note-Off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnterminatedPolicy {
    /// End the note at the last tick of its track.
    #[default]
    CloseAtTrackEnd,
    /// Leave the note out of the score.
    Drop,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreOptions {
    pub tempo_mode: TempoMode,
    pub unterminated: UnterminatedPolicy,
}

/// The notes of one MIDI track, split into 128 start-ordered pitch sequences.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    index: usize,
    pitches: Vec<Vec<Note>>,
}

impl Track {
    pub fn index(&self) -> usize {
        self.index
    }

    /// The notes of `pitch` in start order. Empty for pitches above 127.
    pub fn pitch(&self, pitch: u8) -> &[Note] {
        self.pitches.get(usize::from(pitch)).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn pitches(&self) -> &[Vec<Note>] {
        &self.pitches
    }

    pub fn notes(&self) -> impl Iterator<Item = &Note> {
        self.pitches.iter().flatten()
    }

    pub fn note_count(&self) -> usize {
        self.pitches.iter().map(Vec::len).sum()
    }
}

/// All tracks of a file with their notes placed in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    tracks: Vec<Track>,
    resolution: u16,
    tempo_bpm: f64,
    time_base: TimeBase,
}

impl Score {
    /// Reduce every track of `source` into notes and convert them to seconds.
    ///
    /// # Arguments
    ///
    /// * `source` - Decoded event streams and the file's resolution.
    /// * `options` - Tempo handling and the policy for notes that never end.
    ///
    /// # Returns
    ///
    /// * A score whose notes are all finished, with `start_time <= end_time`.
    pub fn from_source(source: &MidiSource, options: &ScoreOptions) -> Result<Score> {
        if source.resolution == 0 {
            return Err(Error::Midi("resolution must be at least one tick per quarter note".to_string()));
        }

        let reduced: Vec<ReducedTrack> = source
            .tracks
            .iter()
            .enumerate()
            .map(|(index, events)| reduce_track(index, events))
            .collect();

        // Tracks are read in file order, so the last tempo of the last track that has one wins.
        let tempo_bpm = reduced
            .iter()
            .filter_map(|track| track.last_tempo_bpm)
            .last()
            .unwrap_or(DEFAULT_TEMPO_BPM);

        let time_base = match options.tempo_mode {
            TempoMode::LastWins => TimeBase::Uniform {
                resolution: source.resolution,
                tempo_bpm,
            },
            TempoMode::Piecewise => {
                let changes: Vec<(u64, f64)> = reduced
                    .iter()
                    .flat_map(|track| track.tempo_changes.iter().copied())
                    .collect();
                TimeBase::Piecewise(TempoMap::new(source.resolution, &changes))
            }
        };

        let tracks: Vec<Track> = reduced
            .into_iter()
            .enumerate()
            .map(|(index, track)| {
                let end_tick = track.end_tick;
                let mut pitches = track.pitches;
                for notes in pitches.iter_mut() {
                    settle_unterminated(notes, index, end_tick, options.unterminated);
                    for note in notes.iter_mut() {
                        note.assign_times(&time_base);
                    }
                }
                Track { index, pitches }
            })
            .collect();

        let score = Score {
            tracks,
            resolution: source.resolution,
            tempo_bpm,
            time_base,
        };

        info!(
            "score: {} tracks, {} notes, {:.1} bpm, {} ticks per beat, {:.2}s",
            score.tracks.len(),
            score.note_count(),
            score.tempo_bpm,
            score.resolution,
            score.end_time()
        );

        Ok(score)
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn resolution(&self) -> u16 {
        self.resolution
    }

    /// The last tempo seen in the file, or the default when there was none.
    pub fn tempo_bpm(&self) -> f64 {
        self.tempo_bpm
    }

    pub fn time_base(&self) -> &TimeBase {
        &self.time_base
    }

    pub fn notes(&self) -> impl Iterator<Item = &Note> {
        self.tracks.iter().flat_map(Track::notes)
    }

    pub fn note_count(&self) -> usize {
        self.tracks.iter().map(Track::note_count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.note_count() == 0
    }

    /// Lowest and highest pitch that sounds anywhere in the score.
    pub fn pitch_range(&self) -> Option<(u8, u8)> {
        self.notes().fold(None, |range, note| {
            let pitch = note.pitch();
            Some(match range {
                None => (pitch, pitch),
                Some((min, max)) => (min.min(pitch), max.max(pitch)),
            })
        })
    }

    /// When the last note ends, in seconds. Zero for an empty score.
    pub fn end_time(&self) -> f64 {
        self.notes().map(Note::end_time).fold(0.0, f64::max)
    }
}

fn settle_unterminated(notes: &mut Vec<Note>, track: usize, end_tick: u64, policy: UnterminatedPolicy) {
    match policy {
        UnterminatedPolicy::CloseAtTrackEnd => {
            for note in notes.iter_mut().filter(|note| !note.is_finished()) {
                warn!(
                    "track {track}: note {} from tick {} wasn't ended, closing it at tick {end_tick}",
                    note.pitch(),
                    note.start_ticks()
                );
                note.close(end_tick);
            }
        }
        UnterminatedPolicy::Drop => {
            let before = notes.len();
            notes.retain(Note::is_finished);
            if notes.len() < before {
                warn!("track {track}: dropped {} notes that weren't ended", before - notes.len());
            }
        }
    }
}
