use serde::Deserialize;

use crate::constants::DEFAULT_TEMPO_BPM;

/// Converts a tick count to seconds at a fixed tempo.
///
/// # Arguments
///
/// * `ticks` - Absolute position in ticks.
/// * `resolution` - Ticks per quarter note.
/// * `tempo_bpm` - Beats (quarter notes) per minute.
pub fn ticks_to_seconds(ticks: u64, resolution: u16, tempo_bpm: f64) -> f64 {
    ticks as f64 / f64::from(resolution) * (60.0 / tempo_bpm)
}

/// How tempo events map ticks to seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TempoMode {
    /// The last tempo seen in the file applies to the whole score.
    #[default]
    LastWins,
    /// Every tempo change applies from its own tick onwards.
    Piecewise,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Breakpoint {
    tick: u64,
    bpm: f64,
    seconds: f64,
}

/// Sorted tempo breakpoints with the elapsed seconds at each one.
#[derive(Debug, Clone, PartialEq)]
pub struct TempoMap {
    resolution: u16,
    breakpoints: Vec<Breakpoint>,
}

impl TempoMap {
    /// Build a map from `(tick, bpm)` changes in any order. Where several changes share a
    /// tick, the one listed last wins. The default tempo applies before the first change.
    pub fn new(resolution: u16, changes: &[(u64, f64)]) -> Self {
        let mut changes = changes.to_vec();
        changes.sort_by_key(|&(tick, _)| tick);

        let mut breakpoints: Vec<Breakpoint> = vec![Breakpoint {
            tick: 0,
            bpm: DEFAULT_TEMPO_BPM,
            seconds: 0.0,
        }];

        for (tick, bpm) in changes {
            let last = breakpoints[breakpoints.len() - 1];
            if last.tick == tick {
                let len = breakpoints.len();
                breakpoints[len - 1].bpm = bpm;
                continue;
            }
            let seconds = last.seconds + ticks_to_seconds(tick - last.tick, resolution, last.bpm);
            breakpoints.push(Breakpoint { tick, bpm, seconds });
        }

        TempoMap { resolution, breakpoints }
    }

    pub fn seconds(&self, ticks: u64) -> f64 {
        let idx = self.breakpoints.partition_point(|bp| bp.tick <= ticks);
        // The breakpoint at tick 0 always satisfies the predicate, so idx >= 1.
        let bp = &self.breakpoints[idx.saturating_sub(1)];
        bp.seconds + ticks_to_seconds(ticks - bp.tick, self.resolution, bp.bpm)
    }
}

/// The tick-to-second mapping applied to every note of a score.
#[derive(Debug, Clone, PartialEq)]
pub enum TimeBase {
    Uniform { resolution: u16, tempo_bpm: f64 },
    Piecewise(TempoMap),
}

impl TimeBase {
    pub fn seconds(&self, ticks: u64) -> f64 {
        match self {
            TimeBase::Uniform { resolution, tempo_bpm } => ticks_to_seconds(ticks, *resolution, *tempo_bpm),
            TimeBase::Piecewise(map) => map.seconds(ticks),
        }
    }
}
