use log::trace;

use crate::config::RenderConfig;
use crate::constants::{EMPTY_SCORE_PITCH_MAX, EMPTY_SCORE_PITCH_MIN};
use crate::score::note::Note;
use crate::score::score::Score;

use super::raster::{Raster, Rgb};
use super::window::{VisibleNote, Window};

/// Maps pitches to equally tall rows, highest pitch on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PitchLayout {
    pitch_min: u8,
    pitch_max: u8,
    row_height: usize,
    top: usize,
}

impl PitchLayout {
    /// Spread `[pitch_min, pitch_max]` over `height` pixels. Rows are at least one pixel
    /// tall and the leftover is split above and below.
    pub fn new(pitch_min: u8, pitch_max: u8, height: usize) -> Self {
        let (pitch_min, pitch_max) = (pitch_min.min(pitch_max), pitch_min.max(pitch_max));
        let rows = usize::from(pitch_max - pitch_min) + 1;
        let row_height = (height / rows).max(1);
        let top = height.saturating_sub(rows * row_height) / 2;

        PitchLayout {
            pitch_min,
            pitch_max,
            row_height,
            top,
        }
    }

    /// The configured range, or the score's own range, or a piano keyboard for an empty score.
    pub fn for_score(score: &Score, pitch_min: Option<u8>, pitch_max: Option<u8>, height: usize) -> Self {
        let (derived_min, derived_max) = score
            .pitch_range()
            .unwrap_or((EMPTY_SCORE_PITCH_MIN, EMPTY_SCORE_PITCH_MAX));
        // A configured bound stays put; the derived one gives way to it.
        let (pitch_min, pitch_max) = match (pitch_min, pitch_max) {
            (Some(min), Some(max)) => (min, max),
            (Some(min), None) => (min, derived_max.max(min)),
            (None, Some(max)) => (derived_min.min(max), max),
            (None, None) => (derived_min, derived_max),
        };
        PitchLayout::new(pitch_min, pitch_max, height)
    }

    pub fn pitch_min(&self) -> u8 {
        self.pitch_min
    }

    pub fn pitch_max(&self) -> u8 {
        self.pitch_max
    }

    pub fn row_height(&self) -> usize {
        self.row_height
    }

    /// Top edge of the row for `pitch`. Pitches outside the range land off screen.
    pub fn row_top(&self, pitch: u8) -> i64 {
        let rows_from_top = i64::from(self.pitch_max) - i64::from(pitch);
        self.top as i64 + rows_from_top * self.row_height as i64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameStyle {
    pub active_color: Rgb,
    pub inactive_color: Rgb,
    pub background: Rgb,
    /// Pixels taken off every edge of a note so neighbours stay apart.
    pub shrink: usize,
}

/// A note's screen rectangle, half-open on the right and bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteRect {
    pub x0: i64,
    pub y0: i64,
    pub x1: i64,
    pub y1: i64,
}

/// Paints the visible notes of one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRenderer {
    width: usize,
    height: usize,
    window: Window,
    layout: PitchLayout,
    style: FrameStyle,
}

impl FrameRenderer {
    pub fn new(width: usize, height: usize, window: Window, layout: PitchLayout, style: FrameStyle) -> Self {
        FrameRenderer {
            width,
            height,
            window,
            layout,
            style,
        }
    }

    pub fn from_config(config: &RenderConfig, score: &Score) -> Self {
        let layout = PitchLayout::for_score(score, config.pitch_min, config.pitch_max, config.height);
        FrameRenderer::new(config.width, config.height, config.window(), layout, config.style())
    }

    pub fn layout(&self) -> PitchLayout {
        self.layout
    }

    pub fn new_raster(&self) -> Raster {
        Raster::new(self.width, self.height)
    }

    pub fn pixels_per_second(&self) -> f64 {
        self.width as f64 / self.window.length()
    }

    /// Where `note` is drawn at `time`, or `None` when shrinking leaves nothing.
    pub fn note_rect(&self, note: &Note, time: f64) -> Option<NoteRect> {
        let pps = self.pixels_per_second();
        let x_start = (note.start_time() - self.window.left(time)) * pps;
        let x_end = x_start + note.duration() * pps;
        let y0 = self.layout.row_top(note.pitch());
        let shrink = self.style.shrink as i64;

        let rect = NoteRect {
            x0: x_start.round() as i64 + shrink,
            y0: y0 + shrink,
            x1: x_end.round() as i64 - shrink,
            y1: y0 + self.layout.row_height as i64 - shrink,
        };

        (rect.x0 < rect.x1 && rect.y0 < rect.y1).then_some(rect)
    }

    /// Clear `raster` and paint every visible note on it.
    pub fn render(&self, time: f64, visible: &[VisibleNote<'_>], raster: &mut Raster) {
        raster.fill(self.style.background);

        let mut painted = 0;
        for visible_note in visible {
            let Some(rect) = self.note_rect(visible_note.note, time) else {
                continue;
            };
            let color = if visible_note.active {
                self.style.active_color
            } else {
                self.style.inactive_color
            };
            raster.fill_rect(rect.x0, rect.y0, rect.x1, rect.y1, color);
            painted += 1;
        }

        trace!("frame at {time:.3}s: {painted} of {} visible notes painted", visible.len());
    }
}
