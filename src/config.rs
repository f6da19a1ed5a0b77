use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::constants::{
    DEFAULT_ACTIVE_COLOR, DEFAULT_BACKGROUND, DEFAULT_FFMPEG, DEFAULT_FPS, DEFAULT_FRAME_HEIGHT, DEFAULT_FRAME_WIDTH,
    DEFAULT_INACTIVE_COLOR, DEFAULT_SHRINK, DEFAULT_TRAILING_WAIT, DEFAULT_WINDOW_AFTER, DEFAULT_WINDOW_BEFORE,
};
use crate::error::{Error, Result};
use crate::render::frame::FrameStyle;
use crate::render::raster::Rgb;
use crate::render::video::ScanMode;
use crate::render::window::Window;
use crate::score::score::{ScoreOptions, UnterminatedPolicy};
use crate::score::tempo::TempoMode;

/// Everything that shapes the rendered video. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    pub width: usize,
    pub height: usize,
    pub fps: u32,
    /// Seconds of the past kept on screen.
    pub window_before: f64,
    /// Seconds of the future shown ahead of the current time.
    pub window_after: f64,
    /// Time of the first frame.
    pub start_offset: f64,
    /// Seconds rendered after the last note ends.
    pub trailing_wait: f64,
    /// Lowest pitch row; derived from the score when unset.
    pub pitch_min: Option<u8>,
    /// Highest pitch row; derived from the score when unset.
    pub pitch_max: Option<u8>,
    pub active_color: Rgb,
    pub inactive_color: Rgb,
    pub background: Rgb,
    pub shrink: usize,
    pub scan_mode: ScanMode,
    pub tempo_mode: TempoMode,
    pub unterminated: UnterminatedPolicy,
    pub ffmpeg: PathBuf,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            width: DEFAULT_FRAME_WIDTH,
            height: DEFAULT_FRAME_HEIGHT,
            fps: DEFAULT_FPS,
            window_before: DEFAULT_WINDOW_BEFORE,
            window_after: DEFAULT_WINDOW_AFTER,
            start_offset: 0.0,
            trailing_wait: DEFAULT_TRAILING_WAIT,
            pitch_min: None,
            pitch_max: None,
            active_color: DEFAULT_ACTIVE_COLOR,
            inactive_color: DEFAULT_INACTIVE_COLOR,
            background: DEFAULT_BACKGROUND,
            shrink: DEFAULT_SHRINK,
            scan_mode: ScanMode::default(),
            tempo_mode: TempoMode::default(),
            unterminated: UnterminatedPolicy::default(),
            ffmpeg: PathBuf::from(DEFAULT_FFMPEG),
        }
    }
}

impl RenderConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: RenderConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        RenderConfig::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| -> Result<()> { Err(Error::InvalidConfig(reason)) };

        if self.width == 0 || self.height == 0 {
            return invalid(format!("frame size {}x{} is empty", self.width, self.height));
        }
        if self.fps == 0 {
            return invalid("frame rate must be positive".to_string());
        }
        for (name, value) in [
            ("window_before", self.window_before),
            ("window_after", self.window_after),
            ("trailing_wait", self.trailing_wait),
        ] {
            if !value.is_finite() || value < 0.0 {
                return invalid(format!("{name} must be a non-negative number of seconds, got {value}"));
            }
        }
        if self.window().length() <= 0.0 {
            return invalid("window_before and window_after can't both be zero".to_string());
        }
        if !self.start_offset.is_finite() {
            return invalid(format!("start_offset must be finite, got {}", self.start_offset));
        }
        if let (Some(min), Some(max)) = (self.pitch_min, self.pitch_max) {
            if min > max {
                return invalid(format!("pitch_min {min} is above pitch_max {max}"));
            }
        }
        for (name, pitch) in [("pitch_min", self.pitch_min), ("pitch_max", self.pitch_max)] {
            if let Some(pitch) = pitch.filter(|&pitch| pitch > 127) {
                return invalid(format!("{name} {pitch} is not a MIDI pitch"));
            }
        }

        Ok(())
    }

    pub fn window(&self) -> Window {
        Window::new(self.window_before, self.window_after)
    }

    pub fn style(&self) -> FrameStyle {
        FrameStyle {
            active_color: self.active_color,
            inactive_color: self.inactive_color,
            background: self.background,
            shrink: self.shrink,
        }
    }

    pub fn score_options(&self) -> ScoreOptions {
        ScoreOptions {
            tempo_mode: self.tempo_mode,
            unterminated: self.unterminated,
        }
    }
}
