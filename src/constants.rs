// MIDI
pub const N_PITCHES: usize = 128;
pub const MAX_PITCH: u8 = 127;
pub const DEFAULT_TEMPO_BPM: f64 = 120.0;
pub const MICROSECONDS_PER_MINUTE: f64 = 60_000_000.0;

// Pitch range used when the score has no notes to derive one from
pub const EMPTY_SCORE_PITCH_MIN: u8 = 21;
pub const EMPTY_SCORE_PITCH_MAX: u8 = 108;

// Video
pub const DEFAULT_FRAME_WIDTH: usize = 1280;
pub const DEFAULT_FRAME_HEIGHT: usize = 720;
pub const DEFAULT_FPS: u32 = 30;
pub const DEFAULT_WINDOW_BEFORE: f64 = 2.0;
pub const DEFAULT_WINDOW_AFTER: f64 = 14.0;
pub const DEFAULT_TRAILING_WAIT: f64 = 2.0;
pub const DEFAULT_SHRINK: usize = 1;
pub const DEFAULT_FFMPEG: &str = "ffmpeg";

// Colors (RGB)
pub const DEFAULT_ACTIVE_COLOR: [u8; 3] = [255, 200, 60];
pub const DEFAULT_INACTIVE_COLOR: [u8; 3] = [60, 140, 255];
pub const DEFAULT_BACKGROUND: [u8; 3] = [0, 0, 0];

// Rendering
pub const PARALLEL_BATCH_FRAMES: usize = 64;
