//! Turns a MIDI performance into a scrolling piano-roll video.
//!
//! Events are reduced to notes per track and pitch ([`score`]), then every frame looks up
//! the notes inside its time window and paints them ([`render`]).

pub mod config;
pub mod constants;
pub mod error;
pub mod score {
    pub mod events;
    pub mod midi;
    pub mod note;
    pub mod reducer;
    pub mod score;
    pub mod tempo;
    #[cfg(test)]
    pub(crate) mod fixtures;
}
pub mod render {
    pub mod frame;
    pub mod raster;
    pub mod sink;
    pub mod video;
    pub mod window;
}

pub use config::RenderConfig;
pub use error::{Error, Result};
pub use render::video::{render_video, RenderStats, ScanMode};
pub use score::score::{Score, ScoreOptions, UnterminatedPolicy};
