use std::path::PathBuf;

/// Errors produced while loading a score or rendering it to video.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("MIDI error: {0}")]
    Midi(String),

    #[error("Timecode-based MIDI timing is not supported, only ticks per quarter note")]
    UnsupportedTiming,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Query time {requested} does not advance past {previous}")]
    NonMonotonicQuery { previous: f64, requested: f64 },

    #[error("Encoder error: {0}")]
    Encoder(String),
}

impl From<midly::Error> for Error {
    fn from(err: midly::Error) -> Self {
        Error::Midi(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
