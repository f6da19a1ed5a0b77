use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use midi_roll::render::sink::{FfmpegSink, FrameSink, PpmSequenceSink};
use midi_roll::score::midi::load_source;
use midi_roll::{render_video, RenderConfig, ScanMode, Score};

#[derive(Parser)]
#[command(author, version, about = "Render a MIDI file as a scrolling piano-roll video", long_about = None)]
struct Cli {
    /// Path to input MIDI file
    input: PathBuf,

    /// Path to output video file
    #[arg(short, long, default_value = "output.mp4")]
    output: PathBuf,

    /// Write numbered PPM frames into this directory instead of encoding a video
    #[arg(long)]
    frames_dir: Option<PathBuf>,

    /// TOML file with render settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    width: Option<usize>,

    #[arg(long)]
    height: Option<usize>,

    #[arg(long)]
    fps: Option<u32>,

    /// Seconds after the current time shown ahead
    #[arg(long)]
    lookahead: Option<f64>,

    /// Seconds before the current time kept on screen
    #[arg(long)]
    lookback: Option<f64>,

    /// Render frames concurrently
    #[arg(long)]
    parallel: bool,

    /// ffmpeg binary to encode with
    #[arg(long)]
    ffmpeg: Option<PathBuf>,
}

impl Cli {
    fn render_config(&self) -> Result<RenderConfig> {
        let mut config = match &self.config {
            Some(path) => RenderConfig::load(path).with_context(|| format!("Failed to load config {}", path.display()))?,
            None => RenderConfig::default(),
        };

        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if let Some(fps) = self.fps {
            config.fps = fps;
        }
        if let Some(lookahead) = self.lookahead {
            config.window_after = lookahead;
        }
        if let Some(lookback) = self.lookback {
            config.window_before = lookback;
        }
        if self.parallel {
            config.scan_mode = ScanMode::Parallel;
        }
        if let Some(ffmpeg) = &self.ffmpeg {
            config.ffmpeg = ffmpeg.clone();
        }

        config.validate().context("Invalid render settings")?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.render_config()?;

    let source = load_source(&cli.input).with_context(|| format!("Failed to read MIDI file {}", cli.input.display()))?;
    let score = Score::from_source(&source, &config.score_options()).context("Failed to build score")?;

    let mut sink: Box<dyn FrameSink> = match &cli.frames_dir {
        Some(dir) => Box::new(PpmSequenceSink::new(dir).context("Failed to create frames directory")?),
        None => Box::new(
            FfmpegSink::spawn(&config.ffmpeg, &cli.output, config.width, config.height, config.fps)
                .context("Failed to start encoder")?,
        ),
    };

    let stats = render_video(&score, &config, sink.as_mut()).context("Rendering failed")?;
    info!("done: {} frames", stats.frames);

    Ok(())
}
