use log::{debug, info};
use rayon::prelude::*;
use serde::Deserialize;

use crate::config::RenderConfig;
use crate::constants::PARALLEL_BATCH_FRAMES;
use crate::error::Result;
use crate::score::score::Score;

use super::frame::FrameRenderer;
use super::raster::Raster;
use super::sink::FrameSink;
use super::window::{FrameIndex, WindowScanner};

/// How frames find their visible notes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScanMode {
    /// One frame after another with forward-only cursors.
    #[default]
    Sequential,
    /// Batches of frames rendered on the rayon pool, each frame searching on its own.
    Parallel,
}

/// The presentation times of every output frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameClock {
    start: f64,
    fps: u32,
    count: usize,
}

impl FrameClock {
    /// Frames from `start` until `end` at `fps`; at least one frame.
    pub fn new(start: f64, end: f64, fps: u32) -> Self {
        let span = ((end - start) * f64::from(fps)).ceil();
        let count = if span.is_finite() && span >= 1.0 { span as usize } else { 1 };
        FrameClock { start, fps, count }
    }

    /// Frames from the configured offset until the trailing wait after the last note has passed.
    pub fn for_score(score: &Score, config: &RenderConfig) -> Self {
        let end = score.end_time() + config.trailing_wait;
        FrameClock::new(config.start_offset, end, config.fps)
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn time(&self, frame: usize) -> f64 {
        self.start + frame as f64 / f64::from(self.fps)
    }

    pub fn times(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.count).map(|frame| self.time(frame))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub frames: usize,
    pub notes: usize,
    /// Most notes visible in a single frame.
    pub visible_max: usize,
}

/// Render `score` frame by frame into `sink`, then finish the sink.
///
/// # Arguments
///
/// * `score` - The notes to draw.
/// * `config` - Frame size, timing, colors and scan mode.
/// * `sink` - Receives the frames in presentation order.
///
/// # Returns
///
/// * How many frames were written and how crowded they got.
pub fn render_video(score: &Score, config: &RenderConfig, sink: &mut dyn FrameSink) -> Result<RenderStats> {
    config.validate()?;

    let renderer = FrameRenderer::from_config(config, score);
    let clock = FrameClock::for_score(score, config);
    let layout = renderer.layout();
    debug!(
        "rendering {} frames, pitches {}..={} in rows of {} px, {:.1} px per second",
        clock.len(),
        layout.pitch_min(),
        layout.pitch_max(),
        layout.row_height(),
        renderer.pixels_per_second()
    );

    let mut stats = RenderStats {
        notes: score.note_count(),
        ..RenderStats::default()
    };

    match config.scan_mode {
        ScanMode::Sequential => {
            let mut scanner = WindowScanner::new(score, config.window());
            let mut raster = renderer.new_raster();
            for time in clock.times() {
                let visible = scanner.visible_at(time)?;
                renderer.render(time, &visible, &mut raster);
                sink.push(&raster)?;
                stats.frames += 1;
                stats.visible_max = stats.visible_max.max(visible.len());
            }
        }
        ScanMode::Parallel => {
            let index = FrameIndex::new(score, config.window());
            for batch_start in (0..clock.len()).step_by(PARALLEL_BATCH_FRAMES) {
                let batch_end = (batch_start + PARALLEL_BATCH_FRAMES).min(clock.len());
                let frames: Vec<(Raster, usize)> = (batch_start..batch_end)
                    .into_par_iter()
                    .map(|frame| {
                        let time = clock.time(frame);
                        let visible = index.visible_at(time);
                        let mut raster = renderer.new_raster();
                        renderer.render(time, &visible, &mut raster);
                        (raster, visible.len())
                    })
                    .collect();

                for (raster, visible) in frames {
                    sink.push(&raster)?;
                    stats.frames += 1;
                    stats.visible_max = stats.visible_max.max(visible);
                }
            }
        }
    }

    sink.finish()?;

    info!(
        "rendered {} frames of {} notes, at most {} on screen at once",
        stats.frames, stats.notes, stats.visible_max
    );

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;

    use super::*;
    use crate::render::sink::MemorySink;
    use crate::score::fixtures::{scattered_notes, score_from_seconds};

    fn small_config(scan_mode: ScanMode) -> RenderConfig {
        RenderConfig {
            width: 64,
            height: 36,
            fps: 10,
            window_before: 1.0,
            window_after: 3.0,
            trailing_wait: 2.0,
            scan_mode,
            ..RenderConfig::default()
        }
    }

    #[test]
    fn clock_steps_at_frame_rate() {
        let clock = FrameClock::new(-1.0, 2.0, 10);
        assert_eq!(clock.len(), 30);
        assert_approx_eq!(clock.time(0), -1.0);
        assert_approx_eq!(clock.time(15), 0.5);

        let times: Vec<f64> = clock.times().collect();
        assert!(times.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn clock_has_at_least_one_frame() {
        assert_eq!(FrameClock::new(0.0, 0.0, 30).len(), 1);
        assert_eq!(FrameClock::new(5.0, 1.0, 30).len(), 1);
        assert_eq!(FrameClock::new(0.0, 0.01, 30).len(), 1);
    }

    #[test]
    fn clock_covers_trailing_wait() {
        let score = score_from_seconds(&[(0, 60, 0.0, 1.0)]);
        let clock = FrameClock::for_score(&score, &small_config(ScanMode::Sequential));
        assert_eq!(clock.len(), 30);
    }

    #[test]
    fn empty_score_renders_trailing_wait() {
        let score = score_from_seconds(&[]);
        let mut sink = MemorySink::default();

        let stats = render_video(&score, &small_config(ScanMode::Sequential), &mut sink).unwrap();
        assert_eq!(stats.frames, 20);
        assert_eq!(stats.visible_max, 0);
        assert_eq!(sink.frames.len(), 20);
        assert!(sink.finished);
    }

    #[test]
    fn empty_score_without_wait_still_has_a_frame() {
        let score = score_from_seconds(&[]);
        let config = RenderConfig {
            trailing_wait: 0.0,
            ..small_config(ScanMode::Parallel)
        };
        let mut sink = MemorySink::default();

        assert_eq!(render_video(&score, &config, &mut sink).unwrap().frames, 1);
    }

    #[test]
    fn sequential_and_parallel_frames_are_identical() {
        let score = score_from_seconds(&scattered_notes(150, 12.0, 9));

        let mut sequential = MemorySink::default();
        let stats = render_video(&score, &small_config(ScanMode::Sequential), &mut sequential).unwrap();
        let mut parallel = MemorySink::default();
        let parallel_stats = render_video(&score, &small_config(ScanMode::Parallel), &mut parallel).unwrap();

        assert_eq!(stats, parallel_stats);
        assert!(stats.frames > PARALLEL_BATCH_FRAMES);
        assert!(stats.visible_max > 0);
        assert_eq!(sequential.frames, parallel.frames);
    }

    #[test]
    fn invalid_config_renders_nothing() {
        let score = score_from_seconds(&[(0, 60, 0.0, 1.0)]);
        let config = RenderConfig {
            fps: 0,
            ..RenderConfig::default()
        };
        let mut sink = MemorySink::default();

        assert!(render_video(&score, &config, &mut sink).is_err());
        assert!(sink.frames.is_empty());
    }
}
