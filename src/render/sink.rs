use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use log::{debug, info};

use crate::error::{Error, Result};

use super::raster::Raster;

/// Receives rendered frames in presentation order.
pub trait FrameSink {
    fn push(&mut self, frame: &Raster) -> Result<()>;

    /// Flush and close the output. Frames pushed afterwards are an error.
    fn finish(&mut self) -> Result<()>;
}

/// Pipes raw rgb24 frames into an external `ffmpeg` process.
#[derive(Debug)]
pub struct FfmpegSink {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    frame_len: usize,
    frames: usize,
}

impl FfmpegSink {
    /// Start `ffmpeg` encoding H.264 into `output`.
    ///
    /// # Arguments
    ///
    /// * `ffmpeg` - The encoder binary, looked up on `PATH` when not a path.
    /// * `output` - The video file to write. An existing file is overwritten.
    /// * `width`, `height` - Frame size; odd sizes are padded by one pixel.
    /// * `fps` - Frame rate of the output.
    pub fn spawn(ffmpeg: &Path, output: &Path, width: usize, height: usize, fps: u32) -> Result<Self> {
        let size = format!("{width}x{height}");
        let rate = fps.to_string();
        let child = Command::new(ffmpeg)
            .args(["-y", "-loglevel", "error", "-f", "rawvideo", "-pix_fmt", "rgb24"])
            .args(["-s", size.as_str(), "-r", rate.as_str(), "-i", "-"])
            .args(["-an", "-vf", "pad=ceil(iw/2)*2:ceil(ih/2)*2"])
            .args(["-c:v", "libx264", "-pix_fmt", "yuv420p"])
            .arg(output)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .spawn()
            .map_err(|e| Error::Encoder(format!("could not start {}: {e}", ffmpeg.display())))?;

        info!("encoding {width}x{height} at {fps} fps into {}", output.display());

        let mut sink = FfmpegSink {
            child: Some(child),
            stdin: None,
            frame_len: width * height * 3,
            frames: 0,
        };
        sink.stdin = sink.child.as_mut().and_then(|child| child.stdin.take());
        Ok(sink)
    }
}

impl FrameSink for FfmpegSink {
    fn push(&mut self, frame: &Raster) -> Result<()> {
        let bytes = frame.as_bytes();
        if bytes.len() != self.frame_len {
            return Err(Error::Encoder(format!(
                "frame of {} bytes doesn't match the {} bytes the encoder expects",
                bytes.len(),
                self.frame_len
            )));
        }

        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| Error::Encoder("encoder input is already closed".to_string()))?;
        stdin
            .write_all(&bytes)
            .map_err(|e| Error::Encoder(format!("encoder stopped accepting frames after {}: {e}", self.frames)))?;
        self.frames += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        // Closing stdin tells ffmpeg the stream is complete.
        drop(self.stdin.take());

        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        let status = child.wait()?;
        if !status.success() {
            return Err(Error::Encoder(format!("encoder exited with {status}")));
        }

        debug!("encoder finished after {} frames", self.frames);
        Ok(())
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.wait();
        }
    }
}

/// Writes every frame as a binary PPM image into a directory.
#[derive(Debug)]
pub struct PpmSequenceSink {
    dir: PathBuf,
    frames: usize,
    finished: bool,
}

impl PpmSequenceSink {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(PpmSequenceSink {
            dir,
            frames: 0,
            finished: false,
        })
    }

    pub fn frame_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("frame_{index:06}.ppm"))
    }

    pub fn frames(&self) -> usize {
        self.frames
    }
}

impl FrameSink for PpmSequenceSink {
    fn push(&mut self, frame: &Raster) -> Result<()> {
        if self.finished {
            return Err(Error::Encoder("frame sequence is already finished".to_string()));
        }

        let mut file = BufWriter::new(File::create(self.frame_path(self.frames))?);
        write!(file, "P6\n{} {}\n255\n", frame.width(), frame.height())?;
        file.write_all(&frame.as_bytes())?;
        file.flush()?;

        self.frames += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        info!("wrote {} frames to {}", self.frames, self.dir.display());
        Ok(())
    }
}

/// Keeps every frame in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub frames: Vec<Raster>,
    pub finished: bool,
}

impl FrameSink for MemorySink {
    fn push(&mut self, frame: &Raster) -> Result<()> {
        self.frames.push(frame.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}
