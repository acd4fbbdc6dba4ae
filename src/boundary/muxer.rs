//! Composing rendered tile frames into a video and extracting frames back
//! out of one (§1, §6). [`VideoMuxer`] is the seam; [`FfmpegMuxer`] is the
//! default implementation, honoring the same `FFMPEG_CMD`/`FFMPEG_PRESET`/
//! `FFMPEG_CRF` environment knobs as the original system.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Error, Result};

pub trait VideoMuxer {
    /// Encodes the numbered PNG frames in `frame_dir` into `output` at `fps`.
    fn mux(&self, frame_dir: &Path, fps: u32, output: &Path) -> Result<()>;

    /// Extracts every frame of `video` as PNGs into `frame_dir`, returning
    /// their paths in frame order.
    fn extract(&self, video: &Path, frame_dir: &Path) -> Result<Vec<PathBuf>>;
}

pub struct FfmpegMuxer {
    pub command: String,
    pub preset: String,
    pub crf: String,
}

impl Default for FfmpegMuxer {
    fn default() -> Self {
        Self {
            command: std::env::var("FFMPEG_CMD").unwrap_or_else(|_| "ffmpeg".into()),
            preset: std::env::var("FFMPEG_PRESET").unwrap_or_else(|_| "slow".into()),
            crf: std::env::var("FFMPEG_CRF").unwrap_or_else(|_| "16".into()),
        }
    }
}

impl VideoMuxer for FfmpegMuxer {
    fn mux(&self, frame_dir: &Path, fps: u32, output: &Path) -> Result<()> {
        let pattern = frame_dir.join("%06d.png");
        let status = Command::new(&self.command)
            .arg("-y")
            .arg("-r")
            .arg(fps.to_string())
            .arg("-i")
            .arg(&pattern)
            .arg("-c:v")
            .arg("libx264")
            .arg("-preset")
            .arg(&self.preset)
            .arg("-crf")
            .arg(&self.crf)
            .arg("-pix_fmt")
            .arg("yuv420p")
            .arg(output)
            .status()
            .map_err(|err| Error::Dependency(format!("'{}': {err}", self.command)))?;

        if !status.success() {
            return Err(Error::MuxFailed(format!(
                "'{}' exited with {status}",
                self.command
            )));
        }
        Ok(())
    }

    fn extract(&self, video: &Path, frame_dir: &Path) -> Result<Vec<PathBuf>> {
        let pattern = frame_dir.join("%06d.png");
        let status = Command::new(&self.command)
            .arg("-y")
            .arg("-vsync")
            .arg("0")
            .arg("-i")
            .arg(video)
            .arg("-f")
            .arg("image2")
            .arg(&pattern)
            .status()
            .map_err(|err| Error::Dependency(format!("'{}': {err}", self.command)))?;

        if !status.success() {
            return Err(Error::Format(format!(
                "'{}' exited with {status}",
                self.command
            )));
        }

        let mut frames: Vec<PathBuf> = std::fs::read_dir(frame_dir)?
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "png"))
            .collect();
        frames.sort();
        Ok(frames)
    }
}
