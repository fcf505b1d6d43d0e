//! Video encoding through an ffmpeg child process.

use crate::command::{FfmpegCommand, PIPE_IN, drain_stderr, join_stderr};
use crate::source::{CaptureError, FrameSink};
use image::RgbImage;
use recam_data::Resolution;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Stdio};
use std::thread::JoinHandle;
use tracing::{debug, info};

/// Encoder settings.
#[derive(Debug, Clone, PartialEq)]
pub struct EncoderConfig {
    /// ffmpeg video codec name.
    pub codec: String,
    /// Constant rate factor, for codecs that take one.
    pub crf: Option<u8>,
    /// Output pixel format. When unset, `yuv420p` is used for even frame
    /// sizes and `yuv444p` otherwise, since 4:2:0 needs even sides.
    pub pixel_format: Option<String>,
    /// Container format. When unset, ffmpeg infers it from the output
    /// extension, falling back to mp4 for extensionless paths.
    pub container: Option<String>,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            codec: "libx264".to_string(),
            crf: Some(18),
            pixel_format: None,
            container: None,
        }
    }
}

impl EncoderConfig {
    pub fn with_codec(mut self, codec: impl Into<String>) -> Self {
        self.codec = codec.into();
        self
    }

    pub fn with_crf(mut self, crf: Option<u8>) -> Self {
        self.crf = crf;
        self
    }

    pub fn with_pixel_format(mut self, format: impl Into<String>) -> Self {
        self.pixel_format = Some(format.into());
        self
    }

    fn pixel_format_for(&self, resolution: Resolution) -> String {
        match &self.pixel_format {
            Some(format) => format.clone(),
            None if resolution.width % 2 == 0 && resolution.height % 2 == 0 => {
                "yuv420p".to_string()
            }
            None => "yuv444p".to_string(),
        }
    }
}

/// Feeds rgb24 frames to ffmpeg, which encodes them to `output`.
pub struct FfmpegEncoder {
    output: PathBuf,
    child: Child,
    stdin: Option<BufWriter<ChildStdin>>,
    stderr: Option<JoinHandle<String>>,
    resolution: Resolution,
    frames_written: u64,
}

impl FfmpegEncoder {
    /// Start an encoder writing `resolution` frames at `fps` to `output`.
    pub fn create(
        output: &Path,
        resolution: Resolution,
        fps: f64,
        config: &EncoderConfig,
    ) -> Result<Self, CaptureError> {
        let mut command = FfmpegCommand::new(PIPE_IN, output)
            .raw_rgb_input(resolution, fps)
            .output_args(["-an", "-map", "0:v:0"])
            .video_codec(&config.codec);
        if let Some(crf) = config.crf {
            command = command.crf(crf);
        }
        command = command.pixel_format(config.pixel_format_for(resolution));
        match (&config.container, output.extension()) {
            (Some(container), _) => command = command.format(container),
            (None, None) => command = command.format("mp4"),
            (None, Some(_)) => {}
        }

        let mut child = command.spawn(Stdio::piped(), Stdio::null())?;
        let stderr = drain_stderr(&mut child);
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| CaptureError::EncodeFailed("ffmpeg stdin unavailable".to_string()))?;

        info!(
            "Encoding {} at {} @ {} fps with {}",
            output.display(),
            resolution,
            fps,
            config.codec
        );
        Ok(Self {
            output: output.to_path_buf(),
            child,
            stdin: Some(BufWriter::with_capacity(resolution.pixel_count() * 3, stdin)),
            stderr,
            resolution,
            frames_written: 0,
        })
    }

    /// Reap the child and turn a failed exit into an error carrying its stderr.
    fn fail(&mut self, context: String) -> CaptureError {
        self.stdin = None;
        let _ = self.child.kill();
        let _ = self.child.wait();
        let stderr = join_stderr(self.stderr.take());
        CaptureError::EncodeFailed(format!("{context}: {stderr}"))
    }
}

impl FrameSink for FfmpegEncoder {
    fn write_frame(&mut self, image: &RgbImage) -> Result<(), CaptureError> {
        let actual = Resolution::new(image.width(), image.height());
        if actual != self.resolution {
            return Err(CaptureError::InconsistentFrame {
                index: self.frames_written as usize,
                expected: self.resolution,
                actual,
            });
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(CaptureError::EncodeFailed(
                "frame written after finish".to_string(),
            ));
        };
        if let Err(e) = stdin.write_all(image.as_raw()) {
            let context = format!(
                "writing frame {} to {}: {e}",
                self.frames_written,
                self.output.display()
            );
            return Err(self.fail(context));
        }
        self.frames_written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), CaptureError> {
        let Some(mut stdin) = self.stdin.take() else {
            return Ok(());
        };
        if let Err(e) = stdin.flush() {
            let context = format!("flushing frames to {}: {e}", self.output.display());
            return Err(self.fail(context));
        }
        // Closing stdin signals end of input.
        drop(stdin);

        let status = self.child.wait()?;
        let stderr = join_stderr(self.stderr.take());
        if !status.success() {
            return Err(CaptureError::EncodeFailed(format!(
                "ffmpeg exited with {status} encoding {}: {stderr}",
                self.output.display()
            )));
        }
        if !stderr.is_empty() {
            debug!("ffmpeg: {}", stderr);
        }
        info!(
            "Encoded {} frames to {}",
            self.frames_written,
            self.output.display()
        );
        Ok(())
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        // Unfinished encodes are abandoned, not completed.
        if self.stdin.take().is_some() {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_format_for_odd_sizes() {
        let config = EncoderConfig::default();
        assert_eq!(config.pixel_format_for(Resolution::new(832, 480)), "yuv420p");
        assert_eq!(config.pixel_format_for(Resolution::new(831, 480)), "yuv444p");
        let config = config.with_pixel_format("rgb24");
        assert_eq!(config.pixel_format_for(Resolution::new(831, 480)), "rgb24");
    }

    #[test]
    fn test_default_config() {
        let config = EncoderConfig::default();
        assert_eq!(config.codec, "libx264");
        assert_eq!(config.crf, Some(18));
        assert!(config.container.is_none());
    }
}
