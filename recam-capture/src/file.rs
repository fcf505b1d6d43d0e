//! Video file decoding through an ffmpeg child process.

use crate::command::{FfmpegCommand, PIPE_OUT, drain_stderr, join_stderr};
use crate::probe::{VideoInfo, probe_video};
use crate::source::{CaptureError, CaptureSource, FrameData};
use image::RgbImage;
use recam_data::Resolution;
use std::io::{BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Stdio};
use std::thread::JoinHandle;
use tracing::{debug, info};

/// Decodes a video file to rgb24 frames.
pub struct FfmpegFileCapture {
    path: PathBuf,
    child: Child,
    stdout: BufReader<ChildStdout>,
    stderr: Option<JoinHandle<String>>,
    info: VideoInfo,
    frame_len: usize,
    frame_count: u64,
    active: bool,
}

impl FfmpegFileCapture {
    /// Probe `path` and start decoding it.
    pub fn open(path: &Path) -> Result<Self, CaptureError> {
        let info = probe_video(path)?;
        info!(
            "Opening video {} at {}x{} @ {:?} fps ({}), declared {:?} frames over {:?}s",
            path.display(),
            info.width,
            info.height,
            info.fps,
            info.codec,
            info.frame_count,
            info.duration
        );

        // Without -noautorotate, rotated sources decode with swapped sides.
        let mut child = FfmpegCommand::new(path, PIPE_OUT)
            .input_arg("-noautorotate")
            .raw_rgb_output()
            .spawn(Stdio::null(), Stdio::piped())
            .map_err(|e| match e {
                CaptureError::Io(e) => CaptureError::OpenFailed(format!("starting decoder: {e}")),
                other => other,
            })?;
        let stderr = drain_stderr(&mut child);
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| CaptureError::OpenFailed("ffmpeg stdout unavailable".to_string()))?;

        let frame_len = info.resolution().pixel_count() * 3;
        Ok(Self {
            path: path.to_path_buf(),
            child,
            stdout: BufReader::with_capacity(frame_len.max(8192), stdout),
            stderr,
            info,
            frame_len,
            frame_count: 0,
            active: true,
        })
    }

    pub fn info(&self) -> &VideoInfo {
        &self.info
    }

    /// Called once the decoder's stdout hits end of stream.
    fn finish_stream(&mut self) -> Result<(), CaptureError> {
        self.active = false;
        let status = self
            .child
            .wait()
            .map_err(|e| CaptureError::CaptureFailed(format!("waiting for decoder: {e}")))?;
        let stderr = join_stderr(self.stderr.take());
        if !status.success() {
            return Err(CaptureError::CaptureFailed(format!(
                "ffmpeg exited with {status} decoding {}: {stderr}",
                self.path.display()
            )));
        }
        info!(
            "Decoded {} frames from {}",
            self.frame_count,
            self.path.display()
        );
        Ok(())
    }
}

impl CaptureSource for FfmpegFileCapture {
    fn next_frame(&mut self) -> Result<Option<FrameData>, CaptureError> {
        if !self.active {
            return Ok(None);
        }

        let mut buffer = vec![0u8; self.frame_len];
        let filled = read_full(&mut self.stdout, &mut buffer)?;
        if filled == 0 {
            self.finish_stream()?;
            return Ok(None);
        }
        if filled < self.frame_len {
            self.stop();
            return Err(CaptureError::CaptureFailed(format!(
                "truncated frame {} ({filled} of {} bytes)",
                self.frame_count, self.frame_len
            )));
        }

        let image = RgbImage::from_raw(self.info.width, self.info.height, buffer).ok_or_else(
            || CaptureError::CaptureFailed("Failed to create RGB image".to_string()),
        )?;
        let timestamp = self.frame_count as f64 / self.info.fps.unwrap_or(1.0);
        let frame = FrameData::new(image, timestamp, self.frame_count);
        self.frame_count += 1;

        debug!("Decoded frame {} at {:.3}s", frame.frame_number, timestamp);
        Ok(Some(frame))
    }

    fn frame_rate(&self) -> Option<f64> {
        self.info.fps
    }

    fn resolution(&self) -> Resolution {
        self.info.resolution()
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn stop(&mut self) {
        if self.active {
            self.active = false;
            let _ = self.child.kill();
            let _ = self.child.wait();
            debug!(
                "Decoder for {} stopped after {} frames",
                self.path.display(),
                self.frame_count
            );
        }
    }
}

impl Drop for FfmpegFileCapture {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Fill `buffer` unless the stream ends first; returns the number of bytes read.
/// Read errors on the decoder pipe are decode failures.
fn read_full(reader: &mut impl Read, buffer: &mut [u8]) -> Result<usize, CaptureError> {
    let mut filled = 0;
    while filled < buffer.len() {
        match reader.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(CaptureError::CaptureFailed(format!(
                    "reading decoder output: {e}"
                )));
            }
        }
    }
    Ok(filled)
}
