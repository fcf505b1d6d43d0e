//! Common frame source and sink types and traits.

use image::RgbImage;
use recam_data::{ErrorKind, ResampleError, Resolution};
use std::collections::VecDeque;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while decoding, resampling or encoding frames.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("{0} not found in PATH")]
    ToolNotFound(&'static str),

    #[error("Video not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("Failed to open video: {0}")]
    OpenFailed(String),

    #[error("Failed to decode frame: {0}")]
    CaptureFailed(String),

    #[error("Video yielded no frames: {0}")]
    NoFrames(String),

    #[error("Frame {index} is {actual} but the sequence is {expected}")]
    InconsistentFrame {
        index: usize,
        expected: Resolution,
        actual: Resolution,
    },

    #[error("Failed to encode video: {0}")]
    EncodeFailed(String),

    #[error("Invalid frame rate: {0} (must be a positive number)")]
    InvalidFrameRate(f64),

    #[error(transparent)]
    Resample(#[from] ResampleError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CaptureError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CaptureError::ToolNotFound(_)
            | CaptureError::OpenFailed(_)
            | CaptureError::CaptureFailed(_)
            | CaptureError::NoFrames(_)
            | CaptureError::InconsistentFrame { .. } => ErrorKind::Decode,
            CaptureError::SourceNotFound(_)
            | CaptureError::EncodeFailed(_)
            | CaptureError::Io(_) => ErrorKind::Io,
            CaptureError::InvalidFrameRate(_) => ErrorKind::Value,
            CaptureError::Resample(e) => e.kind(),
        }
    }
}

/// One decoded frame.
#[derive(Debug, Clone)]
pub struct FrameData {
    /// RGB image data.
    pub image: RgbImage,
    /// Presentation time in seconds (relative to stream start).
    pub timestamp: f64,
    /// Zero-based frame number.
    pub frame_number: u64,
}

impl FrameData {
    pub fn new(image: RgbImage, timestamp: f64, frame_number: u64) -> Self {
        Self {
            image,
            timestamp,
            frame_number,
        }
    }

    pub fn resolution(&self) -> Resolution {
        let (width, height) = self.image.dimensions();
        Resolution::new(width, height)
    }
}

/// A source of decoded video frames.
pub trait CaptureSource {
    /// Get the next frame. Returns `None` once the source is exhausted.
    fn next_frame(&mut self) -> Result<Option<FrameData>, CaptureError>;

    /// Declared frame rate, if known.
    fn frame_rate(&self) -> Option<f64>;

    /// Declared frame size.
    fn resolution(&self) -> Resolution;

    /// Check if the source can still produce frames.
    fn is_active(&self) -> bool;

    /// Stop decoding and release the source.
    fn stop(&mut self);
}

/// A destination for encoded frames.
pub trait FrameSink {
    /// Append one frame.
    fn write_frame(&mut self, image: &RgbImage) -> Result<(), CaptureError>;

    /// Flush and close the sink. No frames may be written afterwards.
    fn finish(&mut self) -> Result<(), CaptureError>;
}

/// Frames held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    frames: VecDeque<RgbImage>,
    frame_rate: Option<f64>,
    resolution: Resolution,
    frame_count: u64,
}

impl MemorySource {
    pub fn new(frames: Vec<RgbImage>) -> Self {
        let resolution = frames
            .first()
            .map(|f| Resolution::new(f.width(), f.height()))
            .unwrap_or_default();
        Self {
            frames: frames.into(),
            frame_rate: None,
            resolution,
            frame_count: 0,
        }
    }

    pub fn with_frame_rate(mut self, fps: f64) -> Self {
        self.frame_rate = Some(fps);
        self
    }
}

impl CaptureSource for MemorySource {
    fn next_frame(&mut self) -> Result<Option<FrameData>, CaptureError> {
        let Some(image) = self.frames.pop_front() else {
            return Ok(None);
        };
        let timestamp = self
            .frame_rate
            .map(|fps| self.frame_count as f64 / fps)
            .unwrap_or(0.0);
        let frame = FrameData::new(image, timestamp, self.frame_count);
        self.frame_count += 1;
        Ok(Some(frame))
    }

    fn frame_rate(&self) -> Option<f64> {
        self.frame_rate
    }

    fn resolution(&self) -> Resolution {
        self.resolution
    }

    fn is_active(&self) -> bool {
        !self.frames.is_empty()
    }

    fn stop(&mut self) {
        self.frames.clear();
    }
}

/// Collects frames in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    frames: Vec<RgbImage>,
    finished: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[RgbImage] {
        &self.frames
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl FrameSink for MemorySink {
    fn write_frame(&mut self, image: &RgbImage) -> Result<(), CaptureError> {
        if self.finished {
            return Err(CaptureError::EncodeFailed(
                "frame written after finish".to_string(),
            ));
        }
        self.frames.push(image.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<(), CaptureError> {
        self.finished = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_memory_source_yields_in_order() {
        let frames: Vec<RgbImage> = (0..3u8)
            .map(|i| RgbImage::from_pixel(4, 2, Rgb([i, i, i])))
            .collect();
        let mut source = MemorySource::new(frames).with_frame_rate(2.0);
        assert_eq!(source.resolution(), Resolution::new(4, 2));

        let mut seen = Vec::new();
        while let Some(frame) = source.next_frame().unwrap() {
            seen.push((frame.frame_number, frame.timestamp, frame.image.get_pixel(0, 0)[0]));
        }
        assert_eq!(seen, vec![(0, 0.0, 0), (1, 0.5, 1), (2, 1.0, 2)]);
        assert!(!source.is_active());
    }

    #[test]
    fn test_memory_sink_rejects_writes_after_finish() {
        let mut sink = MemorySink::new();
        let frame = RgbImage::new(2, 2);
        sink.write_frame(&frame).unwrap();
        sink.finish().unwrap();
        assert!(sink.write_frame(&frame).is_err());
        assert_eq!(sink.frames().len(), 1);
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(CaptureError::NoFrames("x".into()).kind(), ErrorKind::Decode);
        assert_eq!(CaptureError::ToolNotFound("ffmpeg").kind(), ErrorKind::Decode);
        assert_eq!(CaptureError::EncodeFailed("x".into()).kind(), ErrorKind::Io);
        assert_eq!(
            CaptureError::SourceNotFound(PathBuf::from("a.mp4")).kind(),
            ErrorKind::Io
        );
        assert_eq!(CaptureError::InvalidFrameRate(0.0).kind(), ErrorKind::Value);
        assert_eq!(
            CaptureError::from(ResampleError::InvalidTarget(0)).kind(),
            ErrorKind::Value
        );
    }
}
