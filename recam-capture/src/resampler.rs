//! Resampling decoded videos to a fixed frame count.

use crate::encoder::{EncoderConfig, FfmpegEncoder};
use crate::file::FfmpegFileCapture;
use crate::resize::{FitMode, blend, fit_to};
use crate::source::{CaptureError, CaptureSource, FrameSink};
use image::RgbImage;
use recam_data::{ResampleMode, ResampleSpec, Resolution, SourceSample, StagedFile, TargetCount};
use std::path::Path;
use tracing::{debug, info, warn};

/// Frame rate used when the source declares none.
pub const FALLBACK_FRAME_RATE: f64 = 30.0;

/// How output frames are produced from the decoded sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameSampling {
    /// Duplicate or drop frames, picking the nearest source frame.
    #[default]
    Nearest,
    /// Linearly blend the two neighbouring source frames.
    Blend,
}

/// Frame rate written to the output container.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum FrameRatePolicy {
    /// Keep the source's declared rate.
    #[default]
    Source,
    /// Scale the rate by `m / n` so the clip keeps its duration.
    PreserveDuration,
    /// Use the given rate.
    Fixed(f64),
}

/// Video resampling options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoResampleOptions {
    /// Output frame size; the source size when unset.
    pub resolution: Option<Resolution>,
    pub fit: FitMode,
    pub sampling: FrameSampling,
    pub frame_rate: FrameRatePolicy,
    pub encoder: EncoderConfig,
}

impl VideoResampleOptions {
    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = Some(resolution);
        self
    }

    pub fn with_fit(mut self, fit: FitMode) -> Self {
        self.fit = fit;
        self
    }

    pub fn with_sampling(mut self, sampling: FrameSampling) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn with_frame_rate(mut self, frame_rate: FrameRatePolicy) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    pub fn with_encoder(mut self, encoder: EncoderConfig) -> Self {
        self.encoder = encoder;
        self
    }
}

/// Summary of one video resample.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoResampleReport {
    pub source_frames: usize,
    pub target_frames: usize,
    pub resolution: Resolution,
    pub fps: f64,
    pub mode: ResampleMode,
}

/// Normalizes a video to a target frame count and size.
#[derive(Debug, Clone, Default)]
pub struct FrameSequenceResampler {
    options: VideoResampleOptions,
}

impl FrameSequenceResampler {
    pub fn new(options: VideoResampleOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &VideoResampleOptions {
        &self.options
    }

    /// Output frame rate for a source of `source_frames` frames declared at `source_fps`.
    pub fn output_frame_rate(
        &self,
        source_fps: Option<f64>,
        source_frames: usize,
        target: TargetCount,
    ) -> Result<f64, CaptureError> {
        let base = source_fps
            .filter(|fps| fps.is_finite() && *fps > 0.0)
            .unwrap_or_else(|| {
                warn!(
                    "Source declares no frame rate, assuming {} fps",
                    FALLBACK_FRAME_RATE
                );
                FALLBACK_FRAME_RATE
            });
        let fps = match self.options.frame_rate {
            FrameRatePolicy::Source => base,
            FrameRatePolicy::PreserveDuration => {
                base * target.get() as f64 / source_frames.max(1) as f64
            }
            FrameRatePolicy::Fixed(fps) => fps,
        };
        if !fps.is_finite() || fps <= 0.0 {
            return Err(CaptureError::InvalidFrameRate(fps));
        }
        Ok(fps)
    }

    /// Resample an in-memory sequence. All frames must share one size.
    pub fn resample_frames(
        &self,
        frames: &[RgbImage],
        target: TargetCount,
    ) -> Result<Vec<RgbImage>, CaptureError> {
        let resolution = check_dimensions(frames)?;
        let spec = ResampleSpec::new(frames.len(), target)
            .ok_or_else(|| CaptureError::NoFrames("source produced no frames".to_string()))?;
        let output = self.options.resolution.unwrap_or(resolution);

        let sampling = self.sampling_for(&spec);
        Ok(spec
            .plan()
            .into_iter()
            .map(|sample| self.render(frames, sample, sampling, output))
            .collect())
    }

    /// Drain `source`, resample it and write the result to the sink returned
    /// by `open_sink`, which receives the output size and frame rate.
    pub fn resample_source<S, K, F>(
        &self,
        source: &mut S,
        target: TargetCount,
        open_sink: F,
    ) -> Result<(VideoResampleReport, K), CaptureError>
    where
        S: CaptureSource + ?Sized,
        K: FrameSink,
        F: FnOnce(Resolution, f64) -> Result<K, CaptureError>,
    {
        let mut frames = Vec::new();
        while let Some(frame) = source.next_frame()? {
            frames.push(frame.image);
        }
        source.stop();

        let source_resolution = check_dimensions(&frames)?;
        let spec = ResampleSpec::new(frames.len(), target)
            .ok_or_else(|| CaptureError::NoFrames("source produced no frames".to_string()))?;
        let declared = source.resolution();
        if declared != source_resolution {
            debug!(
                "Decoded frames are {} but the source declared {}",
                source_resolution, declared
            );
        }

        let resolution = self.options.resolution.unwrap_or(source_resolution);
        let fps = self.output_frame_rate(source.frame_rate(), frames.len(), target)?;
        let report = VideoResampleReport {
            source_frames: frames.len(),
            target_frames: spec.target_len(),
            resolution,
            fps,
            mode: spec.mode(),
        };
        debug!(
            "Resampling {} frames at {} to {} frames at {} ({:?}, {:?})",
            report.source_frames,
            source_resolution,
            report.target_frames,
            resolution,
            self.options.sampling,
            self.options.fit
        );

        let sampling = self.sampling_for(&spec);
        let mut sink = open_sink(resolution, fps)?;
        for sample in spec.plan() {
            let frame = self.render(&frames, sample, sampling, resolution);
            sink.write_frame(&frame)?;
        }
        sink.finish()?;

        Ok((report, sink))
    }

    /// Resample the video at `input` and encode the result to `output`.
    ///
    /// The target count is validated before `input` is opened. On any failure
    /// nothing is left at `output`.
    #[tracing::instrument(skip_all, fields(input = %input.display(), frames = target))]
    pub fn resample_file(
        &self,
        input: &Path,
        output: &Path,
        target: i64,
    ) -> Result<VideoResampleReport, CaptureError> {
        let target = TargetCount::new(target)?;
        let mut capture = FfmpegFileCapture::open(input)?;
        let declared_frames = capture.info().frame_count;
        let staged = StagedFile::new(output)?;

        let (report, encoder) = self.resample_source(&mut capture, target, |resolution, fps| {
            FfmpegEncoder::create(staged.path(), resolution, fps, &self.options.encoder)
        })?;
        drop(encoder);
        staged.commit()?;

        if let Some(declared) = declared_frames.filter(|&n| n != report.source_frames as u64) {
            debug!(
                "Container declared {} frames but {} were decoded",
                declared, report.source_frames
            );
        }

        info!(
            "Wrote {} frames at {} @ {} fps to {} (from {})",
            report.target_frames,
            report.resolution,
            report.fps,
            output.display(),
            report.source_frames
        );
        Ok(report)
    }

    /// Downsampling only ever drops frames, so blending is limited to upsampling.
    fn sampling_for(&self, spec: &ResampleSpec) -> FrameSampling {
        if spec.source_len() > spec.target_len() {
            FrameSampling::Nearest
        } else {
            self.options.sampling
        }
    }

    fn render(
        &self,
        frames: &[RgbImage],
        sample: SourceSample,
        sampling: FrameSampling,
        resolution: Resolution,
    ) -> RgbImage {
        match sampling {
            FrameSampling::Nearest => fit_to(&frames[sample.nearest], resolution, self.options.fit),
            FrameSampling::Blend if sample.is_exact() => {
                fit_to(&frames[sample.lower], resolution, self.options.fit)
            }
            FrameSampling::Blend => {
                let mixed = blend(&frames[sample.lower], &frames[sample.upper], sample.weight);
                fit_to(&mixed, resolution, self.options.fit)
            }
        }
    }
}

/// The shared size of `frames`, or the first frame that differs from it.
fn check_dimensions(frames: &[RgbImage]) -> Result<Resolution, CaptureError> {
    let Some(first) = frames.first() else {
        return Err(CaptureError::NoFrames("source produced no frames".to_string()));
    };
    let expected = Resolution::new(first.width(), first.height());
    for (index, frame) in frames.iter().enumerate().skip(1) {
        let actual = Resolution::new(frame.width(), frame.height());
        if actual != expected {
            return Err(CaptureError::InconsistentFrame {
                index,
                expected,
                actual,
            });
        }
    }
    Ok(expected)
}
