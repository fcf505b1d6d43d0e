use image::{Rgb, RgbImage};
use recam_capture::{
    CaptureSource, EncoderConfig, FfmpegEncoder, FfmpegFileCapture, FrameRatePolicy, FrameSink,
    FrameSequenceResampler, VideoResampleOptions, probe_video,
};
use recam_data::{ErrorKind, Resolution};
use std::fs;
use std::path::Path;

// Tests marked `#[ignore]` need ffmpeg and ffprobe on PATH; run them with
// `cargo test -p recam-capture -- --ignored`.

/// Encode `n` flat frames whose brightness steps with the frame index.
fn write_clip(path: &Path, n: usize, resolution: Resolution, fps: f64) {
    let mut encoder =
        FfmpegEncoder::create(path, resolution, fps, &EncoderConfig::default()).unwrap();
    for i in 0..n {
        let level = (i * 8).min(255) as u8;
        let frame = RgbImage::from_pixel(resolution.width, resolution.height, Rgb([level; 3]));
        encoder.write_frame(&frame).unwrap();
    }
    encoder.finish().unwrap();
}

fn count_frames(path: &Path) -> (usize, Resolution) {
    let mut capture = FfmpegFileCapture::open(path).unwrap();
    let mut count = 0;
    while let Some(frame) = capture.next_frame().unwrap() {
        assert_eq!(frame.resolution(), capture.resolution());
        count += 1;
    }
    (count, capture.resolution())
}

#[test]
#[ignore = "requires ffmpeg and ffprobe on PATH"]
fn resamples_video_file_to_target_count() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("clip.mp4");
    let output = dir.path().join("clip_81.mp4");
    write_clip(&input, 30, Resolution::new(128, 72), 10.0);

    let resampler = FrameSequenceResampler::new(
        VideoResampleOptions::default()
            .with_resolution(Resolution::new(208, 120))
            .with_frame_rate(FrameRatePolicy::PreserveDuration),
    );
    let report = resampler.resample_file(&input, &output, 81).unwrap();
    assert_eq!(report.source_frames, 30);
    assert_eq!(report.target_frames, 81);
    assert!((report.fps - 27.0).abs() < 1e-9);

    let (count, resolution) = count_frames(&output);
    assert_eq!(count, 81);
    assert_eq!(resolution, Resolution::new(208, 120));

    // Only the committed output remains; the staging file is gone.
    let names: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names.len(), 2, "{names:?}");
}

#[test]
#[ignore = "requires ffmpeg and ffprobe on PATH"]
fn probe_reports_encoded_stream() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("clip.mp4");
    write_clip(&input, 12, Resolution::new(64, 48), 24.0);

    let info = probe_video(&input).unwrap();
    assert_eq!(info.resolution(), Resolution::new(64, 48));
    assert_eq!(info.codec, "h264");
    assert!((info.fps.unwrap() - 24.0).abs() < 1e-6);
}

#[test]
#[ignore = "requires ffmpeg and ffprobe on PATH"]
fn odd_frame_sizes_encode() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("odd.mp4");
    write_clip(&input, 5, Resolution::new(63, 47), 10.0);
    assert_eq!(count_frames(&input), (5, Resolution::new(63, 47)));
}

// Without ffprobe this still fails as a decode error, before any output is staged.
#[test]
fn unreadable_container_is_decode_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("broken.mp4");
    let output = dir.path().join("out.mp4");
    fs::write(&input, b"this is not a video").unwrap();

    let err = FrameSequenceResampler::default()
        .resample_file(&input, &output, 81)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
    assert!(!output.exists());
}

#[test]
fn missing_source_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = FrameSequenceResampler::default()
        .resample_file(&dir.path().join("nope.mp4"), &dir.path().join("out.mp4"), 81)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}
