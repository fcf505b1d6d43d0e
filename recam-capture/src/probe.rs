//! FFprobe video information.

use crate::command::locate_tool;
use crate::source::CaptureError;
use recam_data::Resolution;
use serde::Deserialize;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

/// Video stream information.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Declared frame rate, if the container has one
    pub fps: Option<f64>,
    /// Video codec
    pub codec: String,
    /// Declared frame count; containers often omit or misreport it
    pub frame_count: Option<u64>,
    /// Duration in seconds
    pub duration: Option<f64>,
}

impl VideoInfo {
    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    nb_frames: Option<String>,
    duration: Option<String>,
}

/// Probe a video file for stream information.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn probe_video(path: &Path) -> Result<VideoInfo, CaptureError> {
    if !path.exists() {
        return Err(CaptureError::SourceNotFound(path.to_path_buf()));
    }

    let ffprobe = locate_tool("ffprobe")?;
    let output = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()?;

    if !output.status.success() {
        return Err(CaptureError::OpenFailed(format!(
            "{}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let info = parse_probe_output(&output.stdout)
        .map_err(|reason| CaptureError::OpenFailed(format!("{}: {reason}", path.display())))?;
    debug!("Probed {}: {:?}", path.display(), info);
    Ok(info)
}

/// Interpret ffprobe's JSON.
pub fn parse_probe_output(stdout: &[u8]) -> Result<VideoInfo, String> {
    let probe: FfprobeOutput =
        serde_json::from_slice(stdout).map_err(|e| format!("unreadable ffprobe output: {e}"))?;

    let stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref().is_none_or(|t| t == "video"))
        .ok_or_else(|| "no video stream found".to_string())?;

    let (width, height) = match (stream.width, stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => return Err("video stream has no frame size".to_string()),
    };

    let fps = stream
        .avg_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .or_else(|| stream.r_frame_rate.as_deref().and_then(parse_frame_rate));

    let duration = stream
        .duration
        .as_deref()
        .or(probe.format.as_ref().and_then(|f| f.duration.as_deref()))
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0);

    Ok(VideoInfo {
        width,
        height,
        fps,
        codec: stream.codec_name.clone().unwrap_or_default(),
        frame_count: stream
            .nb_frames
            .as_deref()
            .and_then(|n| n.parse::<u64>().ok())
            .filter(|n| *n > 0),
        duration,
    })
}

/// Parse an ffprobe rate such as `30000/1001` or `25`. Zero or undefined rates yield `None`.
pub fn parse_frame_rate(rate: &str) -> Option<f64> {
    let fps = match rate.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => rate.trim().parse().ok()?,
    };
    (fps.is_finite() && fps > 0.0).then_some(fps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame_rate() {
        assert_eq!(parse_frame_rate("30/1"), Some(30.0));
        assert_eq!(parse_frame_rate("25"), Some(25.0));
        assert!((parse_frame_rate("30000/1001").unwrap() - 29.97).abs() < 0.001);
        assert_eq!(parse_frame_rate("0/0"), None);
        assert_eq!(parse_frame_rate("abc"), None);
    }

    #[test]
    fn test_parse_probe_output() {
        let json = br#"{
            "streams": [{
                "codec_type": "video",
                "codec_name": "h264",
                "width": 1280,
                "height": 720,
                "r_frame_rate": "30/1",
                "avg_frame_rate": "0/0",
                "nb_frames": "90"
            }],
            "format": { "duration": "3.000000" }
        }"#;
        let info = parse_probe_output(json).unwrap();
        assert_eq!(info.resolution(), Resolution::new(1280, 720));
        assert_eq!(info.fps, Some(30.0));
        assert_eq!(info.codec, "h264");
        assert_eq!(info.frame_count, Some(90));
        assert_eq!(info.duration, Some(3.0));
    }

    #[test]
    fn test_parse_probe_output_without_video() {
        assert!(parse_probe_output(br#"{ "streams": [] }"#).is_err());
        assert!(parse_probe_output(br#"{ "streams": [{ "codec_type": "video" }] }"#).is_err());
        assert!(parse_probe_output(b"not json").is_err());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = probe_video(Path::new("/definitely/not/here.mp4")).unwrap_err();
        assert_eq!(err.kind(), recam_data::ErrorKind::Io);
    }
}
