//! FFmpeg command builder and process helpers.

use crate::source::CaptureError;
use recam_data::Resolution;
use std::ffi::OsString;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::thread::JoinHandle;
use tracing::debug;

/// Raw pipe endpoint understood by ffmpeg for stdin.
pub const PIPE_IN: &str = "pipe:0";
/// Raw pipe endpoint understood by ffmpeg for stdout.
pub const PIPE_OUT: &str = "pipe:1";

/// ffmpeg's own log level; its stderr is only surfaced on failure.
const LOG_LEVEL: &str = "error";

/// Locate an ffmpeg tool (`ffmpeg`, `ffprobe`) on `PATH`.
pub fn locate_tool(name: &'static str) -> Result<PathBuf, CaptureError> {
    which::which(name).map_err(|_| CaptureError::ToolNotFound(name))
}

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input file path or pipe
    input: OsString,
    /// Output file path or pipe
    output: OsString,
    /// Input arguments (before -i)
    input_args: Vec<OsString>,
    /// Output arguments (after -i)
    output_args: Vec<OsString>,
    /// Whether to overwrite output
    overwrite: bool,
}

impl FfmpegCommand {
    pub fn new(input: impl Into<OsString>, output: impl Into<OsString>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            input_args: Vec::new(),
            output_args: Vec::new(),
            overwrite: true,
        }
    }

    /// Add an input argument (before -i).
    pub fn input_arg(mut self, arg: impl Into<OsString>) -> Self {
        self.input_args.push(arg.into());
        self
    }

    /// Add input arguments.
    pub fn input_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.input_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Add an output argument (after -i).
    pub fn output_arg(mut self, arg: impl Into<OsString>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Describe a raw rgb24 input stream of the given size and rate.
    pub fn raw_rgb_input(self, resolution: Resolution, fps: f64) -> Self {
        self.input_args([
            "-f".to_string(),
            "rawvideo".to_string(),
            "-pix_fmt".to_string(),
            "rgb24".to_string(),
            "-s".to_string(),
            resolution.to_string(),
            "-r".to_string(),
            format_rate(fps),
        ])
    }

    /// Emit raw rgb24 frames, exactly as decoded (no duplication or dropping).
    pub fn raw_rgb_output(self) -> Self {
        self.output_args([
            "-map", "0:v:0", "-an", "-sn", "-vsync", "0", "-f", "rawvideo", "-pix_fmt", "rgb24",
        ])
    }

    /// Set video codec.
    pub fn video_codec(self, codec: impl Into<OsString>) -> Self {
        self.output_arg("-c:v").output_arg(codec)
    }

    /// Set CRF (quality).
    pub fn crf(self, crf: u8) -> Self {
        self.output_arg("-crf").output_arg(crf.to_string())
    }

    /// Set output pixel format.
    pub fn pixel_format(self, format: impl Into<OsString>) -> Self {
        self.output_arg("-pix_fmt").output_arg(format)
    }

    /// Force the output container format.
    pub fn format(self, format: impl Into<OsString>) -> Self {
        self.output_arg("-f").output_arg(format)
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();

        if self.overwrite {
            args.push("-y".into());
        }

        args.push("-nostdin".into());
        args.push("-v".into());
        args.push(LOG_LEVEL.into());

        args.extend(self.input_args.iter().cloned());
        args.push("-i".into());
        args.push(self.input.clone());

        args.extend(self.output_args.iter().cloned());
        args.push(self.output.clone());

        args
    }

    /// Spawn ffmpeg with the given stdin/stdout wiring. Stderr is always piped
    /// so failures can be reported; drain it with [`drain_stderr`].
    pub fn spawn(&self, stdin: Stdio, stdout: Stdio) -> Result<Child, CaptureError> {
        let ffmpeg = locate_tool("ffmpeg")?;
        let mut args = self.build_args();
        if self.input == PIPE_IN {
            // -nostdin would close the pipe we feed frames through.
            args.retain(|a| a != "-nostdin");
        }
        debug!("Running ffmpeg {:?}", args);

        Ok(Command::new(ffmpeg)
            .args(&args)
            .stdin(stdin)
            .stdout(stdout)
            .stderr(Stdio::piped())
            .spawn()?)
    }
}

/// Read a child's stderr on a background thread so a chatty process cannot
/// block on a full pipe while we are reading or writing frames.
pub fn drain_stderr(child: &mut Child) -> Option<JoinHandle<String>> {
    let mut stderr = child.stderr.take()?;
    Some(std::thread::spawn(move || {
        let mut text = String::new();
        let _ = stderr.read_to_string(&mut text);
        text
    }))
}

/// Collect drained stderr, trimmed.
pub fn join_stderr(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|text| text.trim().to_string())
        .unwrap_or_default()
}

fn format_rate(fps: f64) -> String {
    let formatted = format!("{fps:.6}");
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}
