//! Episode clip extraction with a deterministic re-encode.

use crate::{Error, Result};
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Command;

/// One clip to cut out of a source video.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub start_sec: f64,
    pub end_sec: f64,
    pub fps: f64,
}

impl ClipRequest {
    /// Clip length in seconds, never negative.
    pub fn duration(&self) -> f64 {
        (self.end_sec - self.start_sec).max(0.0)
    }
}

/// Encoder settings shared by every clip of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipSettings {
    pub ffmpeg_bin: String,
    pub video_codec: String,
    pub preset: String,
    pub crf: u8,
    pub pix_fmt: String,
}

impl Default for ClipSettings {
    fn default() -> Self {
        Self {
            ffmpeg_bin: "ffmpeg".to_string(),
            video_codec: "libx264".to_string(),
            preset: "fast".to_string(),
            crf: 18,
            pix_fmt: "yuv420p".to_string(),
        }
    }
}

/// Something that can turn a [`ClipRequest`] into an output file.
pub trait Encoder {
    fn encode(&self, request: &ClipRequest) -> Result<()>;
}

/// Encoder that shells out to the ffmpeg CLI.
#[derive(Debug, Clone, Default)]
pub struct FfmpegEncoder {
    settings: ClipSettings,
}

impl FfmpegEncoder {
    pub fn new(settings: ClipSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ClipSettings {
        &self.settings
    }

    /// Arguments passed to ffmpeg for `request`, without the binary.
    ///
    /// Audio is dropped and the frame rate forced to the episode's fps.
    pub fn build_args(&self, request: &ClipRequest) -> Result<Vec<OsString>> {
        let duration = request.duration();
        if duration <= 0.0 {
            return Err(Error::InvalidDuration {
                start: request.start_sec,
                end: request.end_sec,
            });
        }

        let s = &self.settings;
        let mut args: Vec<OsString> = Vec::with_capacity(22);
        args.extend(["-hide_banner", "-loglevel", "error", "-y", "-ss"].map(OsString::from));
        args.push(format!("{:.6}", request.start_sec).into());
        args.push("-i".into());
        args.push(request.input.clone().into_os_string());
        args.push("-t".into());
        args.push(format!("{:.6}", duration).into());
        args.push("-an".into());
        args.push("-r".into());
        args.push(format!("{:.6}", request.fps).into());
        for (flag, value) in [
            ("-pix_fmt", s.pix_fmt.clone()),
            ("-c:v", s.video_codec.clone()),
            ("-preset", s.preset.clone()),
            ("-crf", s.crf.to_string()),
        ] {
            args.push(flag.into());
            args.push(value.into());
        }
        args.push(request.output.clone().into_os_string());

        Ok(args)
    }
}

impl Encoder for FfmpegEncoder {
    fn encode(&self, request: &ClipRequest) -> Result<()> {
        let args = self.build_args(request)?;
        if let Some(parent) = request.output.parent() {
            std::fs::create_dir_all(parent)?;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "Clipping {:?} [{:.3}s, {:.3}s) -> {:?}",
            request.input,
            request.start_sec,
            request.end_sec,
            request.output
        );

        let bin = &self.settings.ffmpeg_bin;
        let result = Command::new(bin).args(&args).output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::tool_not_found(bin.as_str())
            } else {
                Error::Io(e)
            }
        })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let message = if stderr.trim().is_empty() {
                format!("exited with {}", result.status)
            } else {
                stderr.trim().to_string()
            };
            return Err(Error::tool_failed(bin.as_str(), message));
        }

        Ok(())
    }
}
