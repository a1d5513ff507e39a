//! ffmpeg/ffprobe process wrappers.
//!
//! All transcoding goes through the system ffmpeg binary. Availability is
//! probed once per process and cached; every caller that depends on the tool
//! checks [`is_available`] first so users get one clear, actionable error
//! instead of a failed subprocess spawn mid-pipeline.

use crate::error::{ReferatError, Result};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

/// Timeout for the availability probe.
const PROBE_TOOL_TIMEOUT: Duration = Duration::from_secs(5);
/// Timeout for duration probing.
const PROBE_DURATION_TIMEOUT: Duration = Duration::from_secs(30);

static FFMPEG_AVAILABLE: OnceCell<bool> = OnceCell::const_new();

/// Check whether ffmpeg is available, caching the result per process.
pub async fn is_available() -> bool {
    *FFMPEG_AVAILABLE
        .get_or_init(|| async {
            let probe = tokio::time::timeout(
                PROBE_TOOL_TIMEOUT,
                Command::new("ffmpeg")
                    .arg("-version")
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .status(),
            )
            .await;

            match probe {
                Ok(Ok(status)) if status.success() => true,
                Ok(_) => {
                    warn!("ffmpeg is present but not working");
                    false
                }
                Err(_) => {
                    warn!("ffmpeg version probe timed out");
                    false
                }
            }
        })
        .await
}

/// Installation instructions included in tool-unavailable errors.
pub fn installation_instructions() -> &'static str {
    "FFmpeg is required for audio processing.\n\n\
     Please install FFmpeg:\n\
     - Linux: sudo apt install ffmpeg (Ubuntu/Debian) or your package manager\n\
     - macOS: brew install ffmpeg\n\
     - Windows: download from https://ffmpeg.org/download.html or 'choco install ffmpeg'\n\n\
     Verify with: ffmpeg -version, then try again."
}

/// Probe the duration of an audio file in seconds using ffprobe.
pub async fn probe_duration(path: &Path) -> Result<f64> {
    let result = tokio::time::timeout(
        PROBE_DURATION_TIMEOUT,
        Command::new("ffprobe")
            .arg("-v").arg("error")
            .arg("-show_entries").arg("format=duration")
            .arg("-of").arg("default=noprint_wrappers=1:nokey=1")
            .arg(path)
            .output(),
    )
    .await
    .map_err(|_| ReferatError::ToolFailed("ffprobe timed out".to_string()))?;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ReferatError::ToolNotFound("ffprobe".to_string()));
        }
        Err(e) => {
            return Err(ReferatError::ToolFailed(format!("ffprobe failed: {e}")));
        }
    };

    if !output.status.success() {
        return Err(ReferatError::ToolFailed(
            "ffprobe returned an error".to_string(),
        ));
    }

    String::from_utf8_lossy(&output.stdout)
        .trim()
        .parse::<f64>()
        .map_err(|_| ReferatError::ToolFailed("Could not determine audio duration".to_string()))
}

/// Transcode an (optionally trimmed) input to MP3.
///
/// Fixed codec and channel layout: libmp3lame, stereo. `start`/`length` trim
/// to `[start, start + length)` when given.
pub async fn transcode(
    input: &Path,
    output: &Path,
    start: Option<f64>,
    length: Option<f64>,
    bitrate_kbps: u32,
    sample_rate: u32,
    timeout: Duration,
) -> Result<()> {
    let mut cmd = Command::new("ffmpeg");
    cmd.arg("-i").arg(input);
    if let Some(start) = start {
        cmd.arg("-ss").arg(format!("{:.3}", start));
    }
    if let Some(length) = length {
        cmd.arg("-t").arg(format!("{:.3}", length));
    }
    cmd.arg("-acodec").arg("libmp3lame")
        .arg("-ab").arg(format!("{}k", bitrate_kbps))
        .arg("-ar").arg(sample_rate.to_string())
        .arg("-ac").arg("2")
        .arg("-y")
        .arg("-loglevel").arg("error")
        .arg(output);

    run_ffmpeg(cmd, timeout).await
}

/// Extract a time range using stream copy (fast, no re-encode).
pub async fn stream_copy(
    input: &Path,
    output: &Path,
    start: f64,
    length: f64,
    timeout: Duration,
) -> Result<()> {
    let mut cmd = Command::new("ffmpeg");
    cmd.arg("-i").arg(input)
        .arg("-ss").arg(format!("{:.3}", start))
        .arg("-t").arg(format!("{:.3}", length))
        .arg("-acodec").arg("copy")
        .arg("-y")
        .arg("-loglevel").arg("error")
        .arg(output);

    run_ffmpeg(cmd, timeout).await
}

async fn run_ffmpeg(mut cmd: Command, timeout: Duration) -> Result<()> {
    debug!("Running: {:?}", cmd.as_std());

    let result = tokio::time::timeout(
        timeout,
        cmd.stdout(Stdio::null()).stderr(Stdio::piped()).output(),
    )
    .await
    .map_err(|_| ReferatError::ToolFailed("ffmpeg timed out".to_string()))?;

    match result {
        Ok(out) if out.status.success() => Ok(()),
        Ok(out) => {
            let stderr = String::from_utf8_lossy(&out.stderr);
            Err(ReferatError::ToolFailed(format!(
                "ffmpeg failed: {}",
                stderr.trim()
            )))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ReferatError::ToolNotFound("ffmpeg".to_string()))
        }
        Err(e) => Err(ReferatError::ToolFailed(format!("ffmpeg error: {e}"))),
    }
}
