use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{RegattaError, RegattaResult};

/// How to assemble the written frame sequence into one MP4.
///
/// Frames are consumed from disk via ffmpeg's image2 demuxer rather than
/// piped, so the PNG sequence stays on disk as the primary output and the
/// animation is a pure post-step.
#[derive(Clone, Debug)]
pub struct AnimationSpec {
    /// Directory holding the frame PNGs.
    pub frames_dir: PathBuf,
    /// printf-style frame file pattern, e.g. `regatta_%03d.png`.
    pub pattern: String,
    /// Number of the first frame in the sequence (day of year of the first
    /// record).
    pub start_number: u32,
    pub fps: u32,
    pub out_path: PathBuf,
    pub overwrite: bool,
}

impl AnimationSpec {
    pub fn validate(&self) -> RegattaResult<()> {
        if self.fps == 0 {
            return Err(RegattaError::validation("animation fps must be non-zero"));
        }
        if self.pattern.is_empty() || !self.pattern.contains('%') {
            return Err(RegattaError::validation(
                "frame pattern must contain a printf-style index placeholder",
            ));
        }
        Ok(())
    }

    /// yuv420p output requires even pixel dimensions; checked up front so the
    /// run fails before a full day-by-day render, not after.
    pub fn check_even_canvas(width: u32, height: u32) -> RegattaResult<()> {
        if !width.is_multiple_of(2) || !height.is_multiple_of(2) {
            return Err(RegattaError::validation(
                "canvas width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        Ok(())
    }
}

pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn ensure_parent_dir(path: &Path) -> RegattaResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Run the system `ffmpeg` over the frame sequence. Blocking, no timeout; a
/// non-zero exit is fatal.
pub fn assemble_animation(spec: &AnimationSpec) -> RegattaResult<()> {
    spec.validate()?;
    ensure_parent_dir(&spec.out_path)?;

    if !spec.overwrite && spec.out_path.exists() {
        return Err(RegattaError::validation(format!(
            "output file '{}' already exists",
            spec.out_path.display()
        )));
    }

    let input = spec.frames_dir.join(&spec.pattern);

    // We intentionally shell out to the system `ffmpeg` binary rather than
    // linking FFmpeg, to avoid native dev header/lib requirements.
    let mut cmd = Command::new("ffmpeg");
    cmd.stdin(Stdio::null()).stdout(Stdio::null());
    cmd.arg(if spec.overwrite { "-y" } else { "-n" });
    cmd.args(["-loglevel", "error"])
        .args(["-framerate", &spec.fps.to_string()])
        .args(["-start_number", &spec.start_number.to_string()])
        .arg("-i")
        .arg(&input)
        .args([
            "-an",
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ])
        .arg(&spec.out_path);

    let output = cmd.output().map_err(|e| {
        RegattaError::render(format!(
            "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
        ))
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(RegattaError::render(format!(
            "ffmpeg exited with status {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    Ok(())
}
