use std::path::{Path, PathBuf};

use anyhow::Context as _;
use tracing::{debug, info, warn};

use crate::animate::{AnimationSpec, assemble_animation, is_ffmpeg_on_path};
use crate::config::RegattaConfig;
use crate::error::RegattaResult;
use crate::layout::{LayoutParams, layout};
use crate::progress::DayRecord;
use crate::render::{LaneEntry, render_frame, write_png};
use crate::shape::BoatShape;

pub const FRAME_STEM: &str = "regatta";
pub const FRAME_PATTERN: &str = "regatta_%03d.png";

#[derive(Clone, Debug)]
pub struct SequenceSummary {
    pub frames: Vec<PathBuf>,
    pub animation: Option<PathBuf>,
}

/// Frame file for a day: zero-padded day-of-year index, so re-runs overwrite
/// the same files.
pub fn frame_path(out_dir: &Path, day_of_year: u32) -> PathBuf {
    out_dir.join(format!("{FRAME_STEM}_{day_of_year:03}.png"))
}

pub fn lane_entries(
    shape: &BoatShape,
    rec: &DayRecord,
    config: &RegattaConfig,
) -> Vec<LaneEntry> {
    // Bottom to top: first participant, second participant, pace boat. Each
    // lane gets its own copy of the glyph.
    let progress = [rec.first, rec.second, rec.pace];
    progress
        .into_iter()
        .zip(&config.lane_colors)
        .enumerate()
        .map(|(lane, (p, color))| LaneEntry {
            shape: shape.clone(),
            lane,
            progress: p,
            color: *color,
        })
        .collect()
}

pub fn day_title(rec: &DayRecord, config: &RegattaConfig) -> String {
    format!("{:.1} {} so far", rec.total_miles(), config.title)
}

/// Render one frame per record into `out_dir`, then optionally assemble the
/// sequence into an MP4.
///
/// `animation: None` skips assembly entirely. With `Some(path)`, a missing
/// ffmpeg downgrades to a single warning and the run still succeeds; an
/// ffmpeg failure is fatal. Any frame failure aborts the run (frames already
/// written stay on disk).
pub fn run_sequence(
    records: &[DayRecord],
    shape: &BoatShape,
    config: &RegattaConfig,
    out_dir: &Path,
    animation: Option<&Path>,
) -> RegattaResult<SequenceSummary> {
    run_sequence_with_ffmpeg_check(records, shape, config, out_dir, animation, is_ffmpeg_on_path)
}

/// [`run_sequence`] with the ffmpeg availability check injected, so the
/// tool-absent degradation path stays reachable without touching PATH.
pub fn run_sequence_with_ffmpeg_check(
    records: &[DayRecord],
    shape: &BoatShape,
    config: &RegattaConfig,
    out_dir: &Path,
    animation: Option<&Path>,
    ffmpeg_available: impl FnOnce() -> bool,
) -> RegattaResult<SequenceSummary> {
    config.validate()?;

    // The even-canvas rule only matters when something will actually be
    // encoded; without ffmpeg the run degrades to frames plus a warning, so
    // an odd canvas must not abort it.
    let ffmpeg_ok = animation.is_some() && ffmpeg_available();
    if ffmpeg_ok {
        AnimationSpec::check_even_canvas(config.canvas.width, config.canvas.height)?;
    }

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("create output directory '{}'", out_dir.display()))?;

    let params: LayoutParams = layout(
        config.course_length,
        config.boat_width,
        shape.width,
        shape.height,
    )?;

    info!(
        days = records.len(),
        out_dir = %out_dir.display(),
        "rendering frame sequence"
    );

    let mut frames = Vec::with_capacity(records.len());
    for rec in records {
        let entries = lane_entries(shape, rec, config);
        let frame = render_frame(
            &params,
            &entries,
            &day_title(rec, config),
            &rec.date.to_string(),
            config.canvas,
            config.buoys_per_line,
        )?;

        let path = frame_path(out_dir, rec.day_of_year);
        write_png(&frame, &path)?;
        debug!(date = %rec.date, path = %path.display(), "wrote frame");
        frames.push(path);
    }

    let mut assembled = None;
    if let Some(out_path) = animation {
        if ffmpeg_ok {
            let first_day = records.first().map(|r| r.day_of_year).unwrap_or(1);
            let spec = AnimationSpec {
                frames_dir: out_dir.to_path_buf(),
                pattern: FRAME_PATTERN.to_string(),
                start_number: first_day,
                fps: config.fps,
                out_path: out_path.to_path_buf(),
                overwrite: true,
            };
            assemble_animation(&spec)?;
            info!(out = %out_path.display(), "assembled animation");
            assembled = Some(out_path.to_path_buf());
        } else {
            warn!("ffmpeg not found on PATH; skipping animation assembly");
        }
    }

    Ok(SequenceSummary {
        frames,
        animation: assembled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn frame_paths_are_zero_padded_day_of_year() {
        let dir = Path::new("out");
        assert_eq!(frame_path(dir, 1), dir.join("regatta_001.png"));
        assert_eq!(frame_path(dir, 42), dir.join("regatta_042.png"));
        assert_eq!(frame_path(dir, 365), dir.join("regatta_365.png"));
    }

    #[test]
    fn lane_entries_follow_config_order() {
        let config = RegattaConfig::default();
        let shape = BoatShape {
            width: 500.0,
            height: 100.0,
            paths: vec![kurbo::BezPath::new()],
        };
        let rec = DayRecord {
            date: NaiveDate::from_ymd_opt(2018, 1, 5).unwrap(),
            day_of_year: 5,
            pace: 13.8,
            first: 3.0,
            second: 7.5,
        };

        let entries = lane_entries(&shape, &rec, &config);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].lane, 0);
        assert_eq!(entries[0].progress, 3.0);
        assert_eq!(entries[1].progress, 7.5);
        assert_eq!(entries[2].progress, 13.8);
        assert_eq!(entries[2].color, config.lane_colors[2]);
    }

    #[test]
    fn day_title_includes_running_total() {
        let config = RegattaConfig::default();
        let rec = DayRecord {
            date: NaiveDate::from_ymd_opt(2018, 1, 5).unwrap(),
            day_of_year: 5,
            pace: 13.8,
            first: 3.0,
            second: 7.5,
        };
        assert_eq!(day_title(&rec, &config), "10.5 Jolly miles so far");
    }
}
