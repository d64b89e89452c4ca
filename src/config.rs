use std::path::Path;

use anyhow::Context as _;

use crate::error::{RegattaError, RegattaResult};
use crate::layout::LANE_COUNT;

/// Output raster size in pixels.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RegattaConfig {
    /// Course length in miles.
    pub course_length: f64,
    /// Drawn boat width in course units; also the clipping margin on each
    /// side of the course.
    pub boat_width: f64,
    /// Buoys per horizontal marker line.
    pub buoys_per_line: u32,
    pub canvas: Canvas,
    /// Animation frame rate (frames per second, one frame per day).
    pub fps: u32,
    /// Title stem; the renderer prefixes the running total, e.g.
    /// "123.4 Jolly miles so far".
    pub title: String,
    /// RGBA boat fills, lane order bottom to top: first participant, second
    /// participant, pace boat.
    pub lane_colors: [[u8; 4]; LANE_COUNT],
}

impl Default for RegattaConfig {
    fn default() -> Self {
        Self {
            course_length: 1009.0,
            boat_width: 250.0,
            buoys_per_line: 37,
            canvas: Canvas {
                width: 1500,
                height: 500,
            },
            fps: 10,
            title: "Jolly miles".to_string(),
            lane_colors: [
                [220, 20, 60, 255], // crimson
                [0, 139, 139, 255], // darkcyan
                [47, 79, 79, 255],  // darkslategrey
            ],
        }
    }
}

impl RegattaConfig {
    pub fn validate(&self) -> RegattaResult<()> {
        if !(self.course_length > 0.0) {
            return Err(RegattaError::validation("course_length must be > 0"));
        }
        if !(self.boat_width > 0.0) {
            return Err(RegattaError::validation("boat_width must be > 0"));
        }
        if self.boat_width > self.course_length {
            return Err(RegattaError::validation(
                "boat_width must not exceed course_length (boat must fit in a lane)",
            ));
        }
        if self.buoys_per_line < 2 {
            return Err(RegattaError::validation("buoys_per_line must be >= 2"));
        }
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(RegattaError::validation("canvas width/height must be > 0"));
        }
        if self.fps == 0 {
            return Err(RegattaError::validation("fps must be > 0"));
        }
        Ok(())
    }

    pub fn load(path: &Path) -> RegattaResult<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("open config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_reader(std::io::BufReader::new(file))
            .map_err(|e| RegattaError::parse(format!("invalid config json: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }
}
