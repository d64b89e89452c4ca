#![forbid(unsafe_code)]

pub mod animate;
pub mod config;
pub mod error;
pub mod layout;
pub mod progress;
pub mod render;
pub mod sequence;
pub mod shape;

pub use animate::{AnimationSpec, assemble_animation, is_ffmpeg_on_path};
pub use config::{Canvas, RegattaConfig};
pub use error::{RegattaError, RegattaResult};
pub use layout::{LANE_COUNT, LayoutParams, layout};
pub use progress::{DayRecord, ProgressRow, build_day_records, load_progress_csv, pace_for_date};
pub use render::{FrameRGBA, LaneEntry, render_frame, world_to_device, write_png};
pub use sequence::{SequenceSummary, frame_path, run_sequence, run_sequence_with_ffmpeg_check};
pub use shape::{BoatShape, import_boat_svg, load_boat_svg};
