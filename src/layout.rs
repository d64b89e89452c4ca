use kurbo::Affine;

use crate::error::{RegattaError, RegattaResult};

/// Number of lanes in a frame: two participants plus the pace boat.
pub const LANE_COUNT: usize = 3;

/// Placement parameters for one course/shape combination.
///
/// All quantities are in course units ("miles"); nothing here knows about
/// pixels. The world-to-device mapping is the renderer's job and composes
/// after [`LayoutParams::placement`].
#[derive(Clone, Debug)]
pub struct LayoutParams {
    pub course_length: f64,
    /// Margin on each side of the course, equal to the drawn boat width.
    pub margin: f64,
    pub scale_factor: f64,
    pub shape_height: f64,
    pub plot_width: f64,
    pub plot_height: f64,
    pub lane_height: f64,
    pub lane_padding: f64,
    pub lane_centers: [f64; LANE_COUNT],
}

/// Compute lane layout for a course and a boat shape's native size.
///
/// `native_width`/`native_height` are the shape's intrinsic pixel dimensions
/// as imported; the drawn boat is `margin` course units wide, which fixes the
/// uniform scale factor.
pub fn layout(
    course_length: f64,
    margin: f64,
    native_width: f64,
    native_height: f64,
) -> RegattaResult<LayoutParams> {
    if !(course_length > 0.0) || !(margin > 0.0) {
        return Err(RegattaError::validation(
            "course_length and margin must be positive and finite",
        ));
    }
    if !(native_width > 0.0) || !(native_height > 0.0) {
        return Err(RegattaError::validation(
            "shape native width/height must be positive",
        ));
    }

    let scale_factor = margin / native_width;
    let shape_height = native_height * scale_factor;
    let plot_width = course_length + 2.0 * margin;
    let aspect_ratio = native_height / native_width;
    let plot_height = aspect_ratio * plot_width;
    let lane_height = plot_height / LANE_COUNT as f64;
    let lane_padding = (lane_height - shape_height) / 2.0;

    // Reduces to margin <= course_length, but stating it in lane terms keeps
    // the failure message honest.
    if lane_padding < 0.0 {
        return Err(RegattaError::validation(format!(
            "boat does not fit in a lane: shape height {shape_height:.3} exceeds lane height {lane_height:.3}"
        )));
    }

    let mut lane_centers = [0.0; LANE_COUNT];
    for (i, c) in lane_centers.iter_mut().enumerate() {
        *c = lane_padding + i as f64 * lane_height;
    }

    Ok(LayoutParams {
        course_length,
        margin,
        scale_factor,
        shape_height,
        plot_width,
        plot_height,
        lane_height,
        lane_padding,
        lane_centers,
    })
}

impl LayoutParams {
    /// Draw-time transform for an entity at `progress` in `lane`.
    ///
    /// Scale is applied first, then the translate, so the translate is in
    /// post-scale (course) space. Progress is deliberately not clamped to
    /// `[0, course_length]`; a boat past the finish draws past the finish.
    pub fn placement(&self, progress: f64, lane: usize) -> RegattaResult<Affine> {
        let y = *self
            .lane_centers
            .get(lane)
            .ok_or_else(|| RegattaError::validation(format!("lane index {lane} out of range")))?;
        Ok(Affine::translate((-self.margin + progress, y)) * Affine::scale(self.scale_factor))
    }

    /// Evenly spaced buoy x-positions spanning the visible range, including
    /// both endpoints.
    pub fn buoy_positions(&self, count: u32) -> Vec<f64> {
        let n = count.max(2) as usize;
        let start = -self.margin;
        let end = self.plot_width - self.margin;
        let step = (end - start) / (n - 1) as f64;
        (0..n).map(|i| start + i as f64 * step).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    const EPS: f64 = 1e-9;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < EPS, "{a} != {b}");
    }

    #[test]
    fn reference_course_numbers() {
        let lp = layout(1009.0, 250.0, 500.0, 100.0).unwrap();
        assert_close(lp.scale_factor, 0.5);
        assert_close(lp.shape_height, 50.0);
        assert_close(lp.plot_width, 1509.0);
        assert_close(lp.plot_height, 301.8);
        assert_close(lp.lane_height, 100.6);
        assert_close(lp.lane_padding, 25.3);
        assert_close(lp.lane_centers[0], 25.3);
        assert_close(lp.lane_centers[1], 125.9);
        assert_close(lp.lane_centers[2], 226.5);
    }

    #[test]
    fn plot_dimensions_hold_for_any_positive_aspect() {
        for (c, m, w, h) in [
            (1009.0, 250.0, 500.0, 100.0),
            (100.0, 10.0, 64.0, 64.0),
            (5000.0, 3.0, 1.0, 9.0),
        ] {
            let lp = layout(c, m, w, h).unwrap();
            assert_close(lp.plot_width, c + 2.0 * m);
            assert_close(lp.plot_height, (h / w) * lp.plot_width);
        }
    }

    #[test]
    fn lanes_tile_the_plot_height() {
        let lp = layout(1009.0, 250.0, 500.0, 100.0).unwrap();
        let total: f64 = (0..LANE_COUNT)
            .map(|_| lp.lane_padding * 2.0 + lp.shape_height)
            .sum();
        assert_close(total, lp.plot_height);
    }

    #[test]
    fn placement_is_translation_linear() {
        let lp = layout(1009.0, 250.0, 500.0, 100.0).unwrap();
        let origin = Point::new(0.0, 0.0);
        for delta in [0.5, 7.0, 1009.0, -3.25] {
            let a = lp.placement(100.0, 1).unwrap() * origin;
            let b = lp.placement(100.0 + delta, 1).unwrap() * origin;
            // Translate is in post-scale space, so the shift is exactly delta.
            assert_close(b.x - a.x, delta);
            assert_close(b.y, a.y);
        }
    }

    #[test]
    fn placement_scales_before_translating() {
        let lp = layout(1009.0, 250.0, 500.0, 100.0).unwrap();
        let p = lp.placement(0.0, 0).unwrap() * Point::new(500.0, 0.0);
        // Native right edge lands scale_factor * 500 = 250 right of the
        // translated origin, i.e. exactly at the start line.
        assert_close(p.x, 0.0);
    }

    #[test]
    fn progress_is_not_clamped() {
        let lp = layout(1009.0, 250.0, 500.0, 100.0).unwrap();
        let past = lp.placement(2000.0, 2).unwrap() * Point::new(0.0, 0.0);
        assert!(past.x > lp.course_length);
        let before = lp.placement(-50.0, 0).unwrap() * Point::new(0.0, 0.0);
        assert!(before.x < -lp.margin + 1.0);
    }

    #[test]
    fn oversized_boat_is_rejected() {
        // margin > course_length makes the shape taller than a lane.
        let err = layout(100.0, 250.0, 500.0, 100.0).unwrap_err();
        assert!(err.to_string().contains("does not fit"));
    }

    #[test]
    fn buoys_span_the_visible_range() {
        let lp = layout(1009.0, 250.0, 500.0, 100.0).unwrap();
        let xs = lp.buoy_positions(37);
        assert_eq!(xs.len(), 37);
        assert_close(xs[0], -250.0);
        assert_close(*xs.last().unwrap(), 1259.0);
    }
}
