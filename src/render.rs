use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use kurbo::{Affine, Circle, Point, Shape as _};

use crate::config::Canvas;
use crate::error::{RegattaError, RegattaResult};
use crate::layout::LayoutParams;
use crate::shape::BoatShape;

const BACKGROUND_RGBA: [u8; 4] = [255, 255, 255, 255];
const START_LINE_RGBA: [u8; 4] = [46, 139, 87, 255]; // seagreen
const FINISH_LINE_RGBA: [u8; 4] = [47, 79, 79, 255]; // darkslategrey
const BUOY_RGBA: [u8; 4] = [255, 165, 0, 255]; // orange

const LINE_HALF_WIDTH_PX: f64 = 2.5;
const BUOY_RADIUS_PX: f64 = 3.0;
const TITLE_BAND_PX: u32 = 40;
/// Visible world y range is [-Y_OVERSCAN, plot_height + Y_OVERSCAN].
const Y_OVERSCAN: f64 = 10.0;

#[derive(Clone, Debug)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

/// One boat to draw: its own copy of the glyph, a lane, a progress value and
/// a fill color.
#[derive(Clone, Debug)]
pub struct LaneEntry {
    pub shape: BoatShape,
    pub lane: usize,
    pub progress: f64,
    pub color: [u8; 4],
}

/// Map course coordinates (y up) to pixel coordinates (y down).
///
/// x spans `[-margin, plot_width - margin]`, y spans the overscanned plot
/// height. This is the surface transform that composes after
/// [`LayoutParams::placement`].
pub fn world_to_device(layout: &LayoutParams, canvas: Canvas) -> Affine {
    let sx = f64::from(canvas.width) / layout.plot_width;
    let sy = f64::from(canvas.height) / (layout.plot_height + 2.0 * Y_OVERSCAN);
    Affine::new([
        sx,
        0.0,
        0.0,
        -sy,
        layout.margin * sx,
        (layout.plot_height + Y_OVERSCAN) * sy,
    ])
}

/// Render one day's frame: course boundaries, buoy lines, boats, title band.
pub fn render_frame(
    layout: &LayoutParams,
    entries: &[LaneEntry],
    title: &str,
    date_label: &str,
    canvas: Canvas,
    buoys_per_line: u32,
) -> RegattaResult<FrameRGBA> {
    let width_u16: u16 = canvas
        .width
        .try_into()
        .map_err(|_| RegattaError::render("canvas width exceeds u16"))?;
    let height_u16: u16 = canvas
        .height
        .try_into()
        .map_err(|_| RegattaError::render("canvas height exceeds u16"))?;

    let w2d = world_to_device(layout, canvas);
    let mut ctx = vello_cpu::RenderContext::new(width_u16, height_u16);
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

    // Background.
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    set_color(&mut ctx, BACKGROUND_RGBA);
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
        0.0,
        0.0,
        f64::from(canvas.width),
        f64::from(canvas.height),
    ));

    // Start and finish lines, drawn in device space so their width is stable
    // in pixels regardless of course scale.
    for (x_world, color) in [
        (0.0, START_LINE_RGBA),
        (layout.course_length, FINISH_LINE_RGBA),
    ] {
        let top = w2d * Point::new(x_world, layout.plot_height);
        let bottom = w2d * Point::new(x_world, 0.0);
        set_color(&mut ctx, color);
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            top.x - LINE_HALF_WIDTH_PX,
            top.y.min(bottom.y),
            top.x + LINE_HALF_WIDTH_PX,
            top.y.max(bottom.y),
        ));
    }

    // Buoys along the three lane boundaries plus the top edge.
    set_color(&mut ctx, BUOY_RGBA);
    let buoy_xs = layout.buoy_positions(buoys_per_line);
    for line in 0..=crate::layout::LANE_COUNT {
        let y_world = line as f64 * layout.lane_height;
        for &x_world in &buoy_xs {
            let c = w2d * Point::new(x_world, y_world);
            let dot = Circle::new(c, BUOY_RADIUS_PX).to_path(0.1);
            ctx.fill_path(&bezpath_to_cpu(&dot));
        }
    }

    // Boats. Placement scales then translates in course space; the device
    // transform composes last.
    for entry in entries {
        let transform = w2d * layout.placement(entry.progress, entry.lane)?;
        ctx.set_transform(affine_to_cpu(transform));
        set_color(&mut ctx, entry.color);
        for path in &entry.shape.paths {
            ctx.fill_path(&bezpath_to_cpu(path));
        }
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    }

    // Title band across the top.
    if canvas.height > TITLE_BAND_PX {
        let band = rasterize_title(title, date_label, canvas.width, TITLE_BAND_PX)?;
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(band);
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(canvas.width),
            f64::from(TITLE_BAND_PX),
        ));
    }

    let mut pixmap = vello_cpu::Pixmap::new(width_u16, height_u16);
    ctx.flush();
    ctx.render_to_pixmap(&mut pixmap);

    Ok(FrameRGBA {
        width: canvas.width,
        height: canvas.height,
        data: pixmap.data_as_u8_slice().to_vec(),
        premultiplied: true,
    })
}

/// Write a frame as a PNG. The parent directory must already exist; the
/// sequence driver is responsible for creating it.
pub fn write_png(frame: &FrameRGBA, path: &Path) -> RegattaResult<()> {
    image::save_buffer_with_format(
        path,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}

fn set_color(ctx: &mut vello_cpu::RenderContext, rgba: [u8; 4]) {
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
        rgba[0], rgba[1], rgba[2], rgba[3],
    ));
}

/// Lay out the title band as a tiny SVG text document and rasterize it with
/// resvg and system fonts: running-total title centered, date on the right.
fn rasterize_title(
    title: &str,
    date_label: &str,
    width_px: u32,
    band_px: u32,
) -> RegattaResult<vello_cpu::Image> {
    let svg = format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}">"#,
            r#"<text x="{mid}" y="{base}" text-anchor="middle" "#,
            r#"font-family="sans-serif" font-size="22">{title}</text>"#,
            r#"<text x="{right}" y="{base}" text-anchor="end" "#,
            r#"font-family="sans-serif" font-size="16">{date}</text>"#,
            r#"</svg>"#
        ),
        w = width_px,
        h = band_px,
        mid = width_px / 2,
        right = width_px.saturating_sub(8),
        base = band_px.saturating_sub(12),
        title = xml_escape(title),
        date = xml_escape(date_label),
    );

    let mut options = usvg::Options::default();
    options.fontdb_mut().load_system_fonts();
    let tree = usvg::Tree::from_str(&svg, &options)
        .map_err(|e| RegattaError::render(format!("title svg did not parse: {e}")))?;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width_px, band_px)
        .ok_or_else(|| RegattaError::render("failed to allocate title pixmap"))?;
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::identity(),
        &mut pixmap.as_mut(),
    );

    let cpu_pixmap = pixmap_from_premul_rgba8(pixmap.data(), width_px, band_px)?;
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(cpu_pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &kurbo::BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn pixmap_from_premul_rgba8(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> RegattaResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| RegattaError::render("title width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| RegattaError::render("title height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(RegattaError::render("title byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}
