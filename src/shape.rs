use std::path::Path;

use anyhow::Context as _;
use kurbo::BezPath;

use crate::error::{RegattaError, RegattaResult};

/// An imported boat glyph: native pixel size plus its drawable paths in
/// document order. Immutable once imported; the sequence driver hands each
/// lane its own clone so per-lane transforms can never alias.
#[derive(Clone, Debug)]
pub struct BoatShape {
    pub width: f64,
    pub height: f64,
    pub paths: Vec<BezPath>,
}

impl BoatShape {
    pub fn path_count(&self) -> usize {
        self.paths.len()
    }
}

/// Parse an SVG document into a [`BoatShape`].
///
/// The root element must declare integer `width`/`height` attributes with a
/// `px` unit suffix; every `<path>` element contributes one sub-path via its
/// `d` attribute.
pub fn import_boat_svg(text: &str) -> RegattaResult<BoatShape> {
    let doc = roxmltree::Document::parse(text)
        .map_err(|e| RegattaError::parse(format!("invalid svg document: {e}")))?;
    let root = doc.root_element();

    let width = px_attribute(&root, "width")?;
    let height = px_attribute(&root, "height")?;

    let mut paths = Vec::new();
    for node in doc.descendants() {
        if !node.is_element() || node.tag_name().name() != "path" {
            continue;
        }
        let d = node
            .attribute("d")
            .ok_or_else(|| RegattaError::parse("svg path element has no 'd' attribute"))?;
        let path = BezPath::from_svg(d.trim())
            .map_err(|e| RegattaError::parse(format!("invalid svg path data: {e}")))?;
        paths.push(path);
    }

    if paths.is_empty() {
        return Err(RegattaError::parse("svg contains no path elements"));
    }

    Ok(BoatShape {
        width: f64::from(width),
        height: f64::from(height),
        paths,
    })
}

pub fn load_boat_svg(path: &Path) -> RegattaResult<BoatShape> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read boat svg '{}'", path.display()))?;
    import_boat_svg(&text)
}

/// Parse a length attribute of the form `<integer>px`.
///
/// The original data pipeline sliced two characters off the attribute string;
/// this is the unit-aware replacement that rejects unknown units instead.
fn px_attribute(node: &roxmltree::Node<'_, '_>, name: &str) -> RegattaResult<u32> {
    let raw = node
        .attribute(name)
        .ok_or_else(|| RegattaError::parse(format!("svg root has no '{name}' attribute")))?;
    let raw = raw.trim();

    let digits_end = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(digits_end);

    if digits.is_empty() {
        return Err(RegattaError::parse(format!(
            "svg '{name}' is not an integer length: '{raw}'"
        )));
    }
    if unit != "px" {
        return Err(RegattaError::parse(format!(
            "svg '{name}' has unrecognized unit '{unit}' (expected 'px')"
        )));
    }

    let value: u32 = digits
        .parse()
        .map_err(|e| RegattaError::parse(format!("svg '{name}' is out of range: {e}")))?;
    if value == 0 {
        return Err(RegattaError::parse(format!("svg '{name}' must be non-zero")));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HULL: &str = "M0,50 C100,10 400,10 500,50 C400,90 100,90 0,50 Z";
    const OAR: &str = "M200,50 L300,20";

    fn shell_svg() -> String {
        format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="500px" height="100px">
                 <g><path d="{HULL}"/></g>
                 <path d="{OAR}"/>
               </svg>"#
        )
    }

    #[test]
    fn imports_size_and_paths_in_document_order() {
        let shape = import_boat_svg(&shell_svg()).unwrap();
        assert_eq!(shape.width, 500.0);
        assert_eq!(shape.height, 100.0);
        assert_eq!(shape.path_count(), 2);

        use kurbo::PathEl;
        // The nested hull path comes first, the oar second.
        assert!(matches!(shape.paths[0].elements()[1], PathEl::CurveTo(..)));
        assert!(matches!(shape.paths[1].elements()[1], PathEl::LineTo(..)));
    }

    #[test]
    fn rejects_missing_width() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" height="100px"><path d="M0,0 L1,1"/></svg>"#;
        let err = import_boat_svg(svg).unwrap_err();
        assert!(err.to_string().contains("width"));
    }

    #[test]
    fn rejects_unrecognized_unit() {
        let svg = r#"<svg width="500pt" height="100px"><path d="M0,0 L1,1"/></svg>"#;
        let err = import_boat_svg(svg).unwrap_err();
        assert!(err.to_string().contains("unrecognized unit"));
    }

    #[test]
    fn rejects_unitless_length() {
        let svg = r#"<svg width="500" height="100px"><path d="M0,0 L1,1"/></svg>"#;
        assert!(import_boat_svg(svg).is_err());
    }

    #[test]
    fn rejects_non_integer_length() {
        let svg = r#"<svg width="500.5px" height="100px"><path d="M0,0 L1,1"/></svg>"#;
        assert!(import_boat_svg(svg).is_err());
    }

    #[test]
    fn rejects_malformed_path_data() {
        let svg = r#"<svg width="500px" height="100px"><path d="M0,0 Q"/></svg>"#;
        let err = import_boat_svg(svg).unwrap_err();
        assert!(err.to_string().contains("path data"));
    }

    #[test]
    fn rejects_empty_document() {
        let svg = r#"<svg width="500px" height="100px"></svg>"#;
        let err = import_boat_svg(svg).unwrap_err();
        assert!(err.to_string().contains("no path elements"));
    }

    #[test]
    fn clones_are_independent_copies() {
        let shape = import_boat_svg(&shell_svg()).unwrap();
        let mut copy = shape.clone();
        copy.paths[0] = BezPath::new();
        assert_eq!(shape.path_count(), 2);
        assert!(!shape.paths[0].elements().is_empty());
    }
}
