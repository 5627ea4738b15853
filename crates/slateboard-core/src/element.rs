//! Element model: the typed records everything on the board is made of.

use crate::geometry::BoundingBox;
use kurbo::Point;
use peniko::Color;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for elements.
pub type ElementId = Uuid;

/// Decimal places kept for freedraw path points.
pub const POINT_PRECISION: i32 = 2;

/// Round a coordinate to [`POINT_PRECISION`] decimals.
pub fn round_coord(value: f64) -> f64 {
    let factor = 10f64.powi(POINT_PRECISION);
    (value * factor).round() / factor
}

/// Estimate the rendered size of a text element from its content.
///
/// The external text overlay reports exact metrics on change; this estimate
/// only has to get fresh elements and tests into the right ballpark.
pub fn measure_text(content: &str, font_size: f64) -> (f64, f64) {
    let lines = content.lines().count().max(1);
    let widest = content.lines().map(str::len).max().unwrap_or(0);
    (widest as f64 * font_size * 0.6, lines as f64 * font_size * 1.25)
}

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }
}

impl From<Color> for Rgba {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<Rgba> for Color {
    fn from(color: Rgba) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// How an element is painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FillKind {
    /// Interior filled with the color.
    Solid,
    /// Border only.
    #[default]
    Outline,
}

/// Fill/stroke style carried by every element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FillStyle {
    pub color: Rgba,
    pub kind: FillKind,
    /// Stroke width, used by outline hit testing and handed to the text
    /// overlay as a style hint.
    pub stroke_width: f64,
}

impl Default for FillStyle {
    fn default() -> Self {
        Self {
            color: Rgba::black(),
            kind: FillKind::default(),
            stroke_width: 2.0,
        }
    }
}

/// Geometric shape kinds drawn by the shape tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeKind {
    Rect,
    Ellipse,
}

/// The per-variant payload of an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ElementKind {
    Shape {
        shape: ShapeKind,
    },
    /// Freehand path. Points are element-local (relative to `x`/`y`),
    /// rounded to [`POINT_PRECISION`] decimals; the first point is always
    /// `(0, 0)`.
    Freedraw {
        points: Vec<Point>,
    },
    Text {
        content: String,
        font_size: f64,
    },
}

/// Default font size for new text elements.
pub const DEFAULT_FONT_SIZE: f64 = 20.0;

/// A single board element.
///
/// `w`/`h` may be negative while the element is still being created by a
/// drag; once the gesture finishes they are normalized to non-negative
/// values and any inversion is recorded in the flip flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub(crate) id: ElementId,
    /// Top-left corner in virtual space.
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    /// Rotation in radians around the element center.
    pub rotate: f64,
    pub flipped_x: bool,
    pub flipped_y: bool,
    pub fill: FillStyle,
    pub selected: bool,
    pub kind: ElementKind,
}

impl Element {
    fn base(origin: Point, kind: ElementKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            x: origin.x,
            y: origin.y,
            w: 0.0,
            h: 0.0,
            rotate: 0.0,
            flipped_x: false,
            flipped_y: false,
            fill: FillStyle::default(),
            selected: false,
            kind,
        }
    }

    /// Create a zero-size shape element at the drag origin.
    pub fn shape(shape: ShapeKind, origin: Point) -> Self {
        Self::base(origin, ElementKind::Shape { shape })
    }

    /// Create a freedraw element at the drag origin with its mandatory
    /// `(0, 0)` first point.
    pub fn freedraw(origin: Point) -> Self {
        Self::base(origin, ElementKind::Freedraw { points: vec![Point::ZERO] })
    }

    /// Create a text element; width/height derive from the content.
    pub fn text(origin: Point, content: String) -> Self {
        let (w, h) = measure_text(&content, DEFAULT_FONT_SIZE);
        let mut element = Self::base(
            origin,
            ElementKind::Text {
                content,
                font_size: DEFAULT_FONT_SIZE,
            },
        );
        element.w = w;
        element.h = h;
        element
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    /// The element's geometric footprint.
    ///
    /// For freedraw elements the box derives from the path extents: the
    /// first path point is pinned at `(0, 0)` so later points may reach into
    /// negative local coordinates, putting the visual top-left corner away
    /// from the stored `x`/`y` origin.
    pub fn bounding_box(&self) -> BoundingBox {
        if let ElementKind::Freedraw { points } = &self.kind {
            let (min, _max) = path_extents(points);
            return BoundingBox {
                x: self.x + min.x,
                y: self.y + min.y,
                w: self.w,
                h: self.h,
                rotate: self.rotate,
            };
        }
        BoundingBox {
            x: self.x,
            y: self.y,
            w: self.w,
            h: self.h,
            rotate: self.rotate,
        }
    }

    pub fn center(&self) -> Point {
        self.bounding_box().center()
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, ElementKind::Text { .. })
    }

    /// Freedraw path points, if this element is a freedraw.
    pub fn path_points(&self) -> Option<&[Point]> {
        match &self.kind {
            ElementKind::Freedraw { points } => Some(points),
            _ => None,
        }
    }

    /// Append a virtual-space point to a freedraw path, growing the element
    /// box to the path extents. Not meaningful for other kinds.
    pub fn push_path_point(&mut self, virtual_point: Point) {
        let local = Point::new(
            round_coord(virtual_point.x - self.x),
            round_coord(virtual_point.y - self.y),
        );
        if let ElementKind::Freedraw { points } = &mut self.kind {
            points.push(local);
            let (min, max) = path_extents(points);
            self.w = max.x - min.x;
            self.h = max.y - min.y;
        }
    }
}

/// Min/max corners of a local path. Empty paths collapse to the origin.
pub(crate) fn path_extents(points: &[Point]) -> (Point, Point) {
    let mut min = Point::ZERO;
    let mut max = Point::ZERO;
    for p in points {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    (min, max)
}

/// Partial mutation payload for an element. `None` fields are skipped, so a
/// patch can carry "no change" markers without clobbering state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementPatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub w: Option<f64>,
    pub h: Option<f64>,
    pub rotate: Option<f64>,
    pub flipped_x: Option<bool>,
    pub flipped_y: Option<bool>,
    pub fill: Option<FillStyle>,
    pub selected: Option<bool>,
    /// Freedraw only; ignored for other kinds.
    pub points: Option<Vec<Point>>,
    /// Text only; ignored for other kinds.
    pub content: Option<String>,
    /// Text only; ignored for other kinds.
    pub font_size: Option<f64>,
}

impl ElementPatch {
    /// Position-only patch.
    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    /// Full-box patch (position and size).
    pub fn bounds(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            w: Some(w),
            h: Some(h),
            ..Self::default()
        }
    }

    /// Names of the fields this patch touches, for change notifications.
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.x.is_some() {
            names.push("x");
        }
        if self.y.is_some() {
            names.push("y");
        }
        if self.w.is_some() {
            names.push("w");
        }
        if self.h.is_some() {
            names.push("h");
        }
        if self.rotate.is_some() {
            names.push("rotate");
        }
        if self.flipped_x.is_some() {
            names.push("flipped_x");
        }
        if self.flipped_y.is_some() {
            names.push("flipped_y");
        }
        if self.fill.is_some() {
            names.push("fill");
        }
        if self.selected.is_some() {
            names.push("selected");
        }
        if self.points.is_some() {
            names.push("points");
        }
        if self.content.is_some() {
            names.push("content");
        }
        if self.font_size.is_some() {
            names.push("font_size");
        }
        names
    }

    /// Apply the patch to an element. Kind-specific fields that do not
    /// match the element's kind are ignored.
    pub fn apply(&self, element: &mut Element) {
        if let Some(x) = self.x {
            element.x = x;
        }
        if let Some(y) = self.y {
            element.y = y;
        }
        if let Some(w) = self.w {
            element.w = w;
        }
        if let Some(h) = self.h {
            element.h = h;
        }
        if let Some(rotate) = self.rotate {
            element.rotate = rotate;
        }
        if let Some(flipped_x) = self.flipped_x {
            element.flipped_x = flipped_x;
        }
        if let Some(flipped_y) = self.flipped_y {
            element.flipped_y = flipped_y;
        }
        if let Some(fill) = self.fill {
            element.fill = fill;
        }
        if let Some(selected) = self.selected {
            element.selected = selected;
        }
        if let Some(new_points) = &self.points {
            if let ElementKind::Freedraw { points } = &mut element.kind {
                *points = new_points
                    .iter()
                    .map(|p| Point::new(round_coord(p.x), round_coord(p.y)))
                    .collect();
            }
        }
        if let Some(new_content) = &self.content {
            if let ElementKind::Text { content, .. } = &mut element.kind {
                content.clone_from(new_content);
            }
        }
        if let Some(new_size) = self.font_size {
            if let ElementKind::Text { font_size, .. } = &mut element.kind {
                *font_size = new_size;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_factory() {
        let element = Element::shape(ShapeKind::Rect, Point::new(10.0, 20.0));
        assert_eq!(element.x, 10.0);
        assert_eq!(element.y, 20.0);
        assert_eq!(element.w, 0.0);
        assert!(!element.flipped_x);
        assert!(!element.selected);
    }

    #[test]
    fn test_freedraw_starts_at_origin() {
        let element = Element::freedraw(Point::new(5.0, 5.0));
        assert_eq!(element.path_points(), Some(&[Point::ZERO][..]));
    }

    #[test]
    fn test_freedraw_push_rounds_and_grows() {
        let mut element = Element::freedraw(Point::new(100.0, 100.0));
        element.push_path_point(Point::new(105.123456, 100.0));
        element.push_path_point(Point::new(105.0, 108.0));
        assert_eq!(
            element.path_points().unwrap()[1],
            Point::new(5.12, 0.0)
        );
        assert!((element.w - 5.12).abs() < 1e-9);
        assert!((element.h - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_freedraw_box_follows_negative_extent() {
        let mut element = Element::freedraw(Point::new(100.0, 100.0));
        element.push_path_point(Point::new(90.0, 95.0));
        // First point stays pinned at (0,0); the visual box shifts up-left.
        assert_eq!(element.path_points().unwrap()[0], Point::ZERO);
        let bx = element.bounding_box();
        assert_eq!(bx.x, 90.0);
        assert_eq!(bx.y, 95.0);
        assert!((element.w - 10.0).abs() < 1e-9);
        assert!((element.h - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_text_factory_measures_content() {
        let element = Element::text(Point::ZERO, "hi".to_string());
        assert!(element.w > 0.0);
        assert!(element.h > 0.0);
        assert!(element.is_text());
    }

    #[test]
    fn test_patch_skips_none_fields() {
        let mut element = Element::shape(ShapeKind::Rect, Point::new(1.0, 2.0));
        element.w = 10.0;
        let patch = ElementPatch {
            x: Some(5.0),
            ..ElementPatch::default()
        };
        patch.apply(&mut element);
        assert_eq!(element.x, 5.0);
        assert_eq!(element.y, 2.0);
        assert_eq!(element.w, 10.0);
    }

    #[test]
    fn test_patch_field_names() {
        let patch = ElementPatch::bounds(0.0, 0.0, 1.0, 1.0);
        assert_eq!(patch.field_names(), vec!["x", "y", "w", "h"]);
    }

    #[test]
    fn test_patch_ignores_mismatched_kind_fields() {
        let mut element = Element::shape(ShapeKind::Ellipse, Point::ZERO);
        let patch = ElementPatch {
            content: Some("nope".to_string()),
            points: Some(vec![Point::new(1.0, 1.0)]),
            ..ElementPatch::default()
        };
        patch.apply(&mut element);
        assert!(matches!(element.kind, ElementKind::Shape { .. }));
    }

    #[test]
    fn test_element_serde_roundtrip() {
        let element = Element::text(Point::new(3.0, 4.0), "note".to_string());
        let json = serde_json::to_string(&element).unwrap();
        let back: Element = serde_json::from_str(&json).unwrap();
        assert_eq!(back, element);
    }

    #[test]
    fn test_color_interop() {
        let rgba = Rgba::new(10, 20, 30, 255);
        let color: peniko::Color = rgba.into();
        assert_eq!(Rgba::from(color), rgba);
    }
}
