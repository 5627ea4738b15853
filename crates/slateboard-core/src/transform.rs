//! Geometry for drag, resize and rotate gestures.
//!
//! Every computation works from each element's immutable pre-gesture
//! snapshot, never from the previous frame, so repeated pointer moves
//! cannot accumulate rounding drift.

use crate::element::{round_coord, Element, ElementId, ElementKind, ElementPatch};
use crate::geometry::{invert_negative_box, rotate_point_around, BoundingBox};
use crate::handles::HandleKind;
use kurbo::{Point, Vec2};
use std::f64::consts::PI;

/// Rotation snap increment: 15 degrees.
pub const ROTATE_SNAP_INCREMENT: f64 = PI / 12.0;

/// An element captured at gesture start. The live element mutates as the
/// gesture progresses; `initial` stays frozen for the math.
#[derive(Debug, Clone)]
pub struct TransformingElement {
    pub id: ElementId,
    pub initial: Element,
}

impl TransformingElement {
    pub fn new(element: &Element) -> Self {
        Self {
            id: element.id(),
            initial: element.clone(),
        }
    }
}

/// Rigid translation: initial position plus the cumulative pointer delta.
/// The caller snaps the delta beforehand when grid snapping is on, so the
/// whole group shifts by one shared offset.
pub fn drag_patch(target: &TransformingElement, delta: Vec2) -> ElementPatch {
    ElementPatch::position(target.initial.x + delta.x, target.initial.y + delta.y)
}

/// Scale a local freedraw path about its `(0, 0)` origin.
pub fn scale_path(points: &[Point], sx: f64, sy: f64) -> Vec<Point> {
    points
        .iter()
        .map(|p| Point::new(round_coord(p.x * sx), round_coord(p.y * sy)))
        .collect()
}

/// Resize the selection against the grabbed handle.
///
/// Scale factors come from the pointer's distance to the handle's opposite
/// anchor on the *initial* group box. A single element may scale through
/// zero and flip; a multi-selection locks to one uniform positive scalar so
/// the group's relative layout is preserved.
pub fn resize_patches(
    targets: &[TransformingElement],
    initial_group: &BoundingBox,
    handle: HandleKind,
    pointer: Point,
    min_size: f64,
) -> Vec<(ElementId, ElementPatch)> {
    let anchor = handle.anchor(initial_group);
    let grabbed = handle.local_position(initial_group);

    let factor = |p: f64, h: f64, a: f64| {
        let f = (p - a) / (h - a);
        if f.is_finite() { f } else { 1.0 }
    };
    let mut sx = if handle.scales_x() {
        factor(pointer.x, grabbed.x, anchor.x)
    } else {
        1.0
    };
    let mut sy = if handle.scales_y() {
        factor(pointer.y, grabbed.y, anchor.y)
    } else {
        1.0
    };

    let allow_flip = targets.len() == 1;
    if !allow_flip {
        // Uniform aspect lock, clamped positive: group resize never mirrors.
        let s = sx.abs().max(sy.abs());
        sx = s;
        sy = s;
    }

    targets
        .iter()
        .map(|t| (t.id, resize_one(&t.initial, anchor, sx, sy, allow_flip, min_size)))
        .collect()
}

fn resize_one(
    initial: &Element,
    anchor: Point,
    sx: f64,
    sy: f64,
    allow_flip: bool,
    min_size: f64,
) -> ElementPatch {
    let nx = anchor.x + (initial.x - anchor.x) * sx;
    let ny = anchor.y + (initial.y - anchor.y) * sy;

    if let ElementKind::Freedraw { points } = &initial.kind {
        // Path points live in element-local space; mirroring falls out of a
        // negative factor, so no flip flags are involved.
        let scaled = scale_path(points, sx, sy);
        let (min, max) = crate::element::path_extents(&scaled);
        let mut patch = ElementPatch::bounds(nx, ny, max.x - min.x, max.y - min.y);
        patch.points = Some(scaled);
        return patch;
    }

    let scaled = BoundingBox::new(nx, ny, initial.w * sx, initial.h * sy);
    let (mut bx, flip) = invert_negative_box(scaled);
    if bx.w < f64::EPSILON {
        bx.w = min_size;
    }
    if bx.h < f64::EPSILON {
        bx.h = min_size;
    }

    let mut patch = ElementPatch::bounds(bx.x, bx.y, bx.w, bx.h);
    if allow_flip && (flip.x || flip.y) {
        patch.flipped_x = Some(initial.flipped_x ^ flip.x);
        patch.flipped_y = Some(initial.flipped_y ^ flip.y);
    }
    patch
}

/// Rotate the selection rigidly around the group center.
///
/// The rotation delta is the angle swept by the pointer since gesture start,
/// optionally snapped to [`ROTATE_SNAP_INCREMENT`]. Each element's own
/// `rotate` advances by the delta and its position shifts so its center
/// keeps the rotated offset from the group center.
pub fn rotate_patches(
    targets: &[TransformingElement],
    group_center: Point,
    initial_pointer: Point,
    pointer: Point,
    snap: bool,
) -> Vec<(ElementId, ElementPatch)> {
    let angle_of = |p: Point| (p.y - group_center.y).atan2(p.x - group_center.x);
    let mut delta = angle_of(pointer) - angle_of(initial_pointer);
    if snap {
        delta = (delta / ROTATE_SNAP_INCREMENT).round() * ROTATE_SNAP_INCREMENT;
    }

    targets
        .iter()
        .map(|t| {
            let init_center = t.initial.center();
            let new_center = rotate_point_around(init_center, group_center, delta);
            let shift = new_center - init_center;
            let mut patch =
                ElementPatch::position(t.initial.x + shift.x, t.initial.y + shift.y);
            patch.rotate = Some(t.initial.rotate + delta);
            (t.id, patch)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ShapeKind;
    use crate::viewport::GRID_SIZE;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

    fn rect_at(x: f64, y: f64, w: f64, h: f64) -> Element {
        let mut e = Element::shape(ShapeKind::Rect, Point::new(x, y));
        e.w = w;
        e.h = h;
        e
    }

    #[test]
    fn test_drag_applies_cumulative_delta() {
        let t = TransformingElement::new(&rect_at(10.0, 20.0, 5.0, 5.0));
        let patch = drag_patch(&t, Vec2::new(30.0, -5.0));
        assert_eq!(patch.x, Some(40.0));
        assert_eq!(patch.y, Some(15.0));
        assert_eq!(patch.rotate, None);
    }

    #[test]
    fn test_drag_zero_delta_is_identity() {
        let element = rect_at(10.0, 20.0, 5.0, 5.0);
        let t = TransformingElement::new(&element);
        let patch = drag_patch(&t, Vec2::ZERO);
        let mut after = element.clone();
        patch.apply(&mut after);
        assert_eq!(after, element);
    }

    #[test]
    fn test_scale_path_about_origin() {
        let points = vec![Point::ZERO, Point::new(5.0, 0.0), Point::new(5.0, 5.0)];
        let scaled = scale_path(&points, 2.0, 1.0);
        assert_eq!(
            scaled,
            vec![Point::ZERO, Point::new(10.0, 0.0), Point::new(10.0, 5.0)]
        );
    }

    #[test]
    fn test_resize_se_doubles() {
        let t = TransformingElement::new(&rect_at(100.0, 100.0, 50.0, 40.0));
        let group = t.initial.bounding_box();
        let patches =
            resize_patches(&[t], &group, HandleKind::Se, Point::new(200.0, 180.0), GRID_SIZE);
        let (_, patch) = &patches[0];
        assert_eq!(patch.x, Some(100.0));
        assert_eq!(patch.y, Some(100.0));
        assert_eq!(patch.w, Some(100.0));
        assert_eq!(patch.h, Some(80.0));
        assert_eq!(patch.flipped_x, None);
    }

    #[test]
    fn test_resize_through_anchor_flips() {
        let t = TransformingElement::new(&rect_at(100.0, 100.0, 50.0, 40.0));
        let group = t.initial.bounding_box();
        // Dragging the SE handle past the NW anchor mirrors both axes.
        let patches =
            resize_patches(&[t], &group, HandleKind::Se, Point::new(50.0, 60.0), GRID_SIZE);
        let (_, patch) = &patches[0];
        assert_eq!(patch.x, Some(50.0));
        assert_eq!(patch.y, Some(60.0));
        assert_eq!(patch.w, Some(50.0));
        assert_eq!(patch.h, Some(40.0));
        assert_eq!(patch.flipped_x, Some(true));
        assert_eq!(patch.flipped_y, Some(true));
    }

    #[test]
    fn test_resize_edge_handle_single_axis() {
        let t = TransformingElement::new(&rect_at(100.0, 100.0, 50.0, 40.0));
        let group = t.initial.bounding_box();
        // E handle: anchor is the W edge midpoint, only x scales.
        let patches =
            resize_patches(&[t], &group, HandleKind::E, Point::new(250.0, 500.0), GRID_SIZE);
        let (_, patch) = &patches[0];
        assert_eq!(patch.w, Some(150.0));
        assert_eq!(patch.h, Some(40.0));
    }

    #[test]
    fn test_multi_resize_uniform_no_flip() {
        let a = TransformingElement::new(&rect_at(0.0, 0.0, 10.0, 10.0));
        let b = TransformingElement::new(&rect_at(20.0, 20.0, 10.0, 10.0));
        let group = BoundingBox::new(0.0, 0.0, 30.0, 30.0);
        let patches = resize_patches(
            &[a, b],
            &group,
            HandleKind::Se,
            Point::new(60.0, 30.0),
            GRID_SIZE,
        );
        // sx = 2, sy = 1: uniform scalar locks to 2 on both axes.
        let (_, pa) = &patches[0];
        assert_eq!(pa.x, Some(0.0));
        assert_eq!(pa.w, Some(20.0));
        assert_eq!(pa.h, Some(20.0));
        let (_, pb) = &patches[1];
        assert_eq!(pb.x, Some(40.0));
        assert_eq!(pb.y, Some(40.0));
        assert_eq!(pb.w, Some(20.0));
        assert_eq!(pb.flipped_x, None);
    }

    #[test]
    fn test_resize_freedraw_rescales_points() {
        let mut e = Element::freedraw(Point::new(10.0, 10.0));
        e.push_path_point(Point::new(15.0, 10.0));
        e.push_path_point(Point::new(15.0, 15.0));
        let t = TransformingElement::new(&e);
        let group = t.initial.bounding_box();
        // SE handle from (15,15) with NW anchor (10,10), pointer (20,15):
        // sx = 2, sy = 1.
        let patches =
            resize_patches(&[t], &group, HandleKind::Se, Point::new(20.0, 15.0), GRID_SIZE);
        let (_, patch) = &patches[0];
        assert_eq!(
            patch.points,
            Some(vec![Point::ZERO, Point::new(10.0, 0.0), Point::new(10.0, 5.0)])
        );
        assert_eq!(patch.w, Some(10.0));
        assert_eq!(patch.h, Some(5.0));
        assert_eq!(patch.x, Some(10.0));
    }

    #[test]
    fn test_zero_extent_axis_is_identity() {
        let t = TransformingElement::new(&rect_at(100.0, 100.0, 0.0, 40.0));
        let group = t.initial.bounding_box();
        let patches =
            resize_patches(&[t], &group, HandleKind::Se, Point::new(300.0, 180.0), GRID_SIZE);
        let (_, patch) = &patches[0];
        // Division by the zero-width axis is non-finite, so x keeps scale 1
        // and the collapsed width falls back to the minimum size.
        assert_eq!(patch.h, Some(80.0));
        assert_eq!(patch.w, Some(GRID_SIZE));
    }

    #[test]
    fn test_degenerate_result_gets_minimum_size() {
        let t = TransformingElement::new(&rect_at(100.0, 100.0, 50.0, 40.0));
        let group = t.initial.bounding_box();
        // Pointer exactly on the anchor collapses both axes.
        let patches =
            resize_patches(&[t], &group, HandleKind::Se, Point::new(100.0, 100.0), GRID_SIZE);
        let (_, patch) = &patches[0];
        assert_eq!(patch.w, Some(GRID_SIZE));
        assert_eq!(patch.h, Some(GRID_SIZE));
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let e = rect_at(0.0, 0.0, 10.0, 10.0);
        let center = e.center();
        let t = TransformingElement::new(&e);
        let patches = rotate_patches(
            &[t],
            center,
            Point::new(5.0, -20.0),
            Point::new(30.0, 5.0),
            false,
        );
        let (_, patch) = &patches[0];
        assert!((patch.rotate.unwrap() - FRAC_PI_2).abs() < 1e-12);
        // Rotating about its own center leaves the position alone.
        assert!((patch.x.unwrap() - 0.0).abs() < 1e-12);
        assert!((patch.y.unwrap() - 0.0).abs() < 1e-12);
    }

    #[test]
    fn test_rotate_snaps_to_increment() {
        let e = rect_at(0.0, 0.0, 10.0, 10.0);
        let center = e.center();
        let t = TransformingElement::new(&e);
        // 47 degrees of sweep snaps to 45.
        let sweep = 47.0_f64.to_radians();
        let start = Point::new(25.0, 5.0);
        let end = rotate_point_around(start, center, sweep);
        let patches = rotate_patches(&[t], center, start, end, true);
        let (_, patch) = &patches[0];
        assert!((patch.rotate.unwrap() - FRAC_PI_4).abs() < 1e-12);
    }

    #[test]
    fn test_multi_rotate_moves_centers_rigidly() {
        let a = TransformingElement::new(&rect_at(0.0, 0.0, 10.0, 10.0));
        let b = TransformingElement::new(&rect_at(20.0, 20.0, 10.0, 10.0));
        let group_center = Point::new(15.0, 15.0);
        let start = Point::new(15.0, -10.0);
        let end = rotate_point_around(start, group_center, FRAC_PI_2);
        let patches = rotate_patches(&[a, b], group_center, start, end, false);
        // Element a's center (5,5) swings to (25,5): position shifts by (20,0).
        let (_, pa) = &patches[0];
        assert!((pa.x.unwrap() - 20.0).abs() < 1e-9);
        assert!((pa.y.unwrap() - 0.0).abs() < 1e-9);
        assert!((pa.rotate.unwrap() - FRAC_PI_2).abs() < 1e-12);
        let (_, pb) = &patches[1];
        assert!((pb.x.unwrap() - 0.0).abs() < 1e-9);
        assert!((pb.y.unwrap() - 20.0).abs() < 1e-9);
    }
}
