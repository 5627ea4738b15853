//! Resize and rotate handle placement around a selection box.

use crate::geometry::{rotate_point_around, BoundingBox};
use crate::viewport::Viewport;
use kurbo::Point;

/// Hit radius around a handle, in screen pixels.
pub const HANDLE_HIT_TOLERANCE: f64 = 10.0;
/// Screen-pixel gap between the box top edge and the rotate handle.
pub const ROTATE_HANDLE_OFFSET: f64 = 25.0;

/// The nine grab points around a selection box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleKind {
    Nw,
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
    Rotate,
}

impl HandleKind {
    const RESIZE: [HandleKind; 8] = [
        HandleKind::Nw,
        HandleKind::N,
        HandleKind::Ne,
        HandleKind::E,
        HandleKind::Se,
        HandleKind::S,
        HandleKind::Sw,
        HandleKind::W,
    ];

    /// Handle position on the unrotated box, in virtual coordinates.
    pub(crate) fn local_position(self, bx: &BoundingBox) -> Point {
        let (cx, cy) = (bx.x + bx.w / 2.0, bx.y + bx.h / 2.0);
        let (r, b) = (bx.x + bx.w, bx.y + bx.h);
        match self {
            HandleKind::Nw => Point::new(bx.x, bx.y),
            HandleKind::N => Point::new(cx, bx.y),
            HandleKind::Ne => Point::new(r, bx.y),
            HandleKind::E => Point::new(r, cy),
            HandleKind::Se => Point::new(r, b),
            HandleKind::S => Point::new(cx, b),
            HandleKind::Sw => Point::new(bx.x, b),
            HandleKind::W => Point::new(bx.x, cy),
            HandleKind::Rotate => Point::new(cx, bx.y),
        }
    }

    /// The fixed point a resize drag scales away from: the opposite
    /// corner for corner handles, the opposite edge midpoint for edges.
    pub fn anchor(self, bx: &BoundingBox) -> Point {
        match self {
            HandleKind::Nw => HandleKind::Se.local_position(bx),
            HandleKind::N => HandleKind::S.local_position(bx),
            HandleKind::Ne => HandleKind::Sw.local_position(bx),
            HandleKind::E => HandleKind::W.local_position(bx),
            HandleKind::Se => HandleKind::Nw.local_position(bx),
            HandleKind::S => HandleKind::N.local_position(bx),
            HandleKind::Sw => HandleKind::Ne.local_position(bx),
            HandleKind::W => HandleKind::E.local_position(bx),
            HandleKind::Rotate => bx.center(),
        }
    }

    /// Which axes this handle resizes.
    pub fn scales_x(self) -> bool {
        !matches!(self, HandleKind::N | HandleKind::S | HandleKind::Rotate)
    }

    pub fn scales_y(self) -> bool {
        !matches!(self, HandleKind::E | HandleKind::W | HandleKind::Rotate)
    }
}

/// A handle ready for hit testing and drawing, positioned in screen space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformHandle {
    pub kind: HandleKind,
    pub position: Point,
}

/// Compute screen-space handles for a selection box.
///
/// Handle positions rotate with the box around its center. The rotate
/// handle floats above the top edge at a fixed screen distance, so it
/// keeps its gap regardless of zoom.
pub fn handles_for_box(bx: &BoundingBox, viewport: &Viewport) -> Vec<TransformHandle> {
    let center = bx.center();
    let mut handles: Vec<TransformHandle> = HandleKind::RESIZE
        .iter()
        .map(|&kind| {
            let virt = rotate_point_around(kind.local_position(bx), center, bx.rotate);
            TransformHandle {
                kind,
                position: viewport.virtual_to_screen(virt),
            }
        })
        .collect();

    let top_mid = Point::new(
        bx.x + bx.w / 2.0,
        bx.y - ROTATE_HANDLE_OFFSET / viewport.zoom,
    );
    handles.push(TransformHandle {
        kind: HandleKind::Rotate,
        position: viewport.virtual_to_screen(rotate_point_around(top_mid, center, bx.rotate)),
    });
    handles
}

/// Find the handle under a screen-space pointer, if any.
pub fn hit_test_handles(handles: &[TransformHandle], screen: Point) -> Option<HandleKind> {
    handles
        .iter()
        .find(|h| h.position.distance(screen) <= HANDLE_HIT_TOLERANCE)
        .map(|h| h.kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn bx() -> BoundingBox {
        BoundingBox::new(100.0, 100.0, 50.0, 40.0)
    }

    #[test]
    fn test_handle_positions_unrotated() {
        let handles = handles_for_box(&bx(), &Viewport::default());
        assert_eq!(handles.len(), 9);
        let nw = handles.iter().find(|h| h.kind == HandleKind::Nw).unwrap();
        assert_eq!(nw.position, Point::new(100.0, 100.0));
        let se = handles.iter().find(|h| h.kind == HandleKind::Se).unwrap();
        assert_eq!(se.position, Point::new(150.0, 140.0));
        let rot = handles
            .iter()
            .find(|h| h.kind == HandleKind::Rotate)
            .unwrap();
        assert_eq!(rot.position, Point::new(125.0, 75.0));
    }

    #[test]
    fn test_handles_rotate_with_box() {
        let mut b = bx();
        b.rotate = FRAC_PI_2;
        let handles = handles_for_box(&b, &Viewport::default());
        let nw = handles.iter().find(|h| h.kind == HandleKind::Nw).unwrap();
        // NW corner (100,100) swings around center (125,120) by 90 degrees.
        assert!((nw.position.x - 145.0).abs() < 1e-9);
        assert!((nw.position.y - 95.0).abs() < 1e-9);
    }

    #[test]
    fn test_rotate_handle_gap_zoom_invariant() {
        let mut vp = Viewport::default();
        vp.zoom = 2.0;
        let handles = handles_for_box(&bx(), &vp);
        let rot = handles
            .iter()
            .find(|h| h.kind == HandleKind::Rotate)
            .unwrap();
        let n = handles.iter().find(|h| h.kind == HandleKind::N).unwrap();
        assert!((n.position.y - rot.position.y - ROTATE_HANDLE_OFFSET).abs() < 1e-9);
    }

    #[test]
    fn test_hit_test_handles_tolerance() {
        let handles = handles_for_box(&bx(), &Viewport::default());
        assert_eq!(
            hit_test_handles(&handles, Point::new(103.0, 104.0)),
            Some(HandleKind::Nw)
        );
        assert_eq!(hit_test_handles(&handles, Point::new(125.0, 120.0)), None);
    }

    #[test]
    fn test_anchor_is_opposite() {
        let b = bx();
        assert_eq!(HandleKind::Nw.anchor(&b), Point::new(150.0, 140.0));
        assert_eq!(HandleKind::E.anchor(&b), Point::new(100.0, 120.0));
        assert_eq!(HandleKind::S.anchor(&b), Point::new(125.0, 100.0));
    }
}
