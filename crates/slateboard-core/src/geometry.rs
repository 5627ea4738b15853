//! Pure geometry helpers shared by hit testing, transform math and the scene.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Maximum distance between the first and last point of a freedraw path for
/// it to count as closed.
pub const PATH_CLOSE_THRESHOLD: f64 = 10.0;

/// An axis box with rotation, the geometric footprint of every element.
///
/// `w`/`h` may be transiently negative while an element is being created by
/// dragging up or left; [`invert_negative_box`] normalizes that. `rotate` is
/// in radians around the box center, counter-clockwise positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub rotate: f64,
}

impl BoundingBox {
    pub const ZERO: BoundingBox = BoundingBox {
        x: 0.0,
        y: 0.0,
        w: 0.0,
        h: 0.0,
        rotate: 0.0,
    };

    /// Create an unrotated box.
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self {
            x,
            y,
            w,
            h,
            rotate: 0.0,
        }
    }

    /// Center of the box (valid for negative extents too).
    pub fn center(&self) -> Point {
        Point::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Check if a point lies inside the unrotated footprint of the box.
    pub fn contains(&self, point: Point) -> bool {
        let (x0, x1) = if self.w >= 0.0 {
            (self.x, self.x + self.w)
        } else {
            (self.x + self.w, self.x)
        };
        let (y0, y1) = if self.h >= 0.0 {
            (self.y, self.y + self.h)
        } else {
            (self.y + self.h, self.y)
        };
        point.x >= x0 && point.x <= x1 && point.y >= y0 && point.y <= y1
    }
}

/// Which axes a negative-extent normalization flipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisFlip {
    pub x: bool,
    pub y: bool,
}

/// Rotate a point around an arbitrary anchor, angle in radians,
/// counter-clockwise positive.
pub fn rotate_point_around(point: Point, anchor: Point, angle: f64) -> Point {
    let (sin, cos) = angle.sin_cos();
    let dx = point.x - anchor.x;
    let dy = point.y - anchor.y;
    Point::new(
        anchor.x + dx * cos - dy * sin,
        anchor.y + dx * sin + dy * cos,
    )
}

/// The four corners of a box after applying its own rotation around its own
/// center, in NW, NE, SW, SE order.
pub fn rotated_box_corners(bx: &BoundingBox) -> [Point; 4] {
    let center = bx.center();
    let corners = [
        Point::new(bx.x, bx.y),
        Point::new(bx.x + bx.w, bx.y),
        Point::new(bx.x, bx.y + bx.h),
        Point::new(bx.x + bx.w, bx.y + bx.h),
    ];
    if bx.rotate == 0.0 {
        return corners;
    }
    corners.map(|c| rotate_point_around(c, center, bx.rotate))
}

/// Minimal axis-aligned box covering the union of the given boxes.
///
/// Empty input yields the zero box, a single box is returned verbatim
/// (rotation preserved), and the union of two or more is always unrotated.
pub fn surrounding_bounding_box(boxes: &[BoundingBox]) -> BoundingBox {
    match boxes {
        [] => BoundingBox::ZERO,
        [only] => *only,
        many => {
            let mut min_x = f64::INFINITY;
            let mut min_y = f64::INFINITY;
            let mut max_x = f64::NEG_INFINITY;
            let mut max_y = f64::NEG_INFINITY;
            for bx in many {
                for corner in rotated_box_corners(bx) {
                    min_x = min_x.min(corner.x);
                    min_y = min_y.min(corner.y);
                    max_x = max_x.max(corner.x);
                    max_y = max_y.max(corner.y);
                }
            }
            BoundingBox::new(min_x, min_y, max_x - min_x, max_y - min_y)
        }
    }
}

/// Normalize a box with negative extents into the visually-equivalent
/// positive box, reporting which axes were inverted.
pub fn invert_negative_box(mut bx: BoundingBox) -> (BoundingBox, AxisFlip) {
    let mut flip = AxisFlip::default();
    if bx.w < 0.0 {
        bx.x += bx.w;
        bx.w = -bx.w;
        flip.x = true;
    }
    if bx.h < 0.0 {
        bx.y += bx.h;
        bx.h = -bx.h;
        flip.y = true;
    }
    (bx, flip)
}

/// Whether a freedraw path should be treated as a closed loop.
///
/// Paths with fewer than 3 points are trivially closed; otherwise the first
/// and last points must join within [`PATH_CLOSE_THRESHOLD`].
pub fn is_path_closed(path: &[Point]) -> bool {
    if path.len() < 3 {
        return true;
    }
    let first = path[0];
    let last = path[path.len() - 1];
    first.distance(last) <= PATH_CLOSE_THRESHOLD
}
