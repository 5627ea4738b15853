//! Point-in-element and box-intersection tests, rotation aware.

use crate::element::{Element, ElementKind, FillKind, ShapeKind};
use crate::geometry::{is_path_closed, rotate_point_around, rotated_box_corners, BoundingBox};
use kurbo::{Point, Vec2};

/// Default hit tolerance in screen pixels; callers divide by zoom.
pub const HIT_TOLERANCE: f64 = 5.0;

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = Vec2::new(b.x - a.x, b.y - a.y);
    let pv = Vec2::new(point.x - a.x, point.y - a.y);
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = Point::new(a.x + t * seg.x, a.y + t * seg.y);
    point.distance(proj)
}

/// Minimum distance from a point to a polyline.
pub fn point_to_polyline_dist(point: Point, points: &[Point]) -> f64 {
    points
        .windows(2)
        .map(|w| point_to_segment_dist(point, w[0], w[1]))
        .fold(f64::INFINITY, f64::min)
}

/// Test if a point (in virtual coordinates) hits an element.
///
/// The point is rotated into the element's local frame around the element
/// center, so rotated elements hit-test against their unrotated footprint.
pub fn hit_test(element: &Element, point: Point, tolerance: f64) -> bool {
    let bx = element.bounding_box();
    let local = rotate_point_around(point, bx.center(), -bx.rotate);
    let footprint = BoundingBox::new(bx.x, bx.y, bx.w, bx.h);

    match &element.kind {
        ElementKind::Shape { shape: ShapeKind::Rect } => match element.fill.kind {
            FillKind::Solid => inflate(&footprint, tolerance).contains(local),
            FillKind::Outline => {
                let edge = tolerance + element.fill.stroke_width / 2.0;
                // A rect thinner than the stroke band has no interior left
                // to exclude; deflating it would re-normalize into a
                // phantom band around the centerline.
                let hollow =
                    footprint.w.abs() > 2.0 * edge && footprint.h.abs() > 2.0 * edge;
                inflate(&footprint, edge).contains(local)
                    && !(hollow && inflate(&footprint, -edge).contains(local))
            }
        },
        ElementKind::Shape { shape: ShapeKind::Ellipse } => {
            let center = footprint.center();
            let rx = footprint.w.abs() / 2.0;
            let ry = footprint.h.abs() / 2.0;
            match element.fill.kind {
                FillKind::Solid => ellipse_value(local, center, rx + tolerance, ry + tolerance) <= 1.0,
                FillKind::Outline => {
                    let edge = tolerance + element.fill.stroke_width / 2.0;
                    ellipse_value(local, center, rx + edge, ry + edge) <= 1.0
                        && ellipse_value(local, center, rx - edge, ry - edge) > 1.0
                }
            }
        }
        ElementKind::Freedraw { points } => {
            // Path points are relative to the stored origin, not the box corner.
            let path_local = Point::new(local.x - element.x, local.y - element.y);
            if element.fill.kind == FillKind::Solid
                && is_path_closed(points)
                && point_in_polygon(path_local, points)
            {
                return true;
            }
            point_to_polyline_dist(path_local, points)
                <= tolerance + element.fill.stroke_width / 2.0
        }
        ElementKind::Text { .. } => inflate(&footprint, tolerance).contains(local),
    }
}

/// Test if an element intersects an axis-aligned selection box (marquee).
pub fn intersects_box(element: &Element, sel: &BoundingBox) -> bool {
    let corners = rotated_box_corners(&element.bounding_box());
    // Polygon in perimeter order: NW, NE, SE, SW.
    let quad = [corners[0], corners[1], corners[3], corners[2]];

    if quad.iter().any(|&p| sel.contains(p)) {
        return true;
    }

    let sel_corners = [
        Point::new(sel.x, sel.y),
        Point::new(sel.x + sel.w, sel.y),
        Point::new(sel.x + sel.w, sel.y + sel.h),
        Point::new(sel.x, sel.y + sel.h),
    ];
    if sel_corners.iter().any(|&p| point_in_polygon(p, &quad)) {
        return true;
    }

    for i in 0..4 {
        let (a, b) = (quad[i], quad[(i + 1) % 4]);
        for j in 0..4 {
            let (c, d) = (sel_corners[j], sel_corners[(j + 1) % 4]);
            if segments_intersect(a, b, c, d) {
                return true;
            }
        }
    }
    false
}

fn inflate(bx: &BoundingBox, amount: f64) -> BoundingBox {
    BoundingBox::new(
        bx.x - amount,
        bx.y - amount,
        bx.w + amount * 2.0,
        bx.h + amount * 2.0,
    )
}

fn ellipse_value(point: Point, center: Point, rx: f64, ry: f64) -> f64 {
    if rx <= 0.0 || ry <= 0.0 {
        return f64::INFINITY;
    }
    let nx = (point.x - center.x) / rx;
    let ny = (point.y - center.y) / ry;
    nx * nx + ny * ny
}

/// Ray-casting point-in-polygon test.
fn point_in_polygon(point: Point, polygon: &[Point]) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (pi, pj) = (polygon[i], polygon[j]);
        if (pi.y > point.y) != (pj.y > point.y) {
            let cross_x = (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x;
            if point.x < cross_x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Test if two line segments (a-b) and (c-d) intersect.
fn segments_intersect(a: Point, b: Point, c: Point, d: Point) -> bool {
    let cross =
        |o: Point, p: Point, q: Point| (p.x - o.x) * (q.y - o.y) - (p.y - o.y) * (q.x - o.x);
    let d1 = cross(c, d, a);
    let d2 = cross(c, d, b);
    let d3 = cross(a, b, c);
    let d4 = cross(a, b, d);
    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }
    // Collinear cases: an endpoint lies on the other segment.
    let on_segment = |p: Point, q: Point, r: Point| {
        r.x >= p.x.min(q.x) && r.x <= p.x.max(q.x) && r.y >= p.y.min(q.y) && r.y <= p.y.max(q.y)
    };
    (d1.abs() < 1e-10 && on_segment(c, d, a))
        || (d2.abs() < 1e-10 && on_segment(c, d, b))
        || (d3.abs() < 1e-10 && on_segment(a, b, c))
        || (d4.abs() < 1e-10 && on_segment(a, b, d))
}
