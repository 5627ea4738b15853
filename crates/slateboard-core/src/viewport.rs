//! Viewport transform between screen pixels and virtual document coordinates.

use kurbo::{Point, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Minimum allowed zoom level.
pub const MIN_ZOOM: f64 = 0.1;
/// Maximum allowed zoom level.
pub const MAX_ZOOM: f64 = 10.0;
/// Default grid cell size in virtual units (matches the visual grid).
pub const GRID_SIZE: f64 = 20.0;

/// Grid configuration for coordinate snapping.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Grid {
    /// Cell size in virtual units.
    pub size: f64,
    /// Whether snapping is active.
    pub snap_enabled: bool,
}

impl Default for Grid {
    fn default() -> Self {
        Self {
            size: GRID_SIZE,
            snap_enabled: false,
        }
    }
}

/// A zoom update paired with the scroll offset that keeps the anchor point
/// visually fixed. Produced by [`Viewport::zoom_patch`], applied with
/// [`Viewport::apply_zoom`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomPatch {
    pub zoom: f64,
    pub scroll: Vec2,
}

/// The view transform for the canvas: pan offset, zoom and grid state.
///
/// `virtual = (screen - scroll) / zoom`; the inverse maps back. The virtual
/// plane is unbounded, the viewport only decides what slice of it the screen
/// shows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewport {
    /// Current translation offset (pan), in screen pixels.
    pub scroll: Vec2,
    /// Current zoom level.
    pub zoom: f64,
    /// Size of the visible canvas area in screen pixels.
    pub size: Size,
    /// Grid snapping configuration.
    pub grid: Grid,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scroll: Vec2::ZERO,
            zoom: 1.0,
            size: Size::new(800.0, 600.0),
            grid: Grid::default(),
        }
    }
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert a screen point to virtual coordinates.
    pub fn screen_to_virtual(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.scroll.x) / self.zoom,
            (screen.y - self.scroll.y) / self.zoom,
        )
    }

    /// Convert a virtual point to screen coordinates.
    pub fn virtual_to_screen(&self, point: Point) -> Point {
        Point::new(
            point.x * self.zoom + self.scroll.x,
            point.y * self.zoom + self.scroll.y,
        )
    }

    /// Snap a virtual point to the nearest grid intersection. No-op when
    /// snapping is disabled.
    pub fn snap_to_grid(&self, point: Point) -> Point {
        if !self.grid.snap_enabled || self.grid.size <= 0.0 {
            return point;
        }
        Point::new(
            (point.x / self.grid.size).round() * self.grid.size,
            (point.y / self.grid.size).round() * self.grid.size,
        )
    }

    /// Compute the zoom/scroll pair for a requested zoom level, keeping the
    /// virtual point under `anchor_screen` visually fixed. The requested
    /// zoom is clamped to `[MIN_ZOOM, MAX_ZOOM]`.
    pub fn zoom_patch(&self, requested_zoom: f64, anchor_screen: Point) -> ZoomPatch {
        let zoom = requested_zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        let anchor_virtual = self.screen_to_virtual(anchor_screen);
        let scroll = Vec2::new(
            anchor_screen.x - anchor_virtual.x * zoom,
            anchor_screen.y - anchor_virtual.y * zoom,
        );
        ZoomPatch { zoom, scroll }
    }

    /// Apply a zoom patch.
    pub fn apply_zoom(&mut self, patch: ZoomPatch) {
        self.zoom = patch.zoom;
        self.scroll = patch.scroll;
    }

    /// Pan by a delta in screen pixels.
    pub fn pan(&mut self, delta: Vec2) {
        self.scroll += delta;
    }

    /// Geometric center of the visible canvas area, in screen coordinates.
    pub fn screen_center(&self) -> Point {
        Point::new(self.size.width / 2.0, self.size.height / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_conversion() {
        let vp = Viewport::new();
        let p = Point::new(123.0, 456.0);
        assert_eq!(vp.screen_to_virtual(p), p);
        assert_eq!(vp.virtual_to_screen(p), p);
    }

    #[test]
    fn test_conversion_with_scroll_and_zoom() {
        let mut vp = Viewport::new();
        vp.scroll = Vec2::new(50.0, 100.0);
        vp.zoom = 2.0;
        let virt = vp.screen_to_virtual(Point::new(150.0, 300.0));
        assert!((virt.x - 50.0).abs() < f64::EPSILON);
        assert!((virt.y - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_roundtrip_conversion() {
        let mut vp = Viewport::new();
        vp.scroll = Vec2::new(30.0, -20.0);
        vp.zoom = 1.5;

        let original = Point::new(123.0, 456.0);
        let back = vp.virtual_to_screen(vp.screen_to_virtual(original));
        assert!((back.x - original.x).abs() < 1e-10);
        assert!((back.y - original.y).abs() < 1e-10);
    }

    #[test]
    fn test_snap_to_grid() {
        let mut vp = Viewport::new();
        vp.grid.snap_enabled = true;
        let snapped = vp.snap_to_grid(Point::new(27.0, 51.0));
        assert_eq!(snapped, Point::new(20.0, 60.0));
    }

    #[test]
    fn test_snap_disabled_is_noop() {
        let vp = Viewport::new();
        let p = Point::new(27.0, 51.0);
        assert_eq!(vp.snap_to_grid(p), p);
    }

    #[test]
    fn test_zoom_patch_keeps_anchor_fixed() {
        let mut vp = Viewport::new();
        vp.scroll = Vec2::new(40.0, -10.0);
        vp.zoom = 1.25;

        let anchor = Point::new(200.0, 150.0);
        let before = vp.screen_to_virtual(anchor);
        vp.apply_zoom(vp.zoom_patch(3.0, anchor));
        let after = vp.screen_to_virtual(anchor);

        assert!((vp.zoom - 3.0).abs() < f64::EPSILON);
        assert!((before.x - after.x).abs() < 1e-9);
        assert!((before.y - after.y).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_clamps_to_bounds() {
        let vp = Viewport::new();
        let patch = vp.zoom_patch(0.001, Point::ZERO);
        assert!((patch.zoom - MIN_ZOOM).abs() < f64::EPSILON);
        let patch = vp.zoom_patch(1000.0, Point::ZERO);
        assert!((patch.zoom - MAX_ZOOM).abs() < f64::EPSILON);
    }

    #[test]
    fn test_screen_center() {
        let vp = Viewport::new();
        assert_eq!(vp.screen_center(), Point::new(400.0, 300.0));
    }
}
