//! Slateboard Core Library
//!
//! Platform-agnostic interaction core for the Slateboard whiteboard:
//! element model, viewport math, hit testing and the pointer state machine.

pub mod controller;
pub mod element;
pub mod geometry;
pub mod handles;
pub mod hit;
pub mod scene;
pub mod transform;
pub mod viewport;

pub use controller::{
    ContextMenuAction, ContextMenuEntry, Controller, DebugProbe, Modifiers, RenderState,
    TextEditRequest, Tool, Usermode,
};
pub use element::{Element, ElementId, ElementKind, ElementPatch, FillKind, FillStyle, Rgba, ShapeKind};
pub use geometry::{
    invert_negative_box, is_path_closed, rotate_point_around, rotated_box_corners,
    surrounding_bounding_box, AxisFlip, BoundingBox,
};
pub use handles::{handles_for_box, hit_test_handles, HandleKind, TransformHandle};
pub use hit::{hit_test, intersects_box};
pub use scene::{Scene, SceneChange, SceneError, SubscriptionId};
pub use transform::TransformingElement;
pub use viewport::{Grid, Viewport, ZoomPatch, GRID_SIZE, MAX_ZOOM, MIN_ZOOM};
