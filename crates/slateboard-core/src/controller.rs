//! The pointer/wheel state machine.
//!
//! Raw input events come in here; the controller converts coordinates
//! through the viewport, consults hit testing, and drives scene mutations
//! through the transform engine. All handling is synchronous: one event is
//! fully applied and notified before the next is looked at.

use crate::element::{
    measure_text, Element, ElementId, ElementKind, ElementPatch, FillStyle, ShapeKind,
};
use crate::geometry::{invert_negative_box, BoundingBox};
use crate::handles::{handles_for_box, hit_test_handles, HandleKind, TransformHandle};
use crate::hit::{self, HIT_TOLERANCE};
use crate::scene::Scene;
use crate::transform::{drag_patch, resize_patches, rotate_patches};
use crate::viewport::Viewport;
use kurbo::{Point, Vec2};
use std::time::{Duration, Instant};

/// Screen-pixel slop below which a press-release pair counts as a click,
/// not a drag.
const DRAG_THRESHOLD: f64 = 2.0;

/// Two presses within this window and offset form a double click.
pub const DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(500);
pub const DOUBLE_CLICK_MAX_OFFSET: f64 = 5.0;

/// Wheel-to-zoom sensitivity.
const WHEEL_ZOOM_STEP: f64 = 0.001;

/// The controller's gesture state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Usermode {
    Idle,
    Creating,
    Dragging,
    Resizing,
    Rotating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    Selection,
    Rect,
    Ellipse,
    Freedraw,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
}

/// Snapshot of the active pointer gesture. Replaced wholesale on each
/// pointer-down, dropped on pointer-up; a stray move or up with no snapshot
/// present is ignored.
#[derive(Debug, Clone)]
struct PointerState {
    origin_screen: Point,
    offset: Vec2,
    occurred: bool,
    modifiers: Modifiers,
    hit_element: Option<ElementId>,
}

impl PointerState {
    fn new(screen: Point, modifiers: Modifiers, hit_element: Option<ElementId>) -> Self {
        Self {
            origin_screen: screen,
            offset: Vec2::ZERO,
            occurred: false,
            modifiers,
            hit_element,
        }
    }
}

/// Recognizes a second press close enough in time and space to the first.
#[derive(Debug, Default)]
pub struct DoubleClickResolver {
    last: Option<(Instant, Point)>,
}

impl DoubleClickResolver {
    /// Register a press; true if it completes a double click.
    pub fn register(&mut self, screen: Point) -> bool {
        self.register_at(screen, Instant::now())
    }

    fn register_at(&mut self, screen: Point, now: Instant) -> bool {
        let hit = self.last.is_some_and(|(at, pos)| {
            now.duration_since(at) <= DOUBLE_CLICK_WINDOW
                && pos.distance(screen) <= DOUBLE_CLICK_MAX_OFFSET
        });
        // A recognized double click resets the chain, so a triple press
        // does not count twice.
        self.last = if hit { None } else { Some((now, screen)) };
        hit
    }
}

/// Debug inspection hook, injected at construction. Scoped to the owning
/// controller rather than any process-wide state.
pub trait DebugProbe {
    fn usermode_changed(&mut self, mode: Usermode);
}

/// What the external text-edit overlay needs to mount itself.
#[derive(Debug, Clone, PartialEq)]
pub struct TextEditRequest {
    pub screen_position: Point,
    pub initial_text: String,
    pub font_size: f64,
    pub fill: FillStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextMenuAction {
    DeleteElement(ElementId),
    SelectAll,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextMenuEntry {
    pub label: &'static str,
    pub action: ContextMenuAction,
}

/// Everything a render consumer needs for one frame.
pub struct RenderState<'a> {
    pub elements: Vec<&'a Element>,
    pub selected: Vec<&'a Element>,
    pub viewport: &'a Viewport,
    pub marquee: Option<BoundingBox>,
    pub handles: Vec<TransformHandle>,
    pub hide_bounding_boxes: bool,
}

pub struct Controller {
    pub scene: Scene,
    pub viewport: Viewport,
    tool: Tool,
    usermode: Usermode,
    pointer: Option<PointerState>,
    /// Virtual-space press point of an in-progress marquee.
    marquee_origin: Option<Point>,
    marquee_box: Option<BoundingBox>,
    /// Group box and handle captured at resize start.
    resize_group: Option<(BoundingBox, HandleKind)>,
    /// Group center and initial pointer captured at rotate start.
    rotate_gesture: Option<(Point, Point)>,
    double_click: DoubleClickResolver,
    editing_text: Option<ElementId>,
    current_fill: FillStyle,
    probe: Option<Box<dyn DebugProbe>>,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller {
    pub fn new() -> Self {
        Self {
            scene: Scene::new(),
            viewport: Viewport::default(),
            tool: Tool::default(),
            usermode: Usermode::Idle,
            pointer: None,
            marquee_origin: None,
            marquee_box: None,
            resize_group: None,
            rotate_gesture: None,
            double_click: DoubleClickResolver::default(),
            editing_text: None,
            current_fill: FillStyle::default(),
            probe: None,
        }
    }

    pub fn with_probe(probe: Box<dyn DebugProbe>) -> Self {
        Self {
            probe: Some(probe),
            ..Self::new()
        }
    }

    pub fn usermode(&self) -> Usermode {
        self.usermode
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// The fill applied to newly created elements.
    pub fn set_current_fill(&mut self, fill: FillStyle) {
        self.current_fill = fill;
    }

    pub fn on_tool_change(&mut self, tool: Tool) {
        if tool != Tool::Selection {
            self.scene.unselect_all();
        }
        self.tool = tool;
        log::debug!("tool changed to {tool:?}");
    }

    fn set_usermode(&mut self, mode: Usermode) {
        if self.usermode != mode {
            log::debug!("usermode {:?} -> {:?}", self.usermode, mode);
            self.usermode = mode;
            if let Some(probe) = &mut self.probe {
                probe.usermode_changed(mode);
            }
        }
    }

    fn hit_tolerance(&self) -> f64 {
        HIT_TOLERANCE / self.viewport.zoom
    }

    pub fn pointer_down(&mut self, screen: Point, modifiers: Modifiers) {
        let virt = self.viewport.screen_to_virtual(screen);
        match self.tool {
            Tool::Selection => self.selection_down(screen, virt, modifiers),
            Tool::Rect => self.begin_shape(ShapeKind::Rect, screen, virt, modifiers),
            Tool::Ellipse => self.begin_shape(ShapeKind::Ellipse, screen, virt, modifiers),
            Tool::Freedraw => {
                let mut element = Element::freedraw(virt);
                element.fill = self.current_fill;
                let id = self.scene.add_element(element);
                self.scene.select_elements(&[id]);
                self.scene.begin_creating(id);
                self.pointer = Some(PointerState::new(screen, modifiers, Some(id)));
                self.set_usermode(Usermode::Creating);
            }
            Tool::Text => {
                let origin = self.viewport.snap_to_grid(virt);
                let mut element = Element::text(origin, String::new());
                element.fill = self.current_fill;
                let id = self.scene.add_element(element);
                self.scene.select_elements(&[id]);
                self.scene.begin_creating(id);
                self.editing_text = Some(id);
                self.pointer = Some(PointerState::new(screen, modifiers, Some(id)));
                self.set_usermode(Usermode::Creating);
            }
        }
    }

    fn begin_shape(&mut self, shape: ShapeKind, screen: Point, virt: Point, modifiers: Modifiers) {
        let origin = self.viewport.snap_to_grid(virt);
        let mut element = Element::shape(shape, origin);
        element.fill = self.current_fill;
        let id = self.scene.add_element(element);
        self.scene.select_elements(&[id]);
        self.scene.begin_creating(id);
        self.pointer = Some(PointerState::new(screen, modifiers, Some(id)));
        self.set_usermode(Usermode::Creating);
    }

    fn selection_down(&mut self, screen: Point, virt: Point, modifiers: Modifiers) {
        let is_double = self.double_click.register(screen);

        // Handles take priority over element bodies.
        if let Some(selection_box) = self.scene.selection_box() {
            let handles = handles_for_box(&selection_box, &self.viewport);
            match hit_test_handles(&handles, screen) {
                Some(HandleKind::Rotate) => {
                    self.scene.begin_transforming();
                    self.rotate_gesture = Some((selection_box.center(), virt));
                    self.pointer = Some(PointerState::new(screen, modifiers, None));
                    self.set_usermode(Usermode::Rotating);
                    return;
                }
                Some(handle) => {
                    self.scene.begin_transforming();
                    self.resize_group = Some((selection_box, handle));
                    self.pointer = Some(PointerState::new(screen, modifiers, None));
                    self.set_usermode(Usermode::Resizing);
                    return;
                }
                None => {}
            }
        }

        let hit = self.scene.element_at(virt, self.hit_tolerance()).map(|e| e.id());

        if is_double {
            if let Some(id) = hit {
                if self.scene.get(id).is_some_and(Element::is_text) {
                    self.scene.select_elements(&[id]);
                    self.editing_text = Some(id);
                    return;
                }
            }
        }

        match hit {
            Some(id) => {
                if modifiers.shift {
                    if self.scene.is_selected(id) {
                        self.scene.remove_from_selection(id);
                    } else {
                        self.scene.add_to_selection(id);
                    }
                    return;
                }
                if !self.scene.is_selected(id) {
                    self.scene.select_elements(&[id]);
                }
                self.scene.begin_dragging();
                self.pointer = Some(PointerState::new(screen, modifiers, Some(id)));
                self.set_usermode(Usermode::Dragging);
            }
            None => {
                if !modifiers.shift {
                    self.scene.unselect_all();
                }
                self.marquee_origin = Some(virt);
                self.pointer = Some(PointerState::new(screen, modifiers, None));
            }
        }
    }

    pub fn pointer_move(&mut self, screen: Point) {
        let Some(pointer) = &mut self.pointer else {
            return;
        };
        pointer.offset = screen - pointer.origin_screen;
        if pointer.offset.hypot() > DRAG_THRESHOLD {
            pointer.occurred = true;
        }
        let snap_rotation = pointer.modifiers.shift;
        let occurred = pointer.occurred;
        let offset = pointer.offset;
        let virt = self.viewport.screen_to_virtual(screen);

        match self.usermode {
            Usermode::Creating => self.creation_move(virt),
            Usermode::Dragging => {
                // Sub-threshold jitter is still a click; moving the
                // selection before the threshold would nudge it permanently
                // while pointer-up treats the gesture as a click.
                if !occurred {
                    return;
                }
                let mut delta = offset / self.viewport.zoom;
                if self.viewport.grid.snap_enabled {
                    let size = self.viewport.grid.size;
                    delta.x = (delta.x / size).round() * size;
                    delta.y = (delta.y / size).round() * size;
                }
                let patches: Vec<(ElementId, ElementPatch)> = self
                    .scene
                    .dragging()
                    .iter()
                    .map(|t| (t.id, drag_patch(t, delta)))
                    .collect();
                self.apply_patches(patches);
            }
            Usermode::Resizing => {
                if let Some((group, handle)) = self.resize_group {
                    let target = self.viewport.snap_to_grid(virt);
                    let patches = resize_patches(
                        self.scene.transforming(),
                        &group,
                        handle,
                        target,
                        self.viewport.grid.size,
                    );
                    self.apply_patches(patches);
                }
            }
            Usermode::Rotating => {
                if let Some((center, initial_pointer)) = self.rotate_gesture {
                    let patches = rotate_patches(
                        self.scene.transforming(),
                        center,
                        initial_pointer,
                        virt,
                        snap_rotation,
                    );
                    self.apply_patches(patches);
                }
            }
            Usermode::Idle => {
                if let Some(origin) = self.marquee_origin {
                    self.marquee_move(origin, virt);
                }
            }
        }
    }

    fn creation_move(&mut self, virt: Point) {
        let Some(id) = self.scene.creating() else {
            return;
        };
        let Some(element) = self.scene.get(id) else {
            return;
        };
        match &element.kind {
            ElementKind::Shape { .. } => {
                let target = self.viewport.snap_to_grid(virt);
                // Extents stay transiently negative while dragging up/left;
                // normalization happens on release.
                let patch = ElementPatch {
                    w: Some(target.x - element.x),
                    h: Some(target.y - element.y),
                    ..ElementPatch::default()
                };
                let _ = self.scene.mutate_element(id, &patch);
            }
            ElementKind::Freedraw { .. } => {
                // Route the point through a patch so the change is notified
                // like any other mutation.
                let mut extended = element.clone();
                extended.push_path_point(virt);
                let patch = ElementPatch {
                    points: extended.path_points().map(<[Point]>::to_vec),
                    w: Some(extended.w),
                    h: Some(extended.h),
                    ..ElementPatch::default()
                };
                let _ = self.scene.mutate_element(id, &patch);
            }
            ElementKind::Text { .. } => {}
        }
    }

    fn marquee_move(&mut self, origin: Point, virt: Point) {
        let raw = BoundingBox::new(origin.x, origin.y, virt.x - origin.x, virt.y - origin.y);
        let (marquee, _) = invert_negative_box(raw);
        // Recomputed from scratch against every element on each move; no
        // incremental diffing of the previous marquee result.
        let ids: Vec<ElementId> = self
            .scene
            .all_elements()
            .filter(|e| hit::intersects_box(e, &marquee))
            .map(Element::id)
            .collect();
        self.scene.select_elements(&ids);
        self.marquee_box = Some(marquee);
    }

    pub fn pointer_up(&mut self, _screen: Point) {
        let Some(pointer) = self.pointer.take() else {
            return;
        };

        match self.usermode {
            Usermode::Creating => self.finish_creation(),
            Usermode::Dragging => {
                if !pointer.occurred {
                    // A click, not a drag: collapse to the element under the
                    // cursor.
                    match pointer.hit_element {
                        Some(id) => self.scene.select_elements(&[id]),
                        None => self.scene.unselect_all(),
                    }
                }
                self.scene.end_gesture();
                self.set_usermode(Usermode::Idle);
            }
            Usermode::Resizing | Usermode::Rotating => {
                self.scene.end_gesture();
                self.resize_group = None;
                self.rotate_gesture = None;
                self.set_usermode(Usermode::Idle);
            }
            Usermode::Idle => {
                self.marquee_origin = None;
                self.marquee_box = None;
            }
        }
    }

    fn finish_creation(&mut self) {
        let Some(id) = self.scene.creating() else {
            self.set_usermode(Usermode::Idle);
            return;
        };
        let Some(element) = self.scene.get(id) else {
            self.scene.take_creating();
            self.set_usermode(Usermode::Idle);
            return;
        };

        // Text stays in Creating until the overlay submits.
        if element.is_text() {
            return;
        }

        let negligible_per_axis = self.viewport.grid.size / 2.0;
        let negligible = element.w.abs() < negligible_per_axis
            && element.h.abs() < negligible_per_axis;
        if negligible {
            log::debug!("discarding negligible element {id}");
            let _ = self.scene.delete_element(id);
            self.scene.take_creating();
            self.set_usermode(Usermode::Idle);
            return;
        }

        if !matches!(element.kind, ElementKind::Freedraw { .. }) {
            let raw = BoundingBox::new(element.x, element.y, element.w, element.h);
            let (bx, flip) = invert_negative_box(raw);
            let mut patch = ElementPatch::bounds(bx.x, bx.y, bx.w, bx.h);
            patch.flipped_x = Some(flip.x);
            patch.flipped_y = Some(flip.y);
            let _ = self.scene.mutate_element(id, &patch);
        }

        self.scene.take_creating();
        self.set_usermode(Usermode::Idle);
    }

    /// Ctrl/cmd + wheel zooms at the cursor. A plain wheel is not handled
    /// here; returns whether the event was consumed.
    pub fn wheel(&mut self, screen: Point, delta: f64, modifiers: Modifiers) -> bool {
        if !modifiers.ctrl {
            return false;
        }
        let target = self.viewport.zoom * (1.0 - delta * WHEEL_ZOOM_STEP);
        let patch = self.viewport.zoom_patch(target, screen);
        self.viewport.apply_zoom(patch);
        true
    }

    // External-surface glue.

    /// What the text overlay should mount with, if a text element is being
    /// edited or created.
    pub fn text_edit_request(&self) -> Option<TextEditRequest> {
        let id = self.editing_text?;
        let element = self.scene.get(id)?;
        let (content, font_size) = match &element.kind {
            ElementKind::Text { content, font_size } => (content.clone(), *font_size),
            _ => return None,
        };
        Some(TextEditRequest {
            screen_position: self
                .viewport
                .virtual_to_screen(Point::new(element.x, element.y)),
            initial_text: content,
            font_size,
            fill: element.fill,
        })
    }

    /// Live text value changed in the overlay; resize the element to fit.
    pub fn on_text_change(&mut self, value: &str) {
        if let Some(id) = self.editing_text {
            self.apply_text(id, value);
        }
    }

    /// Overlay submitted. Empty text deletes the element instead of keeping
    /// an invisible one.
    pub fn on_text_submit(&mut self, value: &str) {
        let Some(id) = self.editing_text.take() else {
            return;
        };
        if value.trim().is_empty() {
            let _ = self.scene.delete_element(id);
        } else {
            self.apply_text(id, value);
        }
        self.scene.take_creating();
        self.set_usermode(Usermode::Idle);
    }

    fn apply_text(&mut self, id: ElementId, value: &str) {
        let Some(element) = self.scene.get(id) else {
            return;
        };
        let font_size = match &element.kind {
            ElementKind::Text { font_size, .. } => *font_size,
            _ => return,
        };
        let (w, h) = measure_text(value, font_size);
        let patch = ElementPatch {
            content: Some(value.to_owned()),
            w: Some(w),
            h: Some(h),
            ..ElementPatch::default()
        };
        let _ = self.scene.mutate_element(id, &patch);
    }

    /// Batch style/geometry mutation from the design menu.
    pub fn on_design_menu_update(
        &mut self,
        ids: &[ElementId],
        patch: &ElementPatch,
    ) -> Result<(), crate::scene::SceneError> {
        self.scene.mutate_elements(ids, patch)
    }

    /// Entries for a context menu opened at a screen point.
    pub fn context_menu_entries(&self, screen: Point) -> Vec<ContextMenuEntry> {
        let virt = self.viewport.screen_to_virtual(screen);
        match self.scene.element_at(virt, self.hit_tolerance()) {
            Some(element) => vec![ContextMenuEntry {
                label: "Delete",
                action: ContextMenuAction::DeleteElement(element.id()),
            }],
            None => vec![ContextMenuEntry {
                label: "Select all",
                action: ContextMenuAction::SelectAll,
            }],
        }
    }

    pub fn on_context_menu_action(&mut self, action: ContextMenuAction) {
        match action {
            ContextMenuAction::DeleteElement(id) => {
                let _ = self.scene.delete_element(id);
            }
            ContextMenuAction::SelectAll => self.scene.select_all(),
        }
    }

    /// Abort the active gesture, restoring pre-gesture geometry.
    pub fn cancel(&mut self) {
        if let Some(id) = self.scene.take_creating() {
            let _ = self.scene.delete_element(id);
            self.editing_text = None;
        }
        let snapshots: Vec<Element> = self
            .scene
            .dragging()
            .iter()
            .chain(self.scene.transforming())
            .map(|t| t.initial.clone())
            .collect();
        for initial in snapshots {
            let mut patch = ElementPatch::bounds(initial.x, initial.y, initial.w, initial.h);
            patch.rotate = Some(initial.rotate);
            patch.flipped_x = Some(initial.flipped_x);
            patch.flipped_y = Some(initial.flipped_y);
            patch.points = initial.path_points().map(<[Point]>::to_vec);
            let _ = self.scene.mutate_element(initial.id(), &patch);
        }
        self.scene.end_gesture();
        self.pointer = None;
        self.marquee_origin = None;
        self.marquee_box = None;
        self.resize_group = None;
        self.rotate_gesture = None;
        self.set_usermode(Usermode::Idle);
    }

    /// Consistent frame state for the render consumer.
    pub fn render_state(&self) -> RenderState<'_> {
        let handles = match (self.usermode, self.scene.selection_box()) {
            (Usermode::Idle, Some(bx)) => handles_for_box(&bx, &self.viewport),
            _ => Vec::new(),
        };
        RenderState {
            elements: self.scene.all_elements().collect(),
            selected: self.scene.selected_elements(),
            viewport: &self.viewport,
            marquee: self.marquee_box,
            handles,
            hide_bounding_boxes: self.usermode != Usermode::Idle,
        }
    }

    fn apply_patches(&mut self, patches: Vec<(ElementId, ElementPatch)>) {
        for (id, patch) in patches {
            let _ = self.scene.mutate_element(id, &patch);
        }
    }
}
