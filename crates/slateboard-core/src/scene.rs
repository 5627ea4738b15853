//! Scene store: the element collection, z-order, selection set, in-flight
//! gesture snapshots and change subscriptions.

use crate::element::{Element, ElementId, ElementPatch};
use crate::geometry::{surrounding_bounding_box, BoundingBox};
use crate::hit;
use crate::transform::TransformingElement;
use kurbo::Point;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("element {0} not found in scene")]
    NotFound(ElementId),
}

/// What a mutation touched, delivered synchronously to subscribers after
/// the mutation has been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneChange {
    pub ids: Vec<ElementId>,
    pub fields: Vec<&'static str>,
}

pub type SubscriptionId = u64;
type Listener = Box<dyn FnMut(&SceneChange)>;

/// The element layer.
///
/// Elements live in a map keyed by id; `z_order` holds ids back-to-front.
/// The selection keeps click order, which is distinct from scene order.
#[derive(Default)]
pub struct Scene {
    elements: HashMap<ElementId, Element>,
    z_order: Vec<ElementId>,
    selection: Vec<ElementId>,
    creating: Option<ElementId>,
    dragging: Vec<TransformingElement>,
    transforming: Vec<TransformingElement>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: SubscriptionId,
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("elements", &self.elements.len())
            .field("z_order", &self.z_order)
            .field("selection", &self.selection)
            .field("creating", &self.creating)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an element on top of the stack and return its id.
    pub fn add_element(&mut self, element: Element) -> ElementId {
        let id = element.id();
        log::trace!("add element {id}");
        self.elements.insert(id, element);
        self.z_order.push(id);
        self.notify(SceneChange {
            ids: vec![id],
            fields: vec!["added"],
        });
        id
    }

    pub fn delete_element(&mut self, id: ElementId) -> Result<(), SceneError> {
        if self.elements.remove(&id).is_none() {
            return Err(SceneError::NotFound(id));
        }
        log::trace!("remove element {id}");
        self.z_order.retain(|&z| z != id);
        self.selection.retain(|&s| s != id);
        if self.creating == Some(id) {
            self.creating = None;
        }
        self.notify(SceneChange {
            ids: vec![id],
            fields: vec!["removed"],
        });
        Ok(())
    }

    pub fn delete_selected(&mut self) {
        for id in std::mem::take(&mut self.selection) {
            // Ids came from the selection, so they exist.
            let _ = self.delete_element(id);
        }
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    /// Apply a patch to one element. `None` fields are left untouched.
    pub fn mutate_element(&mut self, id: ElementId, patch: &ElementPatch) -> Result<(), SceneError> {
        self.mutate_elements(&[id], patch)
    }

    /// Apply one patch to several elements, with a single notification
    /// covering the whole batch.
    pub fn mutate_elements(
        &mut self,
        ids: &[ElementId],
        patch: &ElementPatch,
    ) -> Result<(), SceneError> {
        for &id in ids {
            let element = self
                .elements
                .get_mut(&id)
                .ok_or(SceneError::NotFound(id))?;
            patch.apply(element);
        }
        self.notify(SceneChange {
            ids: ids.to_vec(),
            fields: patch.field_names(),
        });
        Ok(())
    }

    /// Replace the selection. Order of `ids` is preserved as click order;
    /// unknown ids are dropped.
    pub fn select_elements(&mut self, ids: &[ElementId]) {
        let mut changed = std::mem::take(&mut self.selection);
        for &id in &changed {
            if let Some(e) = self.elements.get_mut(&id) {
                e.selected = false;
            }
        }
        for &id in ids {
            if let Some(e) = self.elements.get_mut(&id) {
                if !e.selected {
                    e.selected = true;
                    self.selection.push(id);
                    if !changed.contains(&id) {
                        changed.push(id);
                    }
                }
            }
        }
        if !changed.is_empty() {
            self.notify(SceneChange {
                ids: changed,
                fields: vec!["selected"],
            });
        }
    }

    /// Add one element to the selection, keeping the existing set.
    pub fn add_to_selection(&mut self, id: ElementId) {
        if let Some(e) = self.elements.get_mut(&id) {
            if !e.selected {
                e.selected = true;
                self.selection.push(id);
                self.notify(SceneChange {
                    ids: vec![id],
                    fields: vec!["selected"],
                });
            }
        }
    }

    pub fn remove_from_selection(&mut self, id: ElementId) {
        if let Some(e) = self.elements.get_mut(&id) {
            if e.selected {
                e.selected = false;
                self.selection.retain(|&s| s != id);
                self.notify(SceneChange {
                    ids: vec![id],
                    fields: vec!["selected"],
                });
            }
        }
    }

    pub fn is_selected(&self, id: ElementId) -> bool {
        self.selection.contains(&id)
    }

    pub fn unselect_all(&mut self) {
        self.select_elements(&[]);
    }

    pub fn select_all(&mut self) {
        let all: Vec<ElementId> = self.z_order.clone();
        self.select_elements(&all);
    }

    /// Selected ids in click order.
    pub fn selection(&self) -> &[ElementId] {
        &self.selection
    }

    /// All elements back-to-front.
    pub fn all_elements(&self) -> impl Iterator<Item = &Element> {
        self.z_order.iter().filter_map(|id| self.elements.get(id))
    }

    /// Selected elements in scene (z) order, not click order.
    pub fn selected_elements(&self) -> Vec<&Element> {
        self.all_elements().filter(|e| e.selected).collect()
    }

    /// The axis-aligned box around the whole selection.
    pub fn selection_box(&self) -> Option<BoundingBox> {
        let boxes: Vec<BoundingBox> = self
            .selected_elements()
            .iter()
            .map(|e| e.bounding_box())
            .collect();
        if boxes.is_empty() {
            None
        } else {
            Some(surrounding_bounding_box(&boxes))
        }
    }

    /// Topmost element under a virtual-space point.
    pub fn element_at(&self, point: Point, tolerance: f64) -> Option<&Element> {
        self.z_order
            .iter()
            .rev()
            .filter_map(|id| self.elements.get(id))
            .find(|e| hit::hit_test(e, point, tolerance))
    }

    // Gesture slots. These hold the pre-gesture snapshots the transform
    // engine computes against; the live elements keep mutating underneath.

    pub fn begin_creating(&mut self, id: ElementId) {
        self.creating = Some(id);
    }

    pub fn creating(&self) -> Option<ElementId> {
        self.creating
    }

    pub fn take_creating(&mut self) -> Option<ElementId> {
        self.creating.take()
    }

    /// Snapshot the current selection for a drag gesture.
    pub fn begin_dragging(&mut self) {
        self.dragging = self.snapshot_selection();
    }

    pub fn dragging(&self) -> &[TransformingElement] {
        &self.dragging
    }

    /// Snapshot the current selection for a resize/rotate gesture.
    pub fn begin_transforming(&mut self) {
        self.transforming = self.snapshot_selection();
    }

    pub fn transforming(&self) -> &[TransformingElement] {
        &self.transforming
    }

    pub fn end_gesture(&mut self) {
        self.dragging.clear();
        self.transforming.clear();
    }

    fn snapshot_selection(&self) -> Vec<TransformingElement> {
        self.selected_elements()
            .into_iter()
            .map(TransformingElement::new)
            .collect()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&SceneChange) + 'static) -> SubscriptionId {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.listeners.retain(|(sid, _)| *sid != id);
    }

    fn notify(&mut self, change: SceneChange) {
        for (_, listener) in &mut self.listeners {
            listener(&change);
        }
    }
}
