//! Pointer and keyboard handling for the annotation canvas.
//!
//! The controller is a small state machine over [`DragMode`]:
//!
//! ```text
//! None --down on empty------> Create --up--> None (commit, or discard if tiny)
//! None --down on box body---> Move   --up--> None (commit)
//! None --down on a handle---> Resize --up--> None (commit)
//! ```
//!
//! Moves during a drag only preview the box in the store; the single commit
//! happens on pointer-up. Pointer positions arrive in display coordinates and
//! are converted with the current [`DisplayTransform`].

use crate::constants::{HANDLE_HIT_RADIUS, MIN_BOX_SIZE};
use crate::error::{EditError, ValidationError};
use crate::geometry::{BoundingBox, DisplayTransform, HitTarget, Point, hit_test_handle};
use crate::model::AnnotationId;
use crate::state::{AnnotationStore, DragMode, InteractionState};

/// Pointer input in display coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// Primary button pressed
    Down(Point),
    /// Pointer moved (with or without a button held)
    Move(Point),
    /// Primary button released
    Up(Point),
}

/// Keys the canvas reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Delete,
    Backspace,
    Escape,
    Space,
    Other,
}

/// What a pointer-down on a box does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditMode {
    /// Create, move and resize boxes
    #[default]
    Transform,
    /// Clicking a box deletes it
    Delete,
}

impl EditMode {
    /// Get the display name for this mode.
    pub fn name(&self) -> &'static str {
        match self {
            EditMode::Transform => "Transform",
            EditMode::Delete => "Del",
        }
    }
}

/// Result of feeding one event to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    /// The event had no effect
    Ignored,
    /// State changed; the store flags say whether to redraw and sync
    Handled,
    /// The user asked to send the current list to the host now
    Submit,
}

/// Tunables for hit testing and box creation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerSettings {
    /// Handle hit radius in display pixels
    pub handle_radius: f32,
    /// Created boxes below this width or height (image pixels) are discarded
    pub min_box_size: f32,
    /// Space submits the current list
    pub use_space: bool,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            handle_radius: HANDLE_HIT_RADIUS,
            min_box_size: MIN_BOX_SIZE,
            use_space: false,
        }
    }
}

/// Turns raw input into store mutations.
#[derive(Debug, Clone, Default)]
pub struct Controller {
    interaction: InteractionState,
    mode: EditMode,
    current_label: usize,
    settings: ControllerSettings,
}

impl Controller {
    pub fn new(settings: ControllerSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    /// Label given to newly created boxes.
    pub fn current_label(&self) -> usize {
        self.current_label
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    /// Switch edit mode, abandoning any drag in progress.
    pub fn set_mode(&mut self, mode: EditMode, store: &mut AnnotationStore) {
        if self.mode != mode {
            log::debug!("Edit mode: {}", mode.name());
            self.cancel_drag(store);
            self.mode = mode;
        }
    }

    /// Forget drag state and fall back to label 0 (image change).
    pub fn reset(&mut self) {
        self.interaction.reset();
        self.current_label = 0;
    }

    /// Dispatch a pointer event.
    pub fn handle_pointer(
        &mut self,
        event: PointerEvent,
        store: &mut AnnotationStore,
        transform: &DisplayTransform,
    ) -> Response {
        let Some((image_w, image_h)) = store.image_size() else {
            log::trace!("Ignoring {:?}: image size unknown", event);
            return Response::Ignored;
        };

        log::trace!("Pointer {:?}, drag={:?}", event, self.interaction.mode);

        match event {
            PointerEvent::Down(pos) => self.pointer_down(pos, store, transform, image_w, image_h),
            PointerEvent::Move(pos) => self.pointer_move(pos, store, transform, image_w, image_h),
            PointerEvent::Up(pos) => {
                self.pointer_move(pos, store, transform, image_w, image_h);
                self.pointer_up(store)
            }
        }
    }

    fn pointer_down(
        &mut self,
        pos: Point,
        store: &mut AnnotationStore,
        transform: &DisplayTransform,
        image_w: f32,
        image_h: f32,
    ) -> Response {
        // A down without the matching up (pointer left the canvas) ends the old drag first
        if self.interaction.is_active() {
            log::warn!("Pointer down while a drag is active - finishing it first");
            self.pointer_up(store);
        }

        let image_pos = transform.display_to_image(pos);

        if self.mode == EditMode::Delete {
            return match store.hit_test(&image_pos) {
                Some(id) => {
                    store.remove(id);
                    log::info!("Deleted annotation {}", id);
                    Response::Handled
                }
                None => Response::Ignored,
            };
        }

        if let Some((id, target)) = self.hit_annotation(pos, store, transform) {
            let Some(snapshot) = store.get(id).map(|a| a.bbox) else {
                return Response::Ignored;
            };
            self.select(id, store);
            match target {
                HitTarget::Handle(handle) => {
                    log::debug!("Resize start on annotation {}, handle={:?}", id, handle);
                    self.interaction.begin_resize(id, handle, image_pos, snapshot);
                }
                HitTarget::Body => {
                    log::debug!("Move start on annotation {}", id);
                    self.interaction.begin_move(id, image_pos, snapshot);
                }
            }
            return Response::Handled;
        }

        store.select(None);
        let origin = clamp_point(image_pos, image_w, image_h);
        self.interaction.begin_create(origin, self.current_label);
        store.mark_dirty();
        log::debug!("Create start at ({:.1}, {:.1})", origin.x, origin.y);
        Response::Handled
    }

    /// Find what the pointer is over: the selected box first, then the rest
    /// from top-most down.
    fn hit_annotation(
        &self,
        pos: Point,
        store: &AnnotationStore,
        transform: &DisplayTransform,
    ) -> Option<(AnnotationId, HitTarget)> {
        let selected = store.selected().and_then(|id| store.get(id));
        let others = store.iter().rev().filter(|a| Some(a.id) != store.selected());

        selected.into_iter().chain(others).find_map(|annotation| {
            let display_box = transform.box_to_display(&annotation.bbox);
            hit_test_handle(pos, &display_box, self.settings.handle_radius)
                .map(|target| (annotation.id, target))
        })
    }

    fn pointer_move(
        &mut self,
        pos: Point,
        store: &mut AnnotationStore,
        transform: &DisplayTransform,
        image_w: f32,
        image_h: f32,
    ) -> Response {
        let image_pos = transform.display_to_image(pos);
        let (dx, dy) = image_pos.delta_from(&self.interaction.origin);

        match self.interaction.mode {
            DragMode::None => Response::Ignored,
            DragMode::Create => {
                let corner = clamp_point(image_pos, image_w, image_h);
                self.interaction.draft =
                    Some(BoundingBox::from_corners(self.interaction.origin, corner));
                store.mark_dirty();
                Response::Handled
            }
            DragMode::Move => {
                let (Some(id), Some(snapshot)) =
                    (self.interaction.target, self.interaction.snapshot)
                else {
                    return Response::Ignored;
                };
                let moved = snapshot.translate_within(dx, dy, image_w, image_h);
                self.preview(store, id, moved)
            }
            DragMode::Resize(handle) => {
                let (Some(id), Some(snapshot)) =
                    (self.interaction.target, self.interaction.snapshot)
                else {
                    return Response::Ignored;
                };
                let resized = snapshot.resize(handle, dx, dy);
                self.preview(store, id, resized)
            }
        }
    }

    fn preview(
        &self,
        store: &mut AnnotationStore,
        id: AnnotationId,
        bbox: BoundingBox,
    ) -> Response {
        match store.preview_box(id, bbox) {
            Ok(true) => Response::Handled,
            Ok(false) => Response::Ignored,
            // Keep the last valid frame rather than show a collapsed box
            Err(EditError::Degenerate) => Response::Ignored,
            Err(e) => {
                log::warn!("Preview of annotation {} rejected: {}", id, e);
                Response::Ignored
            }
        }
    }

    fn pointer_up(&mut self, store: &mut AnnotationStore) -> Response {
        let interaction = std::mem::take(&mut self.interaction);

        match interaction.mode {
            DragMode::None => Response::Ignored,
            DragMode::Create => {
                let Some(draft) = interaction.draft else {
                    return Response::Ignored;
                };
                store.mark_dirty();
                let min = self.settings.min_box_size;
                if draft.width < min || draft.height < min {
                    log::debug!("Discarding tiny box {:?}", draft);
                    return Response::Handled;
                }
                match store.add_annotation(draft, interaction.draft_label) {
                    Ok(id) => {
                        store.select(Some(id));
                        log::info!("Created annotation {} {:?}", id, draft);
                        Response::Handled
                    }
                    Err(e) => {
                        log::debug!("Discarding new box {:?}: {}", draft, e);
                        Response::Handled
                    }
                }
            }
            DragMode::Move | DragMode::Resize(_) => {
                let current = interaction.target.and_then(|id| store.get(id)).map(|a| a.bbox);
                if current.is_some() && current != interaction.snapshot {
                    store.commit();
                    log::info!("Committed edit of annotation {:?}", interaction.target);
                }
                Response::Handled
            }
        }
    }

    /// Abandon the drag in progress, restoring the original box.
    fn cancel_drag(&mut self, store: &mut AnnotationStore) {
        let interaction = std::mem::take(&mut self.interaction);
        if let (Some(id), Some(snapshot)) = (interaction.target, interaction.snapshot) {
            let _ = store.preview_box(id, snapshot);
        }
        if interaction.is_active() {
            store.mark_dirty();
        }
    }

    /// Dispatch a key press.
    pub fn handle_key(&mut self, key: Key, store: &mut AnnotationStore) -> Response {
        match key {
            Key::Delete | Key::Backspace => {
                if self.interaction.is_active() {
                    return Response::Ignored;
                }
                match store.selected() {
                    Some(id) => {
                        store.remove(id);
                        log::info!("Deleted annotation {}", id);
                        Response::Handled
                    }
                    None => Response::Ignored,
                }
            }
            Key::Escape => {
                let was_active = self.interaction.is_active();
                self.cancel_drag(store);
                let had_selection = store.selected().is_some();
                store.select(None);
                if was_active || had_selection {
                    Response::Handled
                } else {
                    Response::Ignored
                }
            }
            Key::Space if self.settings.use_space => Response::Submit,
            Key::Space | Key::Other => Response::Ignored,
        }
    }

    /// Pick the label for new boxes; relabels the selected box too.
    ///
    /// Invalid ids are rejected and nothing changes.
    pub fn select_label(
        &mut self,
        label_id: i64,
        store: &mut AnnotationStore,
    ) -> Result<(), ValidationError> {
        let label = store.labels().validate(label_id)?;
        self.current_label = label;
        if let Some(id) = store.selected() {
            store.update_label(id, label_id)?;
            log::info!("Relabeled annotation {} to {}", id, label);
        }
        Ok(())
    }

    fn select(&mut self, id: AnnotationId, store: &mut AnnotationStore) {
        store.select(Some(id));
        if let Some(annotation) = store.get(id) {
            self.current_label = annotation.label_id;
        }
    }
}

fn clamp_point(point: Point, width: f32, height: f32) -> Point {
    Point::new(point.x.clamp(0.0, width), point.y.clamp(0.0, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LabelList;

    fn setup() -> (Controller, AnnotationStore, DisplayTransform) {
        let mut store = AnnotationStore::new(LabelList::new(["deer", "human"]));
        store.set_image_size(Some((1000.0, 800.0)));
        (Controller::new(ControllerSettings::default()), store, DisplayTransform::identity())
    }

    fn drag(
        controller: &mut Controller,
        store: &mut AnnotationStore,
        t: &DisplayTransform,
        from: (f32, f32),
        to: (f32, f32),
    ) {
        controller.handle_pointer(PointerEvent::Down(Point::new(from.0, from.1)), store, t);
        let mid = Point::new((from.0 + to.0) / 2.0, (from.1 + to.1) / 2.0);
        controller.handle_pointer(PointerEvent::Move(mid), store, t);
        controller.handle_pointer(PointerEvent::Move(Point::new(to.0, to.1)), store, t);
        controller.handle_pointer(PointerEvent::Up(Point::new(to.0, to.1)), store, t);
    }

    #[test]
    fn test_create_drag_commits_once() {
        let (mut c, mut store, t) = setup();

        c.handle_pointer(PointerEvent::Down(Point::new(100.0, 100.0)), &mut store, &t);
        assert_eq!(c.interaction().mode, DragMode::Create);
        c.handle_pointer(PointerEvent::Move(Point::new(150.0, 140.0)), &mut store, &t);
        assert!(!store.take_pending_commit());
        c.handle_pointer(PointerEvent::Move(Point::new(200.0, 180.0)), &mut store, &t);
        assert!(!store.take_pending_commit());
        c.handle_pointer(PointerEvent::Up(Point::new(200.0, 180.0)), &mut store, &t);

        assert!(store.take_pending_commit());
        assert_eq!(store.len(), 1);
        let ann = store.iter().next().unwrap();
        assert_eq!(ann.bbox, BoundingBox::new(100.0, 100.0, 100.0, 80.0));
        assert_eq!(store.selected(), Some(ann.id));
        assert_eq!(c.interaction().mode, DragMode::None);
    }

    #[test]
    fn test_create_backwards_normalizes() {
        let (mut c, mut store, t) = setup();
        drag(&mut c, &mut store, &t, (300.0, 300.0), (250.0, 200.0));
        assert_eq!(store.iter().next().unwrap().bbox, BoundingBox::new(250.0, 200.0, 50.0, 100.0));
    }

    #[test]
    fn test_create_clamps_to_image() {
        let (mut c, mut store, t) = setup();
        drag(&mut c, &mut store, &t, (900.0, 700.0), (1500.0, 1200.0));
        assert_eq!(store.iter().next().unwrap().bbox, BoundingBox::new(900.0, 700.0, 100.0, 100.0));
    }

    #[test]
    fn test_tiny_create_is_discarded() {
        let (mut c, mut store, t) = setup();
        drag(&mut c, &mut store, &t, (200.0, 200.0), (205.0, 202.0));
        assert!(store.is_empty());
        assert!(!store.take_pending_commit());
    }

    #[test]
    fn test_create_uses_current_label() {
        let (mut c, mut store, t) = setup();
        c.select_label(1, &mut store).unwrap();
        drag(&mut c, &mut store, &t, (10.0, 10.0), (60.0, 60.0));
        assert_eq!(store.iter().next().unwrap().label_id, 1);
    }

    #[test]
    fn test_move_translates_and_stays_inside() {
        let (mut c, mut store, t) = setup();
        let id = store.add_annotation(BoundingBox::new(100.0, 100.0, 50.0, 50.0), 0).unwrap();
        store.take_pending_commit();

        drag(&mut c, &mut store, &t, (120.0, 120.0), (140.0, 110.0));
        assert_eq!(store.get(id).unwrap().bbox, BoundingBox::new(120.0, 90.0, 50.0, 50.0));
        assert!(store.take_pending_commit());

        // Dragging far past the edge pins the box to the border
        drag(&mut c, &mut store, &t, (130.0, 100.0), (5000.0, 100.0));
        assert_eq!(store.get(id).unwrap().bbox, BoundingBox::new(950.0, 90.0, 50.0, 50.0));
    }

    #[test]
    fn test_move_small_box_by_center() {
        let (mut c, mut store, t) = setup();
        let id = store.add_annotation(BoundingBox::new(100.0, 100.0, 12.0, 12.0), 0).unwrap();
        store.take_pending_commit();

        c.handle_pointer(PointerEvent::Down(Point::new(106.0, 106.0)), &mut store, &t);
        assert_eq!(c.interaction().mode, DragMode::Move);
        c.handle_pointer(PointerEvent::Move(Point::new(156.0, 136.0)), &mut store, &t);
        c.handle_pointer(PointerEvent::Up(Point::new(156.0, 136.0)), &mut store, &t);

        assert_eq!(store.get(id).unwrap().bbox, BoundingBox::new(150.0, 130.0, 12.0, 12.0));
        assert!(store.take_pending_commit());
    }

    #[test]
    fn test_overlapping_boxes_pick_top_most() {
        let (mut c, mut store, t) = setup();
        let below = store.add_annotation(BoundingBox::new(100.0, 100.0, 200.0, 200.0), 0).unwrap();
        let above = store.add_annotation(BoundingBox::new(150.0, 150.0, 200.0, 200.0), 1).unwrap();
        store.select(None);

        c.handle_pointer(PointerEvent::Down(Point::new(200.0, 200.0)), &mut store, &t);
        assert_eq!(c.interaction().mode, DragMode::Move);
        assert_eq!(store.selected(), Some(above));
        c.handle_pointer(PointerEvent::Up(Point::new(200.0, 200.0)), &mut store, &t);

        // Only the lower box is under this point
        c.handle_pointer(PointerEvent::Down(Point::new(120.0, 120.0)), &mut store, &t);
        assert_eq!(store.selected(), Some(below));
    }

    #[test]
    fn test_click_without_motion_selects_without_commit() {
        let (mut c, mut store, t) = setup();
        let id = store.add_annotation(BoundingBox::new(100.0, 100.0, 50.0, 50.0), 1).unwrap();
        store.take_pending_commit();
        store.select(None);

        c.handle_pointer(PointerEvent::Down(Point::new(120.0, 120.0)), &mut store, &t);
        c.handle_pointer(PointerEvent::Up(Point::new(120.0, 120.0)), &mut store, &t);

        assert_eq!(store.selected(), Some(id));
        assert_eq!(c.current_label(), 1);
        assert!(!store.take_pending_commit());
    }

    #[test]
    fn test_resize_handle() {
        let (mut c, mut store, t) = setup();
        let id = store.add_annotation(BoundingBox::new(100.0, 100.0, 100.0, 100.0), 0).unwrap();
        store.select(Some(id));

        drag(&mut c, &mut store, &t, (200.0, 200.0), (250.0, 260.0));
        assert_eq!(store.get(id).unwrap().bbox, BoundingBox::new(100.0, 100.0, 150.0, 160.0));
    }

    #[test]
    fn test_resize_past_opposite_edge_keeps_last_valid_box() {
        let (mut c, mut store, t) = setup();
        let id = store.add_annotation(BoundingBox::new(100.0, 100.0, 100.0, 100.0), 0).unwrap();
        store.select(Some(id));

        c.handle_pointer(PointerEvent::Down(Point::new(200.0, 150.0)), &mut store, &t);
        assert_eq!(c.interaction().mode, DragMode::Resize(crate::geometry::Handle::Right));
        c.handle_pointer(PointerEvent::Move(Point::new(150.0, 150.0)), &mut store, &t);
        c.handle_pointer(PointerEvent::Move(Point::new(50.0, 150.0)), &mut store, &t);
        c.handle_pointer(PointerEvent::Up(Point::new(50.0, 150.0)), &mut store, &t);

        let bbox = store.get(id).unwrap().bbox;
        assert_eq!(bbox, BoundingBox::new(100.0, 100.0, 50.0, 100.0));
        assert!(bbox.width > 0.0 && bbox.height > 0.0);
    }

    #[test]
    fn test_pointer_uses_display_transform() {
        let (mut c, mut store, _) = setup();
        let half = DisplayTransform::for_display_width(500.0, 1000.0);
        drag(&mut c, &mut store, &half, (50.0, 50.0), (100.0, 75.0));
        assert_eq!(store.iter().next().unwrap().bbox, BoundingBox::new(100.0, 100.0, 100.0, 50.0));
    }

    #[test]
    fn test_delete_key_removes_selected() {
        let (mut c, mut store, _) = setup();
        let a = store.add_annotation(BoundingBox::new(0.0, 0.0, 50.0, 50.0), 0).unwrap();
        let b = store.add_annotation(BoundingBox::new(100.0, 0.0, 50.0, 50.0), 1).unwrap();
        store.take_pending_commit();

        assert_eq!(c.handle_key(Key::Delete, &mut store), Response::Ignored);
        store.select(Some(a));
        assert_eq!(c.handle_key(Key::Backspace, &mut store), Response::Handled);
        assert!(store.take_pending_commit());
        assert!(store.get(a).is_none());
        assert!(store.get(b).is_some());
        assert_eq!(store.selected(), None);
    }

    #[test]
    fn test_delete_mode_click_removes() {
        let (mut c, mut store, t) = setup();
        let id = store.add_annotation(BoundingBox::new(0.0, 0.0, 50.0, 50.0), 0).unwrap();
        c.set_mode(EditMode::Delete, &mut store);

        let miss = c.handle_pointer(PointerEvent::Down(Point::new(500.0, 500.0)), &mut store, &t);
        assert_eq!(miss, Response::Ignored);
        assert_eq!(store.len(), 1);
        c.handle_pointer(PointerEvent::Down(Point::new(25.0, 25.0)), &mut store, &t);
        assert!(store.get(id).is_none());
    }

    #[test]
    fn test_escape_cancels_drag() {
        let (mut c, mut store, t) = setup();
        let id = store.add_annotation(BoundingBox::new(100.0, 100.0, 50.0, 50.0), 0).unwrap();
        store.take_pending_commit();

        c.handle_pointer(PointerEvent::Down(Point::new(120.0, 120.0)), &mut store, &t);
        c.handle_pointer(PointerEvent::Move(Point::new(300.0, 300.0)), &mut store, &t);
        assert_ne!(store.get(id).unwrap().bbox.x, 100.0);

        c.handle_key(Key::Escape, &mut store);
        assert_eq!(store.get(id).unwrap().bbox, BoundingBox::new(100.0, 100.0, 50.0, 50.0));
        assert_eq!(store.selected(), None);
        assert!(!store.take_pending_commit());
    }

    #[test]
    fn test_space_submits_only_when_enabled() {
        let (mut c, mut store, _) = setup();
        assert_eq!(c.handle_key(Key::Space, &mut store), Response::Ignored);

        let mut c = Controller::new(ControllerSettings {
            use_space: true,
            ..ControllerSettings::default()
        });
        assert_eq!(c.handle_key(Key::Space, &mut store), Response::Submit);
    }

    #[test]
    fn test_select_label_relabels_selection() {
        let (mut c, mut store, _) = setup();
        let id = store.add_annotation(BoundingBox::new(0.0, 0.0, 50.0, 50.0), 0).unwrap();
        store.select(Some(id));
        store.take_pending_commit();

        assert!(c.select_label(99, &mut store).is_err());
        assert_eq!(store.get(id).unwrap().label_id, 0);
        assert_eq!(c.current_label(), 0);
        assert!(!store.take_pending_commit());

        c.select_label(1, &mut store).unwrap();
        assert_eq!(store.get(id).unwrap().label_id, 1);
        assert!(store.take_pending_commit());
    }

    #[test]
    fn test_unsized_image_ignores_pointer() {
        let mut store = AnnotationStore::new(LabelList::new(["deer"]));
        let mut c = Controller::default();
        let t = DisplayTransform::identity();
        let r = c.handle_pointer(PointerEvent::Down(Point::new(10.0, 10.0)), &mut store, &t);
        assert_eq!(r, Response::Ignored);
        assert!(!c.interaction().is_active());
    }
}
