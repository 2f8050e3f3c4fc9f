//! Transient pointer interaction state. Never sent to the host.

use crate::geometry::{BoundingBox, Handle, Point};
use crate::model::AnnotationId;

/// The active drag, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragMode {
    /// No drag in progress
    #[default]
    None,
    /// Translating the target box
    Move,
    /// Dragging one of the target box's handles
    Resize(Handle),
    /// Growing a new box from a fixed corner
    Create,
}

/// State of the drag in progress.
///
/// Created fresh on pointer-down and reset on pointer-up or image change.
#[derive(Debug, Clone, Default)]
pub struct InteractionState {
    /// What the current drag does
    pub mode: DragMode,
    /// Annotation being moved or resized
    pub target: Option<AnnotationId>,
    /// Pointer position at drag start, in image coordinates
    pub origin: Point,
    /// Box of the target when the drag started
    pub snapshot: Option<BoundingBox>,
    /// Box being created, not yet in the store
    pub draft: Option<BoundingBox>,
    /// Label the draft will get
    pub draft_label: usize,
}

impl InteractionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a drag is in progress.
    pub fn is_active(&self) -> bool {
        self.mode != DragMode::None
    }

    pub fn begin_move(&mut self, target: AnnotationId, origin: Point, snapshot: BoundingBox) {
        *self = Self {
            mode: DragMode::Move,
            target: Some(target),
            origin,
            snapshot: Some(snapshot),
            ..Self::default()
        };
    }

    pub fn begin_resize(
        &mut self,
        target: AnnotationId,
        handle: Handle,
        origin: Point,
        snapshot: BoundingBox,
    ) {
        *self = Self {
            mode: DragMode::Resize(handle),
            target: Some(target),
            origin,
            snapshot: Some(snapshot),
            ..Self::default()
        };
    }

    pub fn begin_create(&mut self, origin: Point, label_id: usize) {
        *self = Self {
            mode: DragMode::Create,
            origin,
            draft: Some(BoundingBox::new(origin.x, origin.y, 0.0, 0.0)),
            draft_label: label_id,
            ..Self::default()
        };
    }

    /// Drop all drag state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_create_starts_zero_size() {
        let mut state = InteractionState::new();
        state.begin_create(Point::new(200.0, 200.0), 1);
        assert!(state.is_active());
        assert_eq!(state.mode, DragMode::Create);
        assert_eq!(state.draft, Some(BoundingBox::new(200.0, 200.0, 0.0, 0.0)));
        assert_eq!(state.draft_label, 1);
        assert_eq!(state.target, None);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut state = InteractionState::new();
        let snapshot = BoundingBox::new(0.0, 0.0, 5.0, 5.0);
        state.begin_resize(3, Handle::Left, Point::new(1.0, 2.0), snapshot);
        state.reset();
        assert!(!state.is_active());
        assert_eq!(state.target, None);
        assert_eq!(state.snapshot, None);
    }
}
