//! The authoritative annotation list for the image on screen.

use crate::error::{EditError, ValidationError};
use crate::geometry::BoundingBox;
use crate::model::{Annotation, AnnotationId, BboxRecord, LabelList};

/// Ordered annotations plus selection for a single image.
///
/// Two flags drive the widget loop:
/// - `dirty` asks for a redraw and is set by every change, previews included.
/// - `pending_commit` asks the bridge to sync and is set only by committed
///   mutations, so intermediate drag frames never reach the host.
#[derive(Debug, Clone)]
pub struct AnnotationStore {
    /// Annotations in insertion order
    annotations: Vec<Annotation>,
    /// Labels the ids index into
    labels: LabelList,
    /// Image size used for clamping, when known
    image_size: Option<(f32, f32)>,
    /// Counter for generating unique annotation IDs
    next_id: AnnotationId,
    /// Currently selected annotation ID
    selected_id: Option<AnnotationId>,
    dirty: bool,
    pending_commit: bool,
}

impl AnnotationStore {
    pub fn new(labels: LabelList) -> Self {
        Self {
            annotations: Vec::new(),
            labels,
            image_size: None,
            next_id: 1,
            selected_id: None,
            dirty: true, // Start dirty so the first frame is drawn
            pending_commit: false,
        }
    }

    /// Replace the whole list from parallel `bboxes`/`labels` arrays.
    ///
    /// Mismatched lengths are a caller bug; the bridge rejects them before we
    /// get here, so this only guards by leaving the list empty. Does not
    /// commit: the host already knows these boxes.
    pub fn initialize(&mut self, bboxes: &[BoundingBox], label_ids: &[usize], labels: LabelList) {
        self.annotations.clear();
        self.selected_id = None;
        self.labels = labels;
        self.dirty = true;
        self.pending_commit = false;

        if bboxes.len() != label_ids.len() {
            log::warn!(
                "Ignoring initial boxes: {} boxes but {} labels",
                bboxes.len(),
                label_ids.len()
            );
            return;
        }

        for (bbox, &label_id) in bboxes.iter().zip(label_ids) {
            let Some(name) = self.labels.get(label_id) else {
                log::warn!("Skipping initial box {:?} with unknown label {}", bbox, label_id);
                continue;
            };
            let annotation = Annotation::new(self.next_id, *bbox, label_id, name);
            self.next_id += 1;
            self.annotations.push(annotation);
        }

        log::debug!("Store initialized with {} annotations", self.annotations.len());
    }

    /// Set the image size used for clamping.
    pub fn set_image_size(&mut self, size: Option<(f32, f32)>) {
        self.image_size = size;
        self.dirty = true;
    }

    pub fn image_size(&self) -> Option<(f32, f32)> {
        self.image_size
    }

    pub fn labels(&self) -> &LabelList {
        &self.labels
    }

    /// Clamp a box to the image, or only reject degenerate boxes when the
    /// image size is unknown.
    pub fn clamp(&self, bbox: &BoundingBox) -> Option<BoundingBox> {
        match self.image_size {
            Some((w, h)) => bbox.clamp_to_image(w, h),
            None if bbox.is_degenerate() => None,
            None => Some(*bbox),
        }
    }

    fn validate_label(&self, label_id: usize) -> Result<&str, ValidationError> {
        self.labels.get(label_id).ok_or(ValidationError::LabelOutOfRange {
            label_id: label_id as i64,
            len: self.labels.len(),
        })
    }

    /// Append a new annotation and commit. Returns its fresh identity.
    pub fn add_annotation(
        &mut self,
        bbox: BoundingBox,
        label_id: usize,
    ) -> Result<AnnotationId, EditError> {
        let label = self.validate_label(label_id)?.to_string();
        let bbox = self.clamp(&bbox).ok_or(EditError::Degenerate)?;

        let id = self.next_id;
        self.next_id += 1;
        self.annotations.push(Annotation::new(id, bbox, label_id, label));
        self.mark_committed();
        log::debug!("Added annotation {} {:?} label={}", id, bbox, label_id);
        Ok(id)
    }

    /// Replace a box after clamping and commit. `Ok(false)` if the id is unknown.
    pub fn update_box(&mut self, id: AnnotationId, bbox: BoundingBox) -> Result<bool, EditError> {
        let changed = self.set_box(id, bbox)?;
        if changed {
            self.mark_committed();
        }
        Ok(changed)
    }

    /// Replace a box for visual feedback only; nothing is synced to the host.
    pub fn preview_box(&mut self, id: AnnotationId, bbox: BoundingBox) -> Result<bool, EditError> {
        self.set_box(id, bbox)
    }

    fn set_box(&mut self, id: AnnotationId, bbox: BoundingBox) -> Result<bool, EditError> {
        let bbox = self.clamp(&bbox).ok_or(EditError::Degenerate)?;
        let Some(annotation) = self.annotations.iter_mut().find(|a| a.id == id) else {
            return Ok(false);
        };
        annotation.bbox = bbox;
        self.dirty = true;
        Ok(true)
    }

    /// Change the label of an annotation and commit.
    ///
    /// Out-of-range ids are rejected and the annotation keeps its label.
    pub fn update_label(
        &mut self,
        id: AnnotationId,
        label_id: i64,
    ) -> Result<bool, ValidationError> {
        let label_id = self.labels.validate(label_id)?;
        let label = self.validate_label(label_id)?.to_string();
        let Some(annotation) = self.annotations.iter_mut().find(|a| a.id == id) else {
            return Ok(false);
        };
        annotation.label_id = label_id;
        annotation.label = label;
        self.mark_committed();
        Ok(true)
    }

    /// Remove an annotation by ID and commit.
    pub fn remove(&mut self, id: AnnotationId) -> Option<Annotation> {
        let position = self.annotations.iter().position(|a| a.id == id)?;
        let removed = self.annotations.remove(position);
        if self.selected_id == Some(id) {
            self.selected_id = None;
        }
        self.mark_committed();
        log::debug!("Removed annotation {}", id);
        Some(removed)
    }

    /// Mark the current list as committed (end of a drag).
    pub fn commit(&mut self) {
        self.mark_committed();
    }

    fn mark_committed(&mut self) {
        self.dirty = true;
        self.pending_commit = true;
    }

    /// Consume the pending-commit flag.
    pub fn take_pending_commit(&mut self) -> bool {
        std::mem::take(&mut self.pending_commit)
    }

    /// Check if the store has changed since last clear_dirty().
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clear the dirty flag. Call after redrawing.
    #[inline]
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Mark the store as dirty.
    #[inline]
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Select an annotation; selection is exclusive.
    pub fn select(&mut self, id: Option<AnnotationId>) {
        let id = id.filter(|id| self.get(*id).is_some());
        if self.selected_id != id {
            self.selected_id = id;
            self.dirty = true;
        }
    }

    /// Get the selected annotation ID.
    pub fn selected(&self) -> Option<AnnotationId> {
        self.selected_id
    }

    /// Get an annotation by ID.
    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    /// Get all annotations in order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Annotation> {
        self.annotations.iter()
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// Top-most annotation (last drawn) containing an image-space point.
    pub fn hit_test(&self, point: &crate::geometry::Point) -> Option<AnnotationId> {
        self.annotations
            .iter()
            .rev()
            .find(|a| a.bbox.contains(point))
            .map(|a| a.id)
    }

    /// Serialize the list for the host.
    pub fn records(&self) -> Vec<BboxRecord> {
        self.annotations.iter().map(Annotation::to_record).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn store() -> AnnotationStore {
        let mut store = AnnotationStore::new(LabelList::new(["deer", "human"]));
        store.set_image_size(Some((1000.0, 800.0)));
        store
    }

    #[test]
    fn test_initialize_and_records() {
        let mut store = store();
        let boxes = [
            BoundingBox::new(0.0, 0.0, 100.0, 100.0),
            BoundingBox::new(10.0, 20.0, 50.0, 150.0),
        ];
        store.initialize(&boxes, &[0, 1], LabelList::new(["deer", "human"]));

        assert_eq!(store.len(), 2);
        assert!(!store.take_pending_commit());
        let records = store.records();
        assert_eq!(records[0].bbox, [0.0, 0.0, 100.0, 100.0]);
        assert_eq!(records[1].label_id, 1);
        assert_eq!(store.iter().nth(1).map(|a| a.label.as_str()), Some("human"));
    }

    #[test]
    fn test_initialize_mismatch_leaves_empty() {
        let mut store = store();
        store.initialize(
            &[BoundingBox::new(0.0, 0.0, 10.0, 10.0)],
            &[0, 1],
            LabelList::new(["deer", "human"]),
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_add_clamps_and_commits() {
        let mut store = store();
        let id = store.add_annotation(BoundingBox::new(950.0, 700.0, 100.0, 200.0), 1).unwrap();
        assert_eq!(store.get(id).unwrap().bbox, BoundingBox::new(950.0, 700.0, 50.0, 100.0));
        assert!(store.take_pending_commit());
        assert!(!store.take_pending_commit());
    }

    #[test]
    fn test_add_rejects_bad_label_and_degenerate() {
        let mut store = store();
        assert!(matches!(
            store.add_annotation(BoundingBox::new(0.0, 0.0, 10.0, 10.0), 5),
            Err(EditError::Label(_))
        ));
        assert_eq!(
            store.add_annotation(BoundingBox::new(2000.0, 0.0, 10.0, 10.0), 0),
            Err(EditError::Degenerate)
        );
        assert!(store.is_empty());
        assert!(!store.take_pending_commit());
    }

    #[test]
    fn test_ids_are_stable_across_removal() {
        let mut store = store();
        let a = store.add_annotation(BoundingBox::new(0.0, 0.0, 10.0, 10.0), 0).unwrap();
        let b = store.add_annotation(BoundingBox::new(20.0, 0.0, 10.0, 10.0), 0).unwrap();
        let c = store.add_annotation(BoundingBox::new(40.0, 0.0, 10.0, 10.0), 1).unwrap();

        store.select(Some(b));
        assert!(store.remove(b).is_some());
        assert_eq!(store.selected(), None);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(a).unwrap().bbox.x, 0.0);
        assert_eq!(store.get(c).unwrap().bbox.x, 40.0);

        // New ids are never reused
        let d = store.add_annotation(BoundingBox::new(60.0, 0.0, 10.0, 10.0), 0).unwrap();
        assert!(d > c);
    }

    #[test]
    fn test_update_label_rejects_out_of_range() {
        let mut store = store();
        let id = store.add_annotation(BoundingBox::new(0.0, 0.0, 10.0, 10.0), 0).unwrap();
        store.take_pending_commit();

        assert!(store.update_label(id, 99).is_err());
        assert_eq!(store.get(id).unwrap().label_id, 0);
        assert!(!store.take_pending_commit());

        assert_eq!(store.update_label(id, 1), Ok(true));
        assert_eq!(store.get(id).unwrap().label, "human");
        assert!(store.take_pending_commit());
    }

    #[test]
    fn test_update_box_unknown_id_is_noop() {
        let mut store = store();
        assert_eq!(store.update_box(42, BoundingBox::new(0.0, 0.0, 10.0, 10.0)), Ok(false));
        assert!(!store.take_pending_commit());
    }

    #[test]
    fn test_preview_does_not_commit() {
        let mut store = store();
        let id = store.add_annotation(BoundingBox::new(0.0, 0.0, 10.0, 10.0), 0).unwrap();
        store.take_pending_commit();
        store.clear_dirty();

        store.preview_box(id, BoundingBox::new(5.0, 5.0, 10.0, 10.0)).unwrap();
        assert!(store.is_dirty());
        assert!(!store.take_pending_commit());
    }

    #[test]
    fn test_hit_test_prefers_topmost() {
        let mut store = store();
        let _below = store.add_annotation(BoundingBox::new(0.0, 0.0, 100.0, 100.0), 0).unwrap();
        let above = store.add_annotation(BoundingBox::new(50.0, 50.0, 100.0, 100.0), 1).unwrap();
        assert_eq!(store.hit_test(&Point::new(75.0, 75.0)), Some(above));
        assert_eq!(store.hit_test(&Point::new(500.0, 500.0)), None);
    }
}
