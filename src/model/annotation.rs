//! Annotation types and their host wire records.

use serde::{Deserialize, Serialize};

use crate::geometry::BoundingBox;

/// Stable identity of an annotation, independent of its list position.
pub type AnnotationId = u64;

/// A single labeled bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Unique identifier, never reused within a store.
    pub id: AnnotationId,
    /// Box in image-pixel coordinates.
    pub bbox: BoundingBox,
    /// Index into the label list; authoritative.
    pub label_id: usize,
    /// Denormalized copy of the label name for display.
    pub label: String,
}

impl Annotation {
    pub fn new(
        id: AnnotationId,
        bbox: BoundingBox,
        label_id: usize,
        label: impl Into<String>,
    ) -> Self {
        Self {
            id,
            bbox,
            label_id,
            label: label.into(),
        }
    }

    /// The record sent back to the host.
    pub fn to_record(&self) -> BboxRecord {
        BboxRecord {
            bbox: self.bbox.to_array(),
            label_id: self.label_id,
        }
    }
}

/// Initial box as sent to the frontend: `{bbox, label_id, label}`.
///
/// `label_id` is signed because it comes from untrusted host data and is
/// validated on ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BboxInfo {
    pub bbox: [f32; 4],
    pub label_id: i64,
    #[serde(default)]
    pub label: String,
}

/// Committed box as returned to the host: `{bbox: [x, y, w, h], label_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BboxRecord {
    pub bbox: [f32; 4],
    pub label_id: usize,
}
