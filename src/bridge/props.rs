//! Props sent from the host to the frontend, and their ingestion.

use serde::{Deserialize, Serialize};

use crate::color_utils::LabelColorMap;
use crate::geometry::BoundingBox;
use crate::model::{BboxInfo, LabelList};
use crate::sizing::{DisplaySizing, WidthBehavior};

/// Everything the frontend receives on mount or image change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentProps {
    /// Absolute URL of the image to annotate
    pub image_url: String,
    /// `[width, height]`, or `None` when the size could not be fetched
    pub image_size: Option<[u32; 2]>,
    pub label_list: LabelList,
    pub bbox_info: Vec<BboxInfo>,
    /// Label name to `#RRGGBB`
    pub color_map: LabelColorMap,
    pub line_width: f32,
    pub use_space: bool,
    /// Resolved sizing in wire form: a pixel width or a negative sentinel
    #[serde(default = "default_width")]
    pub width: i64,
}

fn default_width() -> i64 {
    WidthBehavior::MinImageOrContainer.code()
}

/// Initial boxes that survived validation, as parallel arrays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestedBoxes {
    pub bboxes: Vec<BoundingBox>,
    pub labels: Vec<usize>,
    /// Number of `bbox_info` entries dropped
    pub dropped: usize,
}

impl ComponentProps {
    /// Image size as floats, if known.
    pub fn image_dimensions(&self) -> Option<(f32, f32)> {
        self.image_size.map(|[w, h]| (w as f32, h as f32))
    }

    /// Decoded sizing; unknown wire values fall back to the default.
    pub fn sizing(&self) -> DisplaySizing {
        DisplaySizing::from_wire(self.width).unwrap_or_else(|| {
            log::warn!("Unknown width value {}, using default sizing", self.width);
            DisplaySizing::default()
        })
    }

    /// Validate `bbox_info` against the label list.
    ///
    /// Entries with an out-of-range `label_id` or unusable coordinates are
    /// dropped with a warning; the rest keep their order.
    pub fn ingest(&self) -> IngestedBoxes {
        let mut ingested = IngestedBoxes::default();

        for (index, info) in self.bbox_info.iter().enumerate() {
            let label_id = match self.label_list.validate(info.label_id) {
                Ok(id) => id,
                Err(e) => {
                    log::warn!("Dropping bbox_info[{}]: {}", index, e);
                    ingested.dropped += 1;
                    continue;
                }
            };

            let bbox = BoundingBox::from_array(info.bbox);
            if bbox.is_degenerate() {
                log::warn!("Dropping bbox_info[{}]: unusable box {:?}", index, info.bbox);
                ingested.dropped += 1;
                continue;
            }

            ingested.bboxes.push(bbox);
            ingested.labels.push(label_id);
        }

        if ingested.dropped > 0 {
            log::warn!(
                "Ingested {} of {} initial boxes",
                ingested.bboxes.len(),
                self.bbox_info.len()
            );
        }
        ingested
    }
}
