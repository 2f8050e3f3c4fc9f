//! Data models for the annotation widget.

mod annotation;
mod label;

pub use annotation::{Annotation, AnnotationId, BboxInfo, BboxRecord};
pub use label::LabelList;
