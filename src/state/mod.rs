//! Annotation state: the authoritative store, drag state and per-image sessions.

mod image_data;
mod interaction;
mod store;

pub use image_data::{ImageSession, ImageSessionStore};
pub use interaction::{DragMode, InteractionState};
pub use store::AnnotationStore;
