//! Bounding-box annotation canvas for dashboard components.
//!
//! The host prepares a [`DetectionRequest`], which is validated once and turned
//! into [`ComponentProps`]. A [`DetectionWidget`] mounts those props, turns
//! pointer and keyboard input into edits, renders [`Frame`]s, and hands the
//! committed box list back through a [`HostSink`].

pub mod bridge;
pub mod color_utils;
pub mod config;
pub mod constants;
pub mod controller;
pub mod error;
pub mod geometry;
pub mod model;
pub mod render;
pub mod sizing;
pub mod state;
pub mod widget;

#[cfg(test)]
mod tests;

pub use bridge::{
    ComponentProps, DetectionRequest, HostSink, HttpImageSizeFetcher, ImageSizeFetcher,
    ImageSource, InMemoryMediaStore, MediaStore, RecordingHost, SizeFetchThread,
};
pub use config::WidgetConfig;
pub use controller::{EditMode, Key, PointerEvent, Response};
pub use error::{ConfigError, DetectionError, FetchError, MediaError, ValidationError};
pub use geometry::{BoundingBox, Point};
pub use model::{BboxInfo, BboxRecord, LabelList};
pub use render::{DrawCommand, Frame};
pub use widget::{DetectionWidget, Layout, LoadPhase};
