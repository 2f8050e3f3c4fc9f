//! Global constants for the annotation widget

/// Boxes narrower or shorter than this (in image pixels) are discarded when a
/// create drag ends.
pub const MIN_BOX_SIZE: f32 = 5.0;

/// Radius around a handle (in display pixels) that still counts as a hit.
pub const HANDLE_HIT_RADIUS: f32 = 8.0;

/// Side length of the square drawn for each resize handle (display pixels).
pub const HANDLE_DRAW_SIZE: f32 = 8.0;

/// Default stroke width for box outlines.
pub const DEFAULT_LINE_WIDTH: f32 = 5.0;

/// Share of the host window width the canvas may occupy.
pub const FRAME_WIDTH_RATIO: f32 = 0.8;

/// The canvas never scales the image up beyond its native size.
pub const MAX_DISPLAY_SCALE: f32 = 1.0;

/// Height of the label tag drawn above each box (display pixels).
pub const LABEL_TAG_HEIGHT: f32 = 16.0;

/// Approximate advance per character used to size label tags.
pub const LABEL_CHAR_WIDTH: f32 = 7.0;

/// Font size for label tag text.
pub const LABEL_FONT_SIZE: f32 = 12.0;

/// Name of the only colormap the color map builder knows.
pub const DEFAULT_COLORMAP: &str = "gist_rainbow";

/// Container width assumed until the host reports one.
pub const DEFAULT_CONTAINER_WIDTH: f32 = 704.0;

/// Upper bound on bytes read while fetching an image to learn its size.
pub const MAX_FETCH_BYTES: u64 = 64 * 1024 * 1024;

/// User agent sent with image size requests.
pub const FETCH_USER_AGENT: &str = "bbox-annotator";
