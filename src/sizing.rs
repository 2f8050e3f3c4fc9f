//! Display width resolution.
//!
//! Callers describe the width they want with a mix of an explicit pixel width,
//! the deprecated `use_column_width` flag and the newer `use_container_width`
//! flag. [`SizingOptions::resolve`] turns that mix into exactly one
//! [`DisplaySizing`], once, at the call boundary.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Named width behaviors understood by the frontend.
///
/// On the wire these travel as negative integers; in Rust they stay an enum so
/// nobody does arithmetic on a sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WidthBehavior {
    /// Native image size
    Original,
    /// Fill the container (legacy column behavior)
    Column,
    /// Native size unless that overflows the container
    Auto,
    /// The smaller of image width and container width
    MinImageOrContainer,
    /// Use the full container width
    MaxImageOrContainer,
}

impl WidthBehavior {
    /// The sentinel integer used by the host protocol.
    pub fn code(self) -> i64 {
        match self {
            WidthBehavior::Original => -1,
            WidthBehavior::Column => -2,
            WidthBehavior::Auto => -3,
            WidthBehavior::MinImageOrContainer => -4,
            WidthBehavior::MaxImageOrContainer => -5,
        }
    }

    /// Parse a sentinel integer.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            -1 => Some(WidthBehavior::Original),
            -2 => Some(WidthBehavior::Column),
            -3 => Some(WidthBehavior::Auto),
            -4 => Some(WidthBehavior::MinImageOrContainer),
            -5 => Some(WidthBehavior::MaxImageOrContainer),
            _ => None,
        }
    }
}

/// The single width mode active for one render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplaySizing {
    /// A literal width in pixels, capped at the container width
    Pixels(u32),
    /// A named behavior
    Behavior(WidthBehavior),
}

impl DisplaySizing {
    /// Encode as the host protocol integer (positive width or sentinel).
    pub fn to_wire(self) -> i64 {
        match self {
            DisplaySizing::Pixels(px) => i64::from(px),
            DisplaySizing::Behavior(behavior) => behavior.code(),
        }
    }

    /// Decode a host protocol integer. Zero and unknown negatives are rejected.
    pub fn from_wire(value: i64) -> Option<Self> {
        if value > 0 {
            u32::try_from(value).ok().map(DisplaySizing::Pixels)
        } else {
            WidthBehavior::from_code(value).map(DisplaySizing::Behavior)
        }
    }

    /// Whether this mode may scale the image above its native size.
    pub fn allows_upscale(self) -> bool {
        matches!(
            self,
            DisplaySizing::Behavior(WidthBehavior::Column | WidthBehavior::MaxImageOrContainer)
        )
    }

    /// Target display width for an image inside a container.
    ///
    /// With an unknown image width every image-relative mode falls back to the
    /// container width.
    pub fn display_width(self, image_width: Option<f32>, container_width: f32) -> f32 {
        let image = image_width.unwrap_or(container_width);
        match self {
            DisplaySizing::Pixels(px) => (px as f32).min(container_width),
            DisplaySizing::Behavior(WidthBehavior::Original) => image,
            DisplaySizing::Behavior(WidthBehavior::Column) => container_width,
            DisplaySizing::Behavior(
                WidthBehavior::Auto | WidthBehavior::MinImageOrContainer,
            ) => image.min(container_width),
            DisplaySizing::Behavior(WidthBehavior::MaxImageOrContainer) => container_width,
        }
    }
}

impl Default for DisplaySizing {
    fn default() -> Self {
        DisplaySizing::Behavior(WidthBehavior::MinImageOrContainer)
    }
}

/// Values accepted by the deprecated `use_column_width` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnWidth {
    Auto,
    Always,
    Never,
}

impl ColumnWidth {
    /// Parse the string form (`"auto"`, `"always"`, `"never"`).
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "auto" => Some(ColumnWidth::Auto),
            "always" => Some(ColumnWidth::Always),
            "never" => Some(ColumnWidth::Never),
            _ => None,
        }
    }

    fn behavior(self) -> WidthBehavior {
        match self {
            ColumnWidth::Auto => WidthBehavior::Auto,
            ColumnWidth::Always => WidthBehavior::Column,
            ColumnWidth::Never => WidthBehavior::Original,
        }
    }
}

impl From<bool> for ColumnWidth {
    fn from(value: bool) -> Self {
        if value {
            ColumnWidth::Always
        } else {
            ColumnWidth::Never
        }
    }
}

/// Width-related call parameters before resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SizingOptions {
    /// Explicit width in pixels; `None` or non-positive means "not given"
    pub width: Option<i64>,
    /// Deprecated column flag
    pub use_column_width: Option<ColumnWidth>,
    /// Fill the container
    pub use_container_width: bool,
}

impl SizingOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn width(mut self, width: i64) -> Self {
        self.width = Some(width);
        self
    }

    pub fn use_column_width(mut self, value: impl Into<ColumnWidth>) -> Self {
        self.use_column_width = Some(value.into());
        self
    }

    pub fn use_container_width(mut self, value: bool) -> Self {
        self.use_container_width = value;
        self
    }

    /// Resolve to exactly one sizing mode.
    ///
    /// Precedence: conflicting flags → error; legacy flag → mapped sentinel;
    /// container flag → `MaxImageOrContainer`; positive width → pixels;
    /// otherwise `MinImageOrContainer`.
    pub fn resolve(&self) -> Result<DisplaySizing, ConfigError> {
        if self.use_container_width && self.use_column_width.is_some() {
            return Err(ConfigError::ConflictingWidthFlags);
        }

        if let Some(column) = self.use_column_width {
            log::warn!(
                "`use_column_width` is deprecated and will be removed in a future release; \
                 use `use_container_width` instead"
            );
            return Ok(DisplaySizing::Behavior(column.behavior()));
        }

        if self.use_container_width {
            return Ok(DisplaySizing::Behavior(WidthBehavior::MaxImageOrContainer));
        }

        match self.width.filter(|w| *w > 0).and_then(|w| u32::try_from(w).ok()) {
            Some(px) => Ok(DisplaySizing::Pixels(px)),
            None => Ok(DisplaySizing::Behavior(WidthBehavior::MinImageOrContainer)),
        }
    }
}
