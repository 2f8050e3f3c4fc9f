//! Box geometry and coordinate transforms.
//!
//! Everything here is a pure function over values: boxes live in image-pixel
//! coordinates with the origin at the top-left, and [`DisplayTransform`] maps
//! them to the scaled canvas the user interacts with.

use serde::{Deserialize, Serialize};

/// A 2D point. Image or display coordinates depending on context.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Calculate distance to another point.
    pub fn distance_to(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Component-wise difference `self - origin`.
    pub fn delta_from(&self, origin: &Point) -> (f32, f32) {
        (self.x - origin.x, self.y - origin.y)
    }
}

/// An axis-aligned bounding box in image-pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Top-left corner X coordinate
    pub x: f32,
    /// Top-left corner Y coordinate
    pub y: f32,
    /// Width of the box
    pub width: f32,
    /// Height of the box
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Build from the `[x, y, w, h]` wire layout.
    pub fn from_array(values: [f32; 4]) -> Self {
        Self::new(values[0], values[1], values[2], values[3])
    }

    /// The `[x, y, w, h]` wire layout.
    pub fn to_array(&self) -> [f32; 4] {
        [self.x, self.y, self.width, self.height]
    }

    /// Create a bounding box from two corner points.
    pub fn from_corners(p1: Point, p2: Point) -> Self {
        let x = p1.x.min(p2.x);
        let y = p1.y.min(p2.y);
        let width = (p1.x - p2.x).abs();
        let height = (p1.y - p2.y).abs();
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Get the top-left corner.
    pub fn top_left(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Check if a point is inside the box (edges included).
    pub fn contains(&self, point: &Point) -> bool {
        point.x >= self.x
            && point.x <= self.right()
            && point.y >= self.y
            && point.y <= self.bottom()
    }

    /// Get the area of the box.
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// True when the box has no positive area or holds non-finite values.
    pub fn is_degenerate(&self) -> bool {
        !(self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
    }

    /// Clip the box to `[0, image_width] × [0, image_height]`.
    ///
    /// The top-left corner is kept when it already lies inside the image.
    /// Returns `None` when nothing of positive size remains; callers must then
    /// discard the edit instead of committing it.
    pub fn clamp_to_image(&self, image_width: f32, image_height: f32) -> Option<BoundingBox> {
        if self.is_degenerate() {
            return None;
        }

        let x0 = self.x.max(0.0);
        let y0 = self.y.max(0.0);
        let x1 = self.right().min(image_width);
        let y1 = self.bottom().min(image_height);

        let clipped = BoundingBox::new(x0, y0, x1 - x0, y1 - y0);
        if clipped.is_degenerate() {
            None
        } else {
            Some(clipped)
        }
    }

    /// Shift the box by a delta.
    pub fn translate(&self, dx: f32, dy: f32) -> BoundingBox {
        BoundingBox::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Shift the box by a delta but stop at the image border, keeping its size.
    ///
    /// A box larger than the image is pinned to the origin and left for
    /// [`clamp_to_image`](Self::clamp_to_image) to clip.
    pub fn translate_within(
        &self,
        dx: f32,
        dy: f32,
        image_width: f32,
        image_height: f32,
    ) -> BoundingBox {
        let max_x = (image_width - self.width).max(0.0);
        let max_y = (image_height - self.height).max(0.0);
        BoundingBox::new(
            (self.x + dx).clamp(0.0, max_x),
            (self.y + dy).clamp(0.0, max_y),
            self.width,
            self.height,
        )
    }

    /// Move the edge(s) controlled by `handle` by the pointer delta.
    ///
    /// Opposite edges stay put. The result is not clamped and may be
    /// degenerate if an edge is dragged past its opposite.
    pub fn resize(&self, handle: Handle, dx: f32, dy: f32) -> BoundingBox {
        let mut left = self.x;
        let mut top = self.y;
        let mut right = self.right();
        let mut bottom = self.bottom();

        if handle.moves_left() {
            left += dx;
        }
        if handle.moves_right() {
            right += dx;
        }
        if handle.moves_top() {
            top += dy;
        }
        if handle.moves_bottom() {
            bottom += dy;
        }

        BoundingBox::new(left, top, right - left, bottom - top)
    }

    /// Position of a resize handle on this box.
    pub fn handle_position(&self, handle: Handle) -> Point {
        let cx = self.x + self.width / 2.0;
        let cy = self.y + self.height / 2.0;
        match handle {
            Handle::TopLeft => Point::new(self.x, self.y),
            Handle::Top => Point::new(cx, self.y),
            Handle::TopRight => Point::new(self.right(), self.y),
            Handle::Right => Point::new(self.right(), cy),
            Handle::BottomRight => Point::new(self.right(), self.bottom()),
            Handle::Bottom => Point::new(cx, self.bottom()),
            Handle::BottomLeft => Point::new(self.x, self.bottom()),
            Handle::Left => Point::new(self.x, cy),
        }
    }
}

/// One of the eight resize handles on a selected box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handle {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
}

impl Handle {
    /// All handles, corners first so they win over edge midpoints on tiny boxes.
    pub const ALL: [Handle; 8] = [
        Handle::TopLeft,
        Handle::TopRight,
        Handle::BottomRight,
        Handle::BottomLeft,
        Handle::Top,
        Handle::Right,
        Handle::Bottom,
        Handle::Left,
    ];

    fn moves_left(self) -> bool {
        matches!(self, Handle::TopLeft | Handle::Left | Handle::BottomLeft)
    }

    fn moves_right(self) -> bool {
        matches!(self, Handle::TopRight | Handle::Right | Handle::BottomRight)
    }

    fn moves_top(self) -> bool {
        matches!(self, Handle::TopLeft | Handle::Top | Handle::TopRight)
    }

    fn moves_bottom(self) -> bool {
        matches!(self, Handle::BottomLeft | Handle::Bottom | Handle::BottomRight)
    }
}

/// What a pointer landed on when tested against a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    /// A resize handle
    Handle(Handle),
    /// Inside the box but away from any handle
    Body,
}

/// Test a pointer against the handles and body of a box.
///
/// `pointer` and `bbox` must be in the same coordinate space (normally display
/// space, so the radius is in screen pixels regardless of scale).
///
/// Inside the box the radius shrinks to a quarter of the shorter side, so the
/// middle of a small box still grabs the body.
pub fn hit_test_handle(
    pointer: Point,
    bbox: &BoundingBox,
    handle_radius: f32,
) -> Option<HitTarget> {
    let inside = bbox.contains(&pointer);
    let radius = if inside {
        handle_radius.min(bbox.width / 4.0).min(bbox.height / 4.0)
    } else {
        handle_radius
    };

    let nearest = Handle::ALL
        .iter()
        .map(|&handle| (handle, bbox.handle_position(handle).distance_to(&pointer)))
        .filter(|(_, distance)| *distance <= radius)
        .min_by(|a, b| a.1.total_cmp(&b.1));

    if let Some((handle, _)) = nearest {
        return Some(HitTarget::Handle(handle));
    }

    inside.then_some(HitTarget::Body)
}

/// Scale between image space and display space.
///
/// The scale is aspect-preserving: both axes use `display_width / image_width`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayTransform {
    pub scale_x: f32,
    pub scale_y: f32,
}

impl DisplayTransform {
    pub fn new(scale_x: f32, scale_y: f32) -> Self {
        Self { scale_x, scale_y }
    }

    /// Create an identity transform (display = image).
    pub fn identity() -> Self {
        Self::new(1.0, 1.0)
    }

    /// Derive the transform from a target display width.
    pub fn for_display_width(display_width: f32, image_width: f32) -> Self {
        if image_width <= 0.0 || display_width <= 0.0 {
            return Self::identity();
        }
        let scale = display_width / image_width;
        Self::new(scale, scale)
    }

    pub fn image_to_display(&self, point: Point) -> Point {
        Point::new(point.x * self.scale_x, point.y * self.scale_y)
    }

    pub fn display_to_image(&self, point: Point) -> Point {
        Point::new(point.x / self.scale_x, point.y / self.scale_y)
    }

    /// Scale a display-space delta into image space.
    pub fn delta_to_image(&self, dx: f32, dy: f32) -> (f32, f32) {
        (dx / self.scale_x, dy / self.scale_y)
    }

    pub fn box_to_display(&self, bbox: &BoundingBox) -> BoundingBox {
        BoundingBox::new(
            bbox.x * self.scale_x,
            bbox.y * self.scale_y,
            bbox.width * self.scale_x,
            bbox.height * self.scale_y,
        )
    }

    /// Display size of an image of the given size.
    pub fn display_size(&self, image_width: f32, image_height: f32) -> (f32, f32) {
        (image_width * self.scale_x, image_height * self.scale_y)
    }
}

impl Default for DisplayTransform {
    fn default() -> Self {
        Self::identity()
    }
}
