//! Frame production for the annotation canvas.
//!
//! [`render_frame`] is a pure projection of widget state into a list of
//! [`DrawCommand`]s in display coordinates. Hosts replay the commands on
//! whatever surface they own; [`Frame::rasterize`] does so onto an
//! [`RgbaImage`] for previews and tests.

use image::{Rgba, RgbaImage, imageops};

use crate::color_utils::LabelColorMap;
use crate::constants::{HANDLE_DRAW_SIZE, LABEL_CHAR_WIDTH, LABEL_FONT_SIZE, LABEL_TAG_HEIGHT};
use crate::geometry::{BoundingBox, DisplayTransform, Handle, Point};
use crate::state::{AnnotationStore, InteractionState};

/// Height of the placeholder shown while the image size is unknown.
pub const PLACEHOLDER_HEIGHT: f32 = 150.0;

/// An RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgba(255, 255, 255, 255);
    pub const BLACK: Color = Color::rgba(0, 0, 0, 255);
    /// Used for labels missing from the color map
    pub const FALLBACK: Color = Color::rgba(128, 128, 128, 255);
    pub const PLACEHOLDER: Color = Color::rgba(230, 230, 230, 255);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_rgb(rgb: [u8; 3]) -> Self {
        Self::rgba(rgb[0], rgb[1], rgb[2], 255)
    }

    fn to_pixel(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, self.a])
    }
}

/// A draw command in display coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// The source image scaled into `rect`
    DrawImage { rect: BoundingBox },
    /// Stand-in shown until the image size is known
    Placeholder { rect: BoundingBox, text: String },
    FillRect {
        rect: BoundingBox,
        color: Color,
    },
    StrokeRect {
        rect: BoundingBox,
        color: Color,
        width: f32,
    },
    DrawText {
        text: String,
        position: Point,
        color: Color,
        size: f32,
    },
}

/// Everything the renderer reads. Borrowed, never mutated.
#[derive(Debug, Clone, Copy)]
pub struct RenderState<'a> {
    pub store: &'a AnnotationStore,
    pub interaction: &'a InteractionState,
    pub color_map: &'a LabelColorMap,
    pub transform: DisplayTransform,
    /// Canvas width in display pixels
    pub display_width: f32,
    pub line_width: f32,
}

/// One rendered frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub width: f32,
    pub height: f32,
    pub commands: Vec<DrawCommand>,
}

/// Project state into a frame. Same state in, same frame out.
pub fn render_frame(state: &RenderState<'_>) -> Frame {
    let Some((image_w, image_h)) = state.store.image_size() else {
        let rect = BoundingBox::new(0.0, 0.0, state.display_width, PLACEHOLDER_HEIGHT);
        return Frame {
            width: rect.width,
            height: rect.height,
            commands: vec![DrawCommand::Placeholder {
                rect,
                text: "Loading image…".to_string(),
            }],
        };
    };

    let (width, height) = state.transform.display_size(image_w, image_h);
    let mut commands = vec![DrawCommand::DrawImage {
        rect: BoundingBox::new(0.0, 0.0, width, height),
    }];

    let selected = state.store.selected();
    let mut selected_box = None;

    for annotation in state.store.iter() {
        let rect = state.transform.box_to_display(&annotation.bbox);
        let color = label_color(state.color_map, &annotation.label);
        push_box(&mut commands, rect, color, state.line_width, &annotation.label);
        if selected == Some(annotation.id) {
            selected_box = Some((rect, color));
        }
    }

    if let Some(draft) = state.interaction.draft {
        let label = state.store.labels().get(state.interaction.draft_label).unwrap_or_default();
        let rect = state.transform.box_to_display(&draft);
        commands.push(DrawCommand::StrokeRect {
            rect,
            color: label_color(state.color_map, label),
            width: state.line_width,
        });
    }

    // Handles go last so they sit above every outline
    if let Some((rect, color)) = selected_box {
        for handle in Handle::ALL {
            let center = rect.handle_position(handle);
            let half = HANDLE_DRAW_SIZE / 2.0;
            let square = BoundingBox::new(
                center.x - half,
                center.y - half,
                HANDLE_DRAW_SIZE,
                HANDLE_DRAW_SIZE,
            );
            commands.push(DrawCommand::FillRect {
                rect: square,
                color: Color::WHITE,
            });
            commands.push(DrawCommand::StrokeRect {
                rect: square,
                color,
                width: 1.0,
            });
        }
    }

    log::trace!("Rendered frame {:.0}x{:.0} with {} commands", width, height, commands.len());

    Frame {
        width,
        height,
        commands,
    }
}

fn label_color(color_map: &LabelColorMap, label: &str) -> Color {
    color_map.rgb(label).map(Color::from_rgb).unwrap_or(Color::FALLBACK)
}

fn push_box(
    commands: &mut Vec<DrawCommand>,
    rect: BoundingBox,
    color: Color,
    line_width: f32,
    label: &str,
) {
    commands.push(DrawCommand::StrokeRect {
        rect,
        color,
        width: line_width,
    });

    // Tag sits above the top-left corner, or just inside it at the top edge
    let tag_width = label.chars().count() as f32 * LABEL_CHAR_WIDTH + 6.0;
    let tag_y = if rect.y >= LABEL_TAG_HEIGHT { rect.y - LABEL_TAG_HEIGHT } else { rect.y };
    commands.push(DrawCommand::FillRect {
        rect: BoundingBox::new(rect.x, tag_y, tag_width, LABEL_TAG_HEIGHT),
        color,
    });
    commands.push(DrawCommand::DrawText {
        text: label.to_string(),
        position: Point::new(rect.x + 3.0, tag_y + 2.0),
        color: Color::BLACK,
        size: LABEL_FONT_SIZE,
    });
}

impl Frame {
    /// Replay the frame onto a fresh canvas using `source` as the image.
    ///
    /// Text is not rasterized; label tags show as their colored background.
    pub fn rasterize(&self, source: &RgbaImage) -> RgbaImage {
        let width = self.width.round().max(1.0) as u32;
        let height = self.height.round().max(1.0) as u32;
        let mut canvas = RgbaImage::new(width, height);

        for command in &self.commands {
            match command {
                DrawCommand::DrawImage { rect } => {
                    let w = rect.width.round().max(1.0) as u32;
                    let h = rect.height.round().max(1.0) as u32;
                    let scaled = imageops::resize(source, w, h, imageops::FilterType::Triangle);
                    let (x, y) = (rect.x.round() as i64, rect.y.round() as i64);
                    imageops::overlay(&mut canvas, &scaled, x, y);
                }
                DrawCommand::Placeholder { rect, .. } => {
                    fill_rect(&mut canvas, rect, Color::PLACEHOLDER)
                }
                DrawCommand::FillRect { rect, color } => fill_rect(&mut canvas, rect, *color),
                DrawCommand::StrokeRect { rect, color, width } => {
                    stroke_rect(&mut canvas, rect, *color, *width)
                }
                DrawCommand::DrawText { .. } => {}
            }
        }

        canvas
    }
}

fn fill_rect(canvas: &mut RgbaImage, rect: &BoundingBox, color: Color) {
    let x0 = rect.x.max(0.0).round() as u32;
    let y0 = rect.y.max(0.0).round() as u32;
    let x1 = (rect.right().round().max(0.0) as u32).min(canvas.width());
    let y1 = (rect.bottom().round().max(0.0) as u32).min(canvas.height());
    let pixel = color.to_pixel();

    for y in y0..y1 {
        for x in x0..x1 {
            blend(canvas.get_pixel_mut(x, y), pixel);
        }
    }
}

fn stroke_rect(canvas: &mut RgbaImage, rect: &BoundingBox, color: Color, width: f32) {
    let half = width.max(1.0) / 2.0;
    let outer_w = rect.width + 2.0 * half;
    let bands = [
        BoundingBox::new(rect.x - half, rect.y - half, outer_w, 2.0 * half),
        BoundingBox::new(rect.x - half, rect.bottom() - half, outer_w, 2.0 * half),
        BoundingBox::new(rect.x - half, rect.y + half, 2.0 * half, rect.height - 2.0 * half),
        BoundingBox::new(rect.right() - half, rect.y + half, 2.0 * half, rect.height - 2.0 * half),
    ];
    for band in &bands {
        fill_rect(canvas, band, color);
    }
}

fn blend(dst: &mut Rgba<u8>, src: Rgba<u8>) {
    let alpha = u32::from(src[3]);
    if alpha == 255 {
        *dst = src;
        return;
    }
    for i in 0..3 {
        let mixed = (u32::from(src[i]) * alpha + u32::from(dst[i]) * (255 - alpha)) / 255;
        dst[i] = mixed as u8;
    }
    dst[3] = dst[3].max(src[3]);
}
