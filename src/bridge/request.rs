//! Call-time parameters and their one-shot validation into [`ComponentProps`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::bridge::fetch::{ImageSizeFetcher, image_size_or_none};
use crate::bridge::props::ComponentProps;
use crate::color_utils::{Colormap, LabelColorMap};
use crate::constants::DEFAULT_LINE_WIDTH;
use crate::error::{ConfigError, DetectionError, MediaError};
use crate::model::{BboxInfo, LabelList};
use crate::sizing::{ColumnWidth, DisplaySizing, SizingOptions};

/// Where the image to annotate comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    /// Already served somewhere; passed through untouched
    Url(String),
    /// A local file to publish
    Path(PathBuf),
    /// Encoded image bytes to publish
    Bytes(Vec<u8>),
}

/// Publishes image bytes under a servable path.
pub trait MediaStore {
    /// Store `data` and return its path, e.g. `/media/detection-1-a.png`.
    fn publish(&mut self, data: Vec<u8>, extension: &str, key: &str) -> Result<String, MediaError>;

    /// Scheme and authority the paths are served from.
    fn origin(&self) -> Option<&str>;
}

/// Keeps published images in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMediaStore {
    origin: Option<String>,
    next_id: u64,
    files: HashMap<String, Vec<u8>>,
}

impl InMemoryMediaStore {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: Some(origin.into()),
            ..Self::default()
        }
    }

    /// Bytes published under `path`.
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.files.get(path).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl MediaStore for InMemoryMediaStore {
    fn publish(&mut self, data: Vec<u8>, extension: &str, key: &str) -> Result<String, MediaError> {
        self.next_id += 1;
        let path = format!("/media/detection-{}-{}.{}", self.next_id, key, extension);
        log::debug!("Published {} bytes at {}", data.len(), path);
        self.files.insert(path.clone(), data);
        Ok(path)
    }

    fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }
}

/// Parameters of one embedding call.
#[derive(Debug, Clone)]
pub struct DetectionRequest {
    pub image: ImageSource,
    pub label_list: Vec<String>,
    /// Initial boxes, `[x, y, w, h]`
    pub bboxes: Vec<[f32; 4]>,
    /// Label ids parallel to `bboxes`
    pub labels: Vec<i64>,
    pub line_width: f32,
    pub use_space: bool,
    pub sizing: SizingOptions,
    pub key: Option<String>,
    pub colormap: Colormap,
}

impl DetectionRequest {
    pub fn new<I, S>(image: ImageSource, label_list: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            image,
            label_list: label_list.into_iter().map(Into::into).collect(),
            bboxes: Vec::new(),
            labels: Vec::new(),
            line_width: DEFAULT_LINE_WIDTH,
            use_space: false,
            sizing: SizingOptions::default(),
            key: None,
            colormap: Colormap::default(),
        }
    }

    pub fn boxes(mut self, bboxes: Vec<[f32; 4]>, labels: Vec<i64>) -> Self {
        self.bboxes = bboxes;
        self.labels = labels;
        self
    }

    pub fn line_width(mut self, line_width: f32) -> Self {
        self.line_width = line_width;
        self
    }

    pub fn use_space(mut self, use_space: bool) -> Self {
        self.use_space = use_space;
        self
    }

    pub fn width(mut self, width: i64) -> Self {
        self.sizing = self.sizing.width(width);
        self
    }

    pub fn use_column_width(mut self, value: impl Into<ColumnWidth>) -> Self {
        self.sizing = self.sizing.use_column_width(value);
        self
    }

    pub fn use_container_width(mut self, value: bool) -> Self {
        self.sizing = self.sizing.use_container_width(value);
        self
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn colormap(mut self, colormap: Colormap) -> Self {
        self.colormap = colormap;
        self
    }

    /// Check every parameter and resolve the sizing mode.
    pub fn validate(&self) -> Result<DisplaySizing, ConfigError> {
        let sizing = self.sizing.resolve()?;

        if self.bboxes.len() != self.labels.len() {
            return Err(ConfigError::LengthMismatch {
                bboxes: self.bboxes.len(),
                labels: self.labels.len(),
            });
        }

        if !self.line_width.is_finite() || self.line_width <= 0.0 {
            return Err(ConfigError::InvalidLineWidth(self.line_width));
        }

        if self.label_list.is_empty() {
            return Err(ConfigError::EmptyLabelList);
        }

        for (index, &label_id) in self.labels.iter().enumerate() {
            let in_range = usize::try_from(label_id).is_ok_and(|id| id < self.label_list.len());
            if !in_range {
                return Err(ConfigError::LabelOutOfRange {
                    index,
                    label_id,
                    len: self.label_list.len(),
                });
            }
        }

        for (index, bbox) in self.bboxes.iter().enumerate() {
            if bbox.iter().any(|v| !v.is_finite()) {
                return Err(ConfigError::InvalidBox {
                    index,
                    message: format!("non-finite coordinates {:?}", bbox),
                });
            }
            if bbox[2] < 0.0 || bbox[3] < 0.0 {
                return Err(ConfigError::InvalidBox {
                    index,
                    message: format!("negative size {:?}", bbox),
                });
            }
        }

        Ok(sizing)
    }

    /// Validate, publish the image, learn its size and assemble the props.
    ///
    /// Nothing is published when validation fails. A failed size fetch leaves
    /// `image_size` unknown instead of failing the call.
    pub fn build_props(
        &self,
        media: &mut dyn MediaStore,
        fetcher: &dyn ImageSizeFetcher,
    ) -> Result<ComponentProps, DetectionError> {
        let sizing = self.validate()?;
        let image_url = self.resolve_url(media)?;
        let image_size = image_size_or_none(fetcher, &image_url).map(|(w, h)| [w, h]);

        let label_list = LabelList::new(self.label_list.iter().cloned());
        let color_map = LabelColorMap::generate(label_list.names(), self.colormap);

        // Label ids were range-checked in validate
        let bbox_info = self
            .bboxes
            .iter()
            .zip(&self.labels)
            .map(|(bbox, &label_id)| BboxInfo {
                bbox: *bbox,
                label_id,
                label: usize::try_from(label_id)
                    .ok()
                    .and_then(|id| label_list.get(id))
                    .unwrap_or_default()
                    .to_string(),
            })
            .collect();

        log::info!(
            "Prepared detection props for {} ({} boxes, sizing {:?})",
            image_url,
            self.bboxes.len(),
            sizing
        );

        Ok(ComponentProps {
            image_url,
            image_size,
            label_list,
            bbox_info,
            color_map,
            line_width: self.line_width,
            use_space: self.use_space,
            width: sizing.to_wire(),
        })
    }

    fn resolve_url(&self, media: &mut dyn MediaStore) -> Result<String, MediaError> {
        let key = self.key.as_deref().unwrap_or("none");
        let path = match &self.image {
            ImageSource::Url(url) => return Ok(url.clone()),
            ImageSource::Path(path) => {
                let data = std::fs::read(path)?;
                media.publish(data, &path_extension(path), key)?
            }
            ImageSource::Bytes(data) => media.publish(data.clone(), bytes_extension(data), key)?,
        };
        let origin = media.origin().ok_or(MediaError::MissingOrigin)?;
        Ok(format!("{}{}", origin, path))
    }
}

fn path_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_else(|| "png".to_string())
}

fn bytes_extension(data: &[u8]) -> &'static str {
    image::guess_format(data)
        .ok()
        .and_then(|format| format.extensions_str().first().copied())
        .unwrap_or("png")
}
