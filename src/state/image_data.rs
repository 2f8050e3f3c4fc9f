//! Per-image session data, keyed by image key.
//!
//! Holds what a host session knows about each image: the boxes to seed the
//! next mount with and the last value the widget returned. Entries are
//! created on first access.

use std::collections::HashMap;

use crate::model::BboxRecord;

/// Data associated with a specific image.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImageSession {
    /// Boxes to seed the widget with, `[x, y, w, h]`
    pub bboxes: Vec<[f32; 4]>,
    /// Label ids parallel to `bboxes`
    pub labels: Vec<usize>,
    /// Last value returned by the widget for this image
    pub result: Option<Vec<BboxRecord>>,
}

impl ImageSession {
    /// Session seeded with initial boxes.
    pub fn with_initial(bboxes: Vec<[f32; 4]>, labels: Vec<usize>) -> Self {
        Self {
            bboxes,
            labels,
            result: None,
        }
    }
}

/// Storage for per-image sessions, keyed by image key (path or URL).
#[derive(Clone, Debug, Default)]
pub struct ImageSessionStore {
    /// Map from image key to its session
    data: HashMap<String, ImageSession>,
}

impl ImageSessionStore {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
        }
    }

    /// Get data for an image, creating default if not exists
    pub fn get_or_create(&mut self, key: &str) -> &mut ImageSession {
        self.data.entry(key.to_string()).or_default()
    }

    /// Get data for an image, if any was created
    pub fn get(&self, key: &str) -> Option<&ImageSession> {
        self.data.get(key)
    }

    /// Check if data exists for an image
    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Insert or replace the session for an image.
    pub fn insert(&mut self, key: &str, session: ImageSession) {
        self.data.insert(key.to_string(), session);
    }

    /// Store the value the widget returned and make it the seed for the
    /// next mount of the same image.
    pub fn record_result(&mut self, key: &str, records: Vec<BboxRecord>) {
        let session = self.get_or_create(key);
        session.bboxes = records.iter().map(|r| r.bbox).collect();
        session.labels = records.iter().map(|r| r.label_id).collect();
        session.result = Some(records);
    }

    /// Boxes and labels to mount an image with; empty for unseen images.
    pub fn initial_for(&self, key: &str) -> (Vec<[f32; 4]>, Vec<usize>) {
        self.data
            .get(key)
            .map(|s| (s.bboxes.clone(), s.labels.clone()))
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_created_on_first_access() {
        let mut store = ImageSessionStore::new();
        assert!(!store.contains("image/a.jpg"));
        store.get_or_create("image/a.jpg");
        assert!(store.contains("image/a.jpg"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_record_result_seeds_next_mount() {
        let mut store = ImageSessionStore::new();
        store.insert(
            "image/a.jpg",
            ImageSession::with_initial(vec![[0.0, 0.0, 100.0, 100.0]], vec![0]),
        );

        store.record_result(
            "image/a.jpg",
            vec![BboxRecord {
                bbox: [5.0, 5.0, 20.0, 20.0],
                label_id: 3,
            }],
        );

        let (bboxes, labels) = store.initial_for("image/a.jpg");
        assert_eq!(bboxes, vec![[5.0, 5.0, 20.0, 20.0]]);
        assert_eq!(labels, vec![3]);
        assert!(store.get("image/a.jpg").unwrap().result.is_some());

        assert_eq!(store.initial_for("image/b.jpg"), (vec![], vec![]));
    }
}
