//! The channel back to the embedding host.

use crate::model::BboxRecord;

/// Receives everything the widget sends back to its host.
pub trait HostSink {
    /// New authoritative value for the embedding call.
    fn set_component_value(&mut self, records: &[BboxRecord]);

    /// The canvas needs this many pixels of vertical space.
    fn set_frame_height(&mut self, height: f32);
}

/// Serialize a value the way it crosses the host boundary.
pub fn encode_value(records: &[BboxRecord]) -> Result<String, serde_json::Error> {
    serde_json::to_string(records)
}

/// A host that keeps every emission, for assertions.
#[derive(Debug, Clone, Default)]
pub struct RecordingHost {
    /// Every value emitted, oldest first
    pub values: Vec<Vec<BboxRecord>>,
    /// Every frame height requested, oldest first
    pub frame_heights: Vec<f32>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent value, if any was emitted.
    pub fn last_value(&self) -> Option<&[BboxRecord]> {
        self.values.last().map(Vec::as_slice)
    }

    pub fn emission_count(&self) -> usize {
        self.values.len()
    }
}

impl HostSink for RecordingHost {
    fn set_component_value(&mut self, records: &[BboxRecord]) {
        self.values.push(records.to_vec());
    }

    fn set_frame_height(&mut self, height: f32) {
        self.frame_heights.push(height);
    }
}
