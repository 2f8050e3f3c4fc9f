//! Ordered label list supplied by the host.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The ordered list of label names. A label id is an index into it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelList {
    names: Vec<String>,
}

impl LabelList {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Name of the label at `label_id`.
    pub fn get(&self, label_id: usize) -> Option<&str> {
        self.names.get(label_id).map(String::as_str)
    }

    /// Position of a label by name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Check that a (possibly negative) id points into the list.
    pub fn validate(&self, label_id: i64) -> Result<usize, ValidationError> {
        usize::try_from(label_id)
            .ok()
            .filter(|id| *id < self.names.len())
            .ok_or(ValidationError::LabelOutOfRange {
                label_id,
                len: self.names.len(),
            })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}
