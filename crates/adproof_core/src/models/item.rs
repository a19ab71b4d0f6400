//! Queue item and artifact structures.

use serde::{Deserialize, Serialize};

use super::enums::{ComplianceStatus, InputType, ItemStatus};

/// Opaque binary blob produced by recording or proof-pack generation.
#[derive(Clone, PartialEq, Eq)]
pub struct Artifact {
    /// MIME type of the payload (e.g. `video/x-motion-jpeg`, `application/zip`).
    pub mime_type: String,
    /// Raw payload bytes.
    pub data: Vec<u8>,
}

impl Artifact {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl std::fmt::Debug for Artifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Artifact")
            .field("mime_type", &self.mime_type)
            .field("len", &self.data.len())
            .finish()
    }
}

/// A single creative in the batch queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItem {
    /// Unique item identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// How `content` is interpreted.
    pub input_type: InputType,
    /// Raw markup for tags, bundle-store key for bundles.
    pub content: String,
    /// Creative width in CSS pixels.
    pub width: u32,
    /// Creative height in CSS pixels.
    pub height: u32,
    /// Current status.
    pub status: ItemStatus,
    /// Error message if status is Error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Resolved compliance result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compliance_status: Option<ComplianceStatus>,
    /// Wall-clock time spent on this item in the last run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<u64>,
    /// Proof pack produced for this item.
    #[serde(skip)]
    pub artifact: Option<Artifact>,
}

impl BatchItem {
    /// Create a new pending item with a fresh identifier.
    pub fn new(
        name: impl Into<String>,
        input_type: InputType,
        content: impl Into<String>,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            input_type,
            content: content.into(),
            width,
            height,
            status: ItemStatus::Pending,
            error: None,
            compliance_status: None,
            processing_time_ms: None,
            artifact: None,
        }
    }

    /// Create a pending tag item.
    pub fn tag(name: impl Into<String>, markup: impl Into<String>, width: u32, height: u32) -> Self {
        Self::new(name, InputType::Tag, markup, width, height)
    }

    /// Create a pending bundle item referencing extracted-bundle storage.
    pub fn bundle(name: impl Into<String>, key: impl Into<String>, width: u32, height: u32) -> Self {
        Self::new(name, InputType::Bundle, key, width, height)
    }

    /// Size label used in logs and summaries.
    pub fn size_label(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }

    /// Drop the results of any previous run.
    pub fn reset(&mut self) {
        self.status = ItemStatus::Pending;
        self.error = None;
        self.compliance_status = None;
        self.processing_time_ms = None;
        self.artifact = None;
    }
}
