//! Batch queue state management.

use std::collections::HashMap;

use chrono::{DateTime, Local};
use serde::Serialize;
use thiserror::Error;

use crate::models::{Artifact, BatchItem, ComplianceStatus, ItemStatus};

/// Errors from queue edits.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum QueueError {
    /// The queue is being processed; edits wait until the run ends.
    #[error("Queue is locked while a batch is processing")]
    Locked,

    #[error("No item with id '{0}'")]
    NotFound(String),

    #[error("Index {index} is out of range for a queue of {len}")]
    OutOfRange { index: usize, len: usize },
}

/// Result type for queue operations.
pub type QueueResult<T> = Result<T, QueueError>;

/// Queue-level view handed to presentation layers.
#[derive(Debug, Clone, Serialize)]
pub struct BatchState {
    /// Items in processing order.
    pub items: Vec<BatchItem>,
    pub is_processing: bool,
    /// Index of the active item; `None` when idle.
    pub current_index: Option<usize>,
    pub start_time: Option<DateTime<Local>>,
    pub end_time: Option<DateTime<Local>>,
    /// Selected item ids.
    pub selected: Vec<String>,
}

/// Ordered queue of creatives.
#[derive(Debug, Default)]
pub struct BatchQueue {
    /// Items in queue order.
    items: Vec<BatchItem>,
    /// Selected item ids (UI selection for move/remove).
    selected: Vec<String>,
    is_processing: bool,
    current_index: Option<usize>,
    start_time: Option<DateTime<Local>>,
    end_time: Option<DateTime<Local>>,
}

impl BatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_idle(&self) -> QueueResult<()> {
        if self.is_processing {
            Err(QueueError::Locked)
        } else {
            Ok(())
        }
    }

    /// Get all items.
    pub fn items(&self) -> &[BatchItem] {
        &self.items
    }

    /// Get an item by index.
    pub fn get(&self, index: usize) -> Option<&BatchItem> {
        self.items.get(index)
    }

    /// Get an item by ID.
    pub fn get_by_id(&self, id: &str) -> Option<&BatchItem> {
        self.items.iter().find(|i| i.id == id)
    }

    /// Position of an item in the queue.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|i| i.id == id)
    }

    /// Number of items in queue.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if queue is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_processing(&self) -> bool {
        self.is_processing
    }

    /// Index of the active item; `None` when idle.
    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    /// Add an item to the end of the queue. Returns its id.
    pub fn add(&mut self, item: BatchItem) -> QueueResult<String> {
        self.ensure_idle()?;
        let id = item.id.clone();
        tracing::debug!("Queued {} '{}' ({})", item.input_type, item.name, item.size_label());
        self.items.push(item);
        Ok(id)
    }

    /// Add multiple items in order.
    pub fn add_all(&mut self, items: Vec<BatchItem>) -> QueueResult<Vec<String>> {
        self.ensure_idle()?;
        let ids = items.iter().map(|i| i.id.clone()).collect();
        self.items.extend(items);
        Ok(ids)
    }

    /// Queue raw ad markup.
    pub fn add_tag(
        &mut self,
        name: impl Into<String>,
        markup: impl Into<String>,
        width: u32,
        height: u32,
    ) -> QueueResult<String> {
        self.add(BatchItem::tag(name, markup, width, height))
    }

    /// Queue an extracted bundle by its store key.
    pub fn add_bundle(
        &mut self,
        name: impl Into<String>,
        bundle_key: impl Into<String>,
        width: u32,
        height: u32,
    ) -> QueueResult<String> {
        self.add(BatchItem::bundle(name, bundle_key, width, height))
    }

    /// Remove an item by id.
    pub fn remove(&mut self, id: &str) -> QueueResult<BatchItem> {
        self.ensure_idle()?;
        let index = self
            .index_of(id)
            .ok_or_else(|| QueueError::NotFound(id.to_string()))?;
        self.selected.retain(|s| s != id);
        Ok(self.items.remove(index))
    }

    /// Remove items by indices (in descending order to preserve indices).
    pub fn remove_indices(&mut self, mut indices: Vec<usize>) -> QueueResult<usize> {
        self.ensure_idle()?;
        indices.sort_by(|a, b| b.cmp(a));
        indices.dedup();
        let mut removed = 0;
        for idx in indices {
            if idx < self.items.len() {
                let item = self.items.remove(idx);
                self.selected.retain(|s| *s != item.id);
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Move an item from one position to another.
    pub fn move_item(&mut self, from: usize, to: usize) -> QueueResult<()> {
        self.ensure_idle()?;
        let len = self.items.len();
        for index in [from, to] {
            if index >= len {
                return Err(QueueError::OutOfRange { index, len });
            }
        }
        if from != to {
            let item = self.items.remove(from);
            self.items.insert(to, item);
        }
        Ok(())
    }

    /// Move selected items up by one position.
    pub fn move_up(&mut self, indices: &[usize]) -> QueueResult<()> {
        self.ensure_idle()?;
        let mut sorted: Vec<usize> = indices.to_vec();
        sorted.sort();

        for &idx in &sorted {
            if idx > 0 && idx < self.items.len() {
                self.items.swap(idx, idx - 1);
            }
        }
        Ok(())
    }

    /// Move selected items down by one position.
    pub fn move_down(&mut self, indices: &[usize]) -> QueueResult<()> {
        self.ensure_idle()?;
        let mut sorted: Vec<usize> = indices.to_vec();
        sorted.sort_by(|a, b| b.cmp(a));

        for &idx in &sorted {
            if idx + 1 < self.items.len() {
                self.items.swap(idx, idx + 1);
            }
        }
        Ok(())
    }

    /// Replace the selection. Unknown ids are ignored.
    pub fn select(&mut self, ids: &[String]) {
        self.selected = ids
            .iter()
            .filter(|id| self.get_by_id(id).is_some())
            .cloned()
            .collect();
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    /// Clear the queue, the selection and any run bookkeeping.
    pub fn clear(&mut self) -> QueueResult<()> {
        self.ensure_idle()?;
        self.items.clear();
        self.selected.clear();
        self.current_index = None;
        self.start_time = None;
        self.end_time = None;
        Ok(())
    }

    /// Item counts per status.
    pub fn counts(&self) -> HashMap<ItemStatus, usize> {
        let mut counts = HashMap::new();
        for item in &self.items {
            *counts.entry(item.status).or_insert(0) += 1;
        }
        counts
    }

    /// Snapshot of the queue-level state.
    pub fn state(&self) -> BatchState {
        BatchState {
            items: self.items.clone(),
            is_processing: self.is_processing,
            current_index: self.current_index,
            start_time: self.start_time,
            end_time: self.end_time,
            selected: self.selected.clone(),
        }
    }

    // Run bookkeeping, driven by the orchestrator only.

    pub(crate) fn begin_run(&mut self) {
        for item in &mut self.items {
            item.reset();
        }
        self.is_processing = true;
        self.current_index = None;
        self.start_time = Some(Local::now());
        self.end_time = None;
    }

    pub(crate) fn set_current(&mut self, index: usize) {
        self.current_index = Some(index);
    }

    pub(crate) fn set_status(&mut self, index: usize, status: ItemStatus) {
        if let Some(item) = self.items.get_mut(index) {
            item.status = status;
        }
    }

    pub(crate) fn set_error(&mut self, index: usize, message: String, elapsed_ms: u64) {
        if let Some(item) = self.items.get_mut(index) {
            item.status = ItemStatus::Error;
            item.error = Some(message);
            item.processing_time_ms = Some(elapsed_ms);
        }
    }

    pub(crate) fn set_complete(
        &mut self,
        index: usize,
        compliance: ComplianceStatus,
        elapsed_ms: u64,
        artifact: Option<Artifact>,
    ) {
        if let Some(item) = self.items.get_mut(index) {
            item.status = ItemStatus::Complete;
            item.compliance_status = Some(compliance);
            item.processing_time_ms = Some(elapsed_ms);
            item.artifact = artifact;
        }
    }

    pub(crate) fn end_run(&mut self) {
        self.is_processing = false;
        self.current_index = None;
        self.end_time = Some(Local::now());
    }
}
