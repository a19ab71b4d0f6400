//! Collaborator contracts supplied by the embedding application.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::{Artifact, BatchItem, ComplianceStatus};
use crate::queue::ExtractedBundle;

/// Latest result reported by the compliance checker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub status: ComplianceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl ComplianceReport {
    pub fn new(status: ComplianceStatus) -> Self {
        Self {
            status,
            summary: None,
        }
    }
}

/// The preview surface, compliance checker and proof-pack builder.
///
/// Every call is awaited in sequence; no two calls overlap. Errors are
/// recorded on the active item using their display text.
#[async_trait]
pub trait CreativeHost: Send + Sync {
    /// Load raw ad markup into the preview at the given size.
    async fn load_tag(&self, markup: &str, width: u32, height: u32) -> anyhow::Result<()>;

    /// Load an extracted bundle and wait until it has been mounted.
    async fn load_bundle(
        &self,
        bundle: &ExtractedBundle,
        width: u32,
        height: u32,
    ) -> anyhow::Result<()>;

    /// Resolve once the creative signals it is ready. There is no timeout.
    async fn wait_for_ad_ready(&self) -> anyhow::Result<()>;

    /// Kick off a compliance run. The result is read with `compliance_result`.
    async fn run_compliance(&self) -> anyhow::Result<()>;

    /// Latest compliance result, if any.
    fn compliance_result(&self) -> Option<ComplianceReport>;

    /// Build the proof pack for `item` from its recording, if one was made.
    async fn generate_proof_pack(
        &self,
        item: &BatchItem,
        recording: Option<&Artifact>,
    ) -> anyhow::Result<Option<Artifact>>;
}

/// Invoked with the final item list after a run completes without cancellation.
pub type CompletionCallback = Box<dyn Fn(&[BatchItem]) + Send + Sync>;
