//! Item step implementations.
//!
//! Each step handles one per-item status of the batch lifecycle.

mod compliance;
mod load;
mod proof_pack;
mod record;

pub use compliance::ComplianceStep;
pub use load::LoadStep;
pub use proof_pack::ProofPackStep;
pub use record::RecordStep;
