//! Pipeline entry points for exam synchronization.
//!
//! - `SyncOrchestrator`: discover, fetch and merge one collection
//! - `update_all`: sync every stored collection in turn
//! - `ChunkPartitioner`: split large collections into chunk files
//! - `ManifestBuilder`: rebuild `manifest.json`
//! - `validate_store` / `check_for_updates`: offline checks

pub mod batch;
pub mod check;
pub mod chunk;
pub mod diff;
pub mod fingerprint;
pub mod manifest;
pub mod pipeline;
pub mod sync;
pub mod validate;

pub use batch::update_all;
pub use check::{check_for_updates, check_for_updates_online};
pub use chunk::{ChunkPartitioner, PartitionResult};
pub use diff::{Change, ChangeDetector, UpdateReason};
pub use fingerprint::Fingerprint;
pub use manifest::ManifestBuilder;
pub use pipeline::{PipelineReport, run_pipeline};
pub use sync::{Collaborators, SyncOptions, SyncOrchestrator, SyncOutcome, SyncReport, SyncStats};
pub use validate::{Issue, StoreReport, validate_store};
