//! recall-vector
//!
//! In-memory exact vector index: [`IndexSnapshot`] (immutable, row-aligned ids
//! and normalized embeddings), [`IndexBuilder`] (full rebuild from documents)
//! and [`SnapshotCell`] (atomic publication to concurrent readers).
pub mod publish;
pub mod snapshot;

pub use publish::SnapshotCell;
pub use snapshot::{dot, embed_checked, l2_normalize, IndexBuilder, IndexSnapshot};
