//! Hybrid retrieval: rank fusion, MMR diversification, the query cache and
//! the [`RetrievalEngine`] that ties them to the lexical and vector indexes.
pub mod answer;
pub mod cache;
pub mod diversity;
pub mod engine;
pub mod fusion;

pub use answer::compose_answer;
pub use cache::QueryCache;
pub use diversity::{diversify, MmrParams};
pub use engine::{IndexState, RetrievalEngine, UpsertOutcome};
pub use fusion::fuse;
