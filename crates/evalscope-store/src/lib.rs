//! evalscope-store: persistence for evaluation run documents
//!
//! Run documents are produced by an external evaluation harness, one JSON
//! file per run. This crate locates, loads and rewrites them without
//! interpreting their contents beyond `evaluation_id`.
//!
//! ## Layer 0 - Data/Persistence
//!
//! Focus: lossless round-trips. Unknown fields and key order survive a
//! read-modify-write cycle.
//!
//! ## Key Components
//!
//! - `RunStore`: backend-agnostic async trait (`list`, `load`, `find`, `save`)
//! - `FsRunStore`: filesystem implementation over a results directory
//! - `MemoryRunStore`: in-memory fake for tests

mod error;
pub mod fakes;
pub mod fs_store;
pub mod storage_traits;

pub use error::StorageError;
pub use fs_store::FsRunStore;
pub use storage_traits::{
    evaluation_id_of, parse_document, serialize_document, RevisionDigest, RunLocation, RunStore,
    StorageResult, StoredRun,
};
