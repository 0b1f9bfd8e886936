//! Domain models for evalscope.
//!
//! - `access`: absence-aware JSON traversal
//! - `record`: views over run, sample and check records
//! - `overview`: display projection of a run header
//! - `error`: explorer error taxonomy

pub mod access;
pub mod error;
pub mod overview;
pub mod record;

pub use access::Field;
pub use error::{ExplorerError, Result};
pub use overview::{display, RunOverview, PLACEHOLDER};
pub use record::{CheckType, CheckView, RunView, SampleView, REQUIRED_METADATA};
