//! proofdb-core
//!
//! Shared data model, error taxonomy, configuration and the seam traits the
//! text, vector and hybrid crates plug into. Also owns the corpus loader.
pub mod config;
pub mod corpus;
pub mod error;
pub mod traits;
pub mod types;

pub use corpus::Corpus;
pub use error::{Error, Result};
pub use types::{FusedHit, FusionParams, Hit, HitMetadata, RawRecord, Record, RetrievalMode, RowIdx};
