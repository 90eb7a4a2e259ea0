//! proofdb-vector
//!
//! Dense index over a persistent LanceDB collection: batched insertion,
//! nearest-neighbour queries keyed back to corpus rows, and the `index`
//! operation that populates the collection from a corpus file.
pub mod dense;
pub mod indexer;
pub mod schema;
pub mod table;

pub use dense::{distance_to_score, DenseIndex, DenseMetadata};
pub use indexer::{index, index_corpus};
