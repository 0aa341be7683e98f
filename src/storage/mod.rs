//! Storage module
//!
//! Object-store access for both ends of a conversion pass.
//!
//! # Overview
//!
//! - `BlobStore` - builds an object store client from a bucket URL
//! - `BlobLister` - paginated, de-duplicated key listing
//! - `BlobReader` - fetches one object as text
//! - `BlobWriter` - uploads artifacts and reports an outcome per artifact

mod lister;
mod reader;
mod store;
mod writer;

pub use lister::BlobLister;
pub use reader::{BlobReader, ReadFailure, ReadResult};
pub use store::BlobStore;
pub use writer::{ArtifactOutcome, BlobWriter};
