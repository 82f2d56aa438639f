//! Concurrency-safe in-memory stores backing the catalog service.
//!
//! [`RecordStore`] is the seam the service talks to; [`MemoryRecordStore`]
//! is the only backend. Every value crossing the store boundary is cloned,
//! so callers never alias stored data.

pub mod error;
pub mod identity;
pub mod memory;
pub mod rating;
pub mod record;
pub mod testing;

pub use error::StoreError;
pub use identity::{Identity, IdentityStore};
pub use memory::MemoryRecordStore;
pub use rating::RatingStore;
pub use record::{RecordSink, RecordStore, SearchSummary, validate_record_id};
