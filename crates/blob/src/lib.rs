pub mod disk;
pub mod error;
pub mod store;
pub mod types;

pub use disk::DiskBlobStore;
pub use error::BlobError;
pub use store::BlobStore;
pub use types::{BlobRecord, file_suffix};
