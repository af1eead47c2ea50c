//! Object-storage client interface consumed by `bucket-fs`.
//!
//! The filesystem layer only ever talks to an [`ObjectClient`]. Concrete stores (S3 SDKs,
//! emulators, test doubles) plug in behind that trait.

mod backends;
mod counting;
pub mod error;
pub mod listing;
pub mod models;
mod object_client;

#[cfg(feature = "local-dir-client")]
pub use backends::LocalDirClient;
#[cfg(feature = "memory-client")]
pub use backends::MemoryClient;
pub use counting::{CallCounts, CountingClient};
pub use error::ClientError;
pub use models::{
    GetObjectOutput, GetObjectRequest, ListObjectsOutput, ListObjectsRequest, ObjectMeta,
    ObjectSummary,
};
pub use object_client::{ByteStream, ObjectClient};
