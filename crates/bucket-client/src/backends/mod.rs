//! Object-store backend implementations.

#[cfg(feature = "local-dir-client")]
mod local_dir;
#[cfg(feature = "local-dir-client")]
pub use local_dir::LocalDirClient;

#[cfg(feature = "memory-client")]
mod memory;
#[cfg(feature = "memory-client")]
pub use memory::MemoryClient;
