//! Device identity store implementations.

#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "memory")]
pub use memory::MemoryIdentityStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteIdentityStore;
