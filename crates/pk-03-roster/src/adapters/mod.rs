//! Adapters for the roster subsystem.

pub mod directory;
pub mod memory;

pub use directory::StoreDirectory;
pub use memory::InMemoryStudentStore;
