//! Adapters implementing the identity outbound ports.

pub mod memory;
pub mod pbkdf2;

pub use memory::InMemoryIdentityStore;
pub use pbkdf2::Pbkdf2Hasher;
