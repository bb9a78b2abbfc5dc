//! Ports for the identity subsystem.

pub mod outbound;

pub use outbound::{IdentityStore, PasswordHasher};
