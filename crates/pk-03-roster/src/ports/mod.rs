//! Ports for the roster subsystem.

pub mod outbound;

pub use outbound::StudentStore;
