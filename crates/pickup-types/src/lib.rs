//! # Pickup Types Crate
//!
//! Entities, identifiers and errors shared by the pickup subsystems.
//!
//! ## Clusters
//!
//! - **Identity**: `Identity`, `RoleProfile` (Guardian / Educator / Supervisor)
//! - **Roster**: `Student`, `ReleaseState`
//! - **Messaging**: `Notification`, `Party`, `NotificationType`, `Priority`
//!
//! ## Design Principles
//!
//! - **One identity table**: a single `Identity` record carries a role-specific
//!   payload selected by its immutable `Role` tag.
//! - **Explicit polymorphic references**: a notification endpoint is an
//!   `(IdentityId, Role)` pair, resolved by lookup keyed on the role.

pub mod entities;
pub mod errors;
pub mod ids;
pub mod time;

pub use entities::*;
pub use errors::{CoreError, CoreResult};
pub use ids::{IdentityId, NotificationId, StudentId};
pub use time::{start_of_local_day, ManualTimeSource, SystemTimeSource, TimeSource, Timestamp};
