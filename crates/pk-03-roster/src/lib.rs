//! # Roster & Release (pk-03)
//!
//! Links students to a controlling Educator and at most one claiming
//! Guardian, and runs the release state machine gated on the Guardian's
//! same-day `school_reached` signal.
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  adapters/ - InMemoryStudentStore, StoreDirectory               │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ implements ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  ports/outbound.rs - StudentStore (conditional claim / release) │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ uses ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  service.rs - RosterService (create, enroll, attach, list)      │
//! │  release.rs - RosterService::release                            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Student States
//!
//! Two orthogonal axes:
//!
//! - guardianship: `Unclaimed → Claimed` (set once, by conditional write)
//! - release: `Active → Released` (terminal)

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod release;
pub mod service;

pub use adapters::{InMemoryStudentStore, StoreDirectory};
pub use domain::{ClaimOutcome, InlineChild, NewStudent, ReleaseOutcome};
pub use ports::StudentStore;
pub use release::{ALREADY_RELEASED, SCHOOL_REACHED_REQUIRED};
pub use service::RosterService;
