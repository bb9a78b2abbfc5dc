//! # Identity Subsystem (pk-01)
//!
//! Holds user records for Guardians and Educators, verifies bearer
//! credentials and runs the account operations (register, login, profile).
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  adapters/ - InMemoryIdentityStore, Pbkdf2Hasher                │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ implements ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  ports/outbound.rs - IdentityStore, PasswordHasher              │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ uses ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  domain/  - registration inputs, profile updates, views         │
//! │  guard.rs - TokenIssuer, AuthGuard, Caller                      │
//! │  service.rs - AccountService                                    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guard Contract
//!
//! | Failure | Error |
//! |---------|-------|
//! | token absent / malformed / expired / wrong key | `Unauthenticated` |
//! | signed subject no longer stored | `IdentityNotFound` |
//! | role not in the required set | `Forbidden` |
//! | path id differs from caller id | `Forbidden` |

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod domain;
pub mod guard;
pub mod ports;
pub mod service;

pub use adapters::{InMemoryIdentityStore, Pbkdf2Hasher};
pub use domain::{
    EducatorRegistration, EducatorSummary, EducatorUpdate, GuardianRegistration, GuardianUpdate,
    Session,
};
pub use guard::{
    AuthGuard, Caller, Claims, TokenConfig, TokenIssuer, DEFAULT_TOKEN_TTL, DEVELOPMENT_TOKEN_SECRET,
};
pub use ports::{IdentityStore, PasswordHasher};
pub use service::AccountService;
