//! Outbound (Driven) ports for the identity subsystem.
//!
//! The persistent document store and the password-hashing primitive are
//! external collaborators; these traits are the only view the services
//! have of them.

use async_trait::async_trait;
use pickup_types::{CoreResult, Identity, IdentityId, Role, StudentId};

/// Persistent identity records (one table, discriminated by role).
///
/// Every method is a single-record read or read-modify-write; there are no
/// multi-record transactions.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Insert a new identity.
    ///
    /// # Errors
    /// - `Conflict`: email (or a present employee id) already taken
    async fn insert(&self, identity: Identity) -> CoreResult<Identity>;

    async fn get(&self, id: IdentityId) -> CoreResult<Option<Identity>>;

    /// Lookup by normalized (trimmed, lower-cased) email.
    async fn find_by_email(&self, email: &str) -> CoreResult<Option<Identity>>;

    /// Replace the profile fields of the stored record with those of
    /// `identity`. Email, password hash, creation time and the roster set
    /// are kept from the stored record, read under the same write, so a
    /// concurrent [`add_to_roster`](Self::add_to_roster) is never lost.
    ///
    /// # Errors
    /// - `NotFound`: no record with that id
    /// - `Conflict`: the role tag differs from the stored one, or the
    ///   employee id collides with another record
    async fn update(&self, identity: Identity) -> CoreResult<Identity>;

    /// Append `student` to the identity's roster set (Guardian children or
    /// Educator students). Returns `true` when the entry was added and
    /// `false` when it was already present.
    ///
    /// # Errors
    /// - `NotFound`: no record with that id
    /// - `Forbidden`: the role carries no roster
    async fn add_to_roster(&self, id: IdentityId, student: StudentId) -> CoreResult<bool>;

    async fn list_by_role(&self, role: Role) -> CoreResult<Vec<Identity>>;
}

/// Password-hashing primitive.
pub trait PasswordHasher: Send + Sync {
    /// Produce a self-describing encoded hash.
    fn hash(&self, password: &str) -> CoreResult<String>;

    /// Constant-time check of `password` against an encoded hash.
    fn verify(&self, password: &str, encoded: &str) -> bool;
}
