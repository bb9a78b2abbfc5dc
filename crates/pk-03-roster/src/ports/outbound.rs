//! Outbound (Driven) ports for the roster subsystem.

use async_trait::async_trait;

use crate::domain::{ClaimOutcome, ReleaseOutcome};
use pickup_types::{CoreResult, IdentityId, Student, StudentId, Timestamp};

/// Persistent student records.
///
/// `claim` and `mark_released` are conditional writes: the check and the
/// update happen as one step, so concurrent callers cannot both win.
#[async_trait]
pub trait StudentStore: Send + Sync {
    async fn insert(&self, student: Student) -> CoreResult<Student>;

    async fn get(&self, id: StudentId) -> CoreResult<Option<Student>>;

    /// Students controlled by `educator` or listed in `roster`, by name.
    async fn list_for_educator(
        &self,
        educator: IdentityId,
        roster: &[StudentId],
    ) -> CoreResult<Vec<Student>>;

    /// Set the guardian only if it is unset (or already `guardian`).
    async fn claim(
        &self,
        id: StudentId,
        guardian: IdentityId,
        relation: Option<String>,
        at: Timestamp,
    ) -> CoreResult<ClaimOutcome>;

    /// Flip to released only if the student is still active.
    async fn mark_released(
        &self,
        id: StudentId,
        by: IdentityId,
        at: Timestamp,
    ) -> CoreResult<ReleaseOutcome>;
}
