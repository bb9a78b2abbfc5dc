//! Student release state machine.
//!
//! ```text
//!   Active ──release()──► Released { at, by }   (terminal)
//! ```
//!
//! Preconditions, checked in order:
//!
//! | # | Check | Failure |
//! |---|-------|---------|
//! | 1 | caller is an Educator | `Forbidden` |
//! | 2 | caller controls the student | `Forbidden` |
//! | 3 | `school_reached` for this student reached the caller today | `PreconditionNotMet` |
//! | 4 | student still active (conditional write) | `Conflict` |
//!
//! After the state write commits, a `student_released` notification goes to
//! the claiming Guardian. A failure there is logged and the release stands.

use tracing::{error, info};

use crate::domain::ReleaseOutcome;
use crate::service::{controls, require, RosterService};
use pickup_types::{
    start_of_local_day, CoreError, CoreResult, NotificationType, Party, Priority, Role, Student,
    StudentId,
};
use pk_01_identity::Caller;
use pk_02_notifications::NotificationDraft;

pub const SCHOOL_REACHED_REQUIRED: &str = "parent must send school_reached first";
pub const ALREADY_RELEASED: &str = "student already released";

impl RosterService {
    pub async fn release(&self, caller: &Caller, id: StudentId) -> CoreResult<Student> {
        require(caller, Role::Educator)?;
        let educator = self.identity(caller).await?;
        let student = self.load(id).await?;
        if !controls(&educator, &student) {
            return Err(CoreError::forbidden(
                "Access denied. Student is not on your roster",
            ));
        }

        let now = self.clock.now();
        let signalled = self
            .ledger
            .school_reached_since(caller.id, id, start_of_local_day(now))
            .await?;
        if !signalled {
            return Err(CoreError::PreconditionNotMet(
                SCHOOL_REACHED_REQUIRED.to_string(),
            ));
        }

        let student = match self.students.mark_released(id, caller.id, now).await? {
            ReleaseOutcome::Released(s) => s,
            ReleaseOutcome::AlreadyReleased => return Err(CoreError::conflict(ALREADY_RELEASED)),
            ReleaseOutcome::Missing => return Err(CoreError::not_found("Student not found")),
        };
        info!(student_id = %id, educator = %caller.id, "Student released");

        if let Some(guardian) = student.guardian {
            let draft = NotificationDraft::new(
                "Student Released",
                format!("{} has been released", student.full_name),
            )
            .kind(NotificationType::StudentReleased)
            .priority(Priority::High)
            .about(id);

            if let Err(e) = self
                .ledger
                .send(Party::educator(caller.id), Party::guardian(guardian), draft)
                .await
            {
                error!(
                    student_id = %id,
                    guardian = %guardian,
                    error = %e,
                    "Release committed but notification failed"
                );
            }
        }

        Ok(student)
    }
}
