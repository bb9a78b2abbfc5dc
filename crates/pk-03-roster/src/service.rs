//! Roster and guardianship linkage.
//!
//! Each linkage mutation touches two aggregates: the student record and a
//! roster set on an identity. The student write always goes first; the
//! roster append is deduplicated, so a retry after a partial failure
//! converges.

use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::{ClaimOutcome, InlineChild, NewStudent};
use crate::ports::StudentStore;
use pickup_types::{
    CoreError, CoreResult, Identity, IdentityId, NotificationType, Party, Role, Student,
    StudentId, TimeSource,
};
use pk_01_identity::{Caller, IdentityStore};
use pk_02_notifications::{NotificationDraft, NotificationLedger, NotificationView};

pub struct RosterService {
    pub(crate) students: Arc<dyn StudentStore>,
    pub(crate) identities: Arc<dyn IdentityStore>,
    pub(crate) ledger: Arc<NotificationLedger>,
    pub(crate) clock: Arc<dyn TimeSource>,
}

pub(crate) fn require(caller: &Caller, role: Role) -> CoreResult<()> {
    if caller.role == role {
        Ok(())
    } else {
        Err(CoreError::forbidden(format!(
            "Access denied. Requires {} role",
            role
        )))
    }
}

/// Whether `educator` controls `student`: named as its educator, or the
/// student sits on the educator's roster.
pub(crate) fn controls(educator: &Identity, student: &Student) -> bool {
    student.educator == Some(educator.id) || educator.roster_contains(student.id)
}

impl RosterService {
    pub fn new(
        students: Arc<dyn StudentStore>,
        identities: Arc<dyn IdentityStore>,
        ledger: Arc<NotificationLedger>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            students,
            identities,
            ledger,
            clock,
        }
    }

    pub fn ledger(&self) -> &Arc<NotificationLedger> {
        &self.ledger
    }

    pub(crate) async fn load(&self, id: StudentId) -> CoreResult<Student> {
        self.students
            .get(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Student not found"))
    }

    pub(crate) async fn identity(&self, caller: &Caller) -> CoreResult<Identity> {
        self.identities
            .get(caller.id)
            .await?
            .ok_or(CoreError::IdentityNotFound)
    }

    /// Create an unclaimed student controlled by the calling Educator.
    pub async fn create_student(&self, caller: &Caller, input: NewStudent) -> CoreResult<Student> {
        require(caller, Role::Educator)?;
        let student = input.build("", Some(caller.id), self.clock.now())?;
        let student = self.students.insert(student).await?;
        self.identities.add_to_roster(caller.id, student.id).await?;

        info!(student_id = %student.id, educator = %caller.id, "Created student");
        Ok(student)
    }

    /// Create students listed inline at Guardian registration, pre-claimed
    /// by `guardian`. A `teacherId` that does not resolve to an Educator is
    /// ignored.
    pub async fn enroll_children(
        &self,
        guardian: IdentityId,
        children: &[InlineChild],
    ) -> CoreResult<Vec<Student>> {
        InlineChild::validate_all(children)?;
        let now = self.clock.now();
        let mut created = Vec::with_capacity(children.len());

        for (i, child) in children.iter().enumerate() {
            let educator = match child.teacher_id {
                Some(id) => match self.identities.get(id).await? {
                    Some(identity) if identity.role() == Role::Educator => Some(id),
                    _ => {
                        warn!(teacher_id = %id, "Inline child names unknown educator");
                        None
                    }
                },
                None => None,
            };

            let mut student = child
                .student
                .build(&format!("children[{}].", i), educator, now)?;
            student.guardian = Some(guardian);
            student.relation = child.relation();

            let student = self.students.insert(student).await?;
            self.identities.add_to_roster(guardian, student.id).await?;
            if let Some(educator) = educator {
                self.identities.add_to_roster(educator, student.id).await?;
            }
            created.push(student);
        }

        if !created.is_empty() {
            info!(guardian = %guardian, count = created.len(), "Enrolled inline children");
        }
        Ok(created)
    }

    /// Claim an existing student for the calling Guardian.
    ///
    /// # Errors
    /// - `NotFound`: no such student
    /// - `Conflict`: already claimed by a different Guardian
    pub async fn attach_student(
        &self,
        caller: &Caller,
        student: StudentId,
        relation: Option<String>,
    ) -> CoreResult<Student> {
        require(caller, Role::Guardian)?;
        let relation = relation
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());

        let student = match self
            .students
            .claim(student, caller.id, relation, self.clock.now())
            .await?
        {
            ClaimOutcome::Claimed(s) => {
                info!(student_id = %s.id, guardian = %caller.id, "Student claimed");
                s
            }
            ClaimOutcome::AlreadyOwned(s) => s,
            ClaimOutcome::ClaimedByOther => {
                return Err(CoreError::conflict(
                    "Student is already linked to another parent",
                ))
            }
            ClaimOutcome::Missing => return Err(CoreError::not_found("Student not found")),
        };

        self.identities.add_to_roster(caller.id, student.id).await?;
        Ok(student)
    }

    /// Students the calling Educator controls, by name.
    pub async fn list_students(&self, caller: &Caller) -> CoreResult<Vec<Student>> {
        require(caller, Role::Educator)?;
        let educator = self.identity(caller).await?;
        self.students
            .list_for_educator(educator.id, educator.roster())
            .await
    }

    /// # Errors
    /// - `NotFound`: no such student
    /// - `Forbidden`: the caller does not control it
    pub async fn get_student(&self, caller: &Caller, id: StudentId) -> CoreResult<Student> {
        require(caller, Role::Educator)?;
        let educator = self.identity(caller).await?;
        let student = self.load(id).await?;
        if !controls(&educator, &student) {
            return Err(CoreError::forbidden(
                "Access denied. Student is not on your roster",
            ));
        }
        Ok(student)
    }

    /// Students claimed by the calling Guardian.
    pub async fn list_children(&self, caller: &Caller) -> CoreResult<Vec<Student>> {
        require(caller, Role::Guardian)?;
        let guardian = self.identity(caller).await?;
        let mut out = Vec::with_capacity(guardian.roster().len());
        for id in guardian.roster() {
            if let Some(student) = self.students.get(*id).await? {
                out.push(student);
            }
        }
        Ok(out)
    }

    /// A Guardian may only signal arrival for a student they have claimed.
    pub async fn ensure_guardian_of(
        &self,
        caller: &Caller,
        related: Option<StudentId>,
    ) -> CoreResult<StudentId> {
        require(caller, Role::Guardian)?;
        let id = related.ok_or_else(|| {
            CoreError::invalid(
                "relatedStudent",
                "relatedStudent is required for school_reached notifications",
            )
        })?;
        let student = self.load(id).await?;
        if student.guardian != Some(caller.id) {
            return Err(CoreError::forbidden(
                "Access denied. Student is not linked to your account",
            ));
        }
        Ok(id)
    }

    /// Guardian → Educator send. `school_reached` requires a claimed
    /// related student.
    pub async fn send_from_guardian(
        &self,
        caller: &Caller,
        educator: IdentityId,
        draft: NotificationDraft,
    ) -> CoreResult<NotificationView> {
        require(caller, Role::Guardian)?;
        if draft.kind_or_default() == NotificationType::SchoolReached {
            self.ensure_guardian_of(caller, draft.related_student).await?;
        }
        self.ledger
            .send(caller.party(), Party::educator(educator), draft)
            .await
    }
}
