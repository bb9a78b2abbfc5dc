//! In-memory student store. Conditional writes hold the write lock for the
//! whole check-and-set.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::domain::{ClaimOutcome, ReleaseOutcome};
use crate::ports::StudentStore;
use pickup_types::{
    CoreError, CoreResult, IdentityId, ReleaseState, Student, StudentId, Timestamp,
};

#[derive(Default)]
pub struct InMemoryStudentStore {
    students: RwLock<HashMap<StudentId, Student>>,
}

impl InMemoryStudentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.students.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl StudentStore for InMemoryStudentStore {
    async fn insert(&self, student: Student) -> CoreResult<Student> {
        let mut students = self.students.write();
        if students.contains_key(&student.id) {
            return Err(CoreError::conflict("student id already exists"));
        }
        students.insert(student.id, student.clone());
        Ok(student)
    }

    async fn get(&self, id: StudentId) -> CoreResult<Option<Student>> {
        Ok(self.students.read().get(&id).cloned())
    }

    async fn list_for_educator(
        &self,
        educator: IdentityId,
        roster: &[StudentId],
    ) -> CoreResult<Vec<Student>> {
        let mut out: Vec<Student> = self
            .students
            .read()
            .values()
            .filter(|s| s.educator == Some(educator) || roster.contains(&s.id))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.full_name.cmp(&b.full_name).then(a.id.cmp(&b.id)));
        Ok(out)
    }

    async fn claim(
        &self,
        id: StudentId,
        guardian: IdentityId,
        relation: Option<String>,
        at: Timestamp,
    ) -> CoreResult<ClaimOutcome> {
        let mut students = self.students.write();
        let Some(student) = students.get_mut(&id) else {
            return Ok(ClaimOutcome::Missing);
        };

        match student.guardian {
            Some(owner) if owner != guardian => Ok(ClaimOutcome::ClaimedByOther),
            Some(_) => {
                if relation.is_some() {
                    student.relation = relation;
                    student.updated_at = at;
                }
                Ok(ClaimOutcome::AlreadyOwned(student.clone()))
            }
            None => {
                student.guardian = Some(guardian);
                if relation.is_some() {
                    student.relation = relation;
                }
                student.updated_at = at;
                Ok(ClaimOutcome::Claimed(student.clone()))
            }
        }
    }

    async fn mark_released(
        &self,
        id: StudentId,
        by: IdentityId,
        at: Timestamp,
    ) -> CoreResult<ReleaseOutcome> {
        let mut students = self.students.write();
        let Some(student) = students.get_mut(&id) else {
            return Ok(ReleaseOutcome::Missing);
        };
        if student.is_released() {
            return Ok(ReleaseOutcome::AlreadyReleased);
        }
        student.release = ReleaseState::Released { at, by };
        student.updated_at = at;
        Ok(ReleaseOutcome::Released(student.clone()))
    }
}
