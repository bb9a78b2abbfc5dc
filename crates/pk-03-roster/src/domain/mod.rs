//! Student inputs and conditional-write outcomes.

use chrono::NaiveDate;
use serde::Deserialize;

use pickup_types::{CoreError, CoreResult, IdentityId, Student, StudentId, Timestamp};

fn present(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Fields of a student created by an Educator.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStudent {
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub grade: Option<String>,
    pub photo: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
}

impl NewStudent {
    pub fn named(full_name: impl Into<String>) -> Self {
        Self {
            full_name: Some(full_name.into()),
            ..Default::default()
        }
    }

    pub(crate) fn build(
        &self,
        field_prefix: &str,
        educator: Option<IdentityId>,
        now: Timestamp,
    ) -> CoreResult<Student> {
        let full_name = present(&self.full_name)
            .ok_or_else(|| CoreError::missing_fields([format!("{}fullName", field_prefix)]))?;
        Ok(Student {
            id: StudentId::new(),
            full_name,
            phone_number: present(&self.phone_number),
            grade: present(&self.grade),
            photo: present(&self.photo),
            date_of_birth: self.date_of_birth,
            address: present(&self.address),
            guardian: None,
            relation: None,
            educator,
            release: Default::default(),
            created_at: now,
            updated_at: now,
        })
    }
}

/// A child listed inline in a Guardian registration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineChild {
    #[serde(flatten)]
    pub student: NewStudent,
    pub relation: Option<String>,
    /// Educator whose roster the child joins, when known.
    pub teacher_id: Option<IdentityId>,
}

impl InlineChild {
    /// Checks every child before any account is written.
    pub fn validate_all(children: &[InlineChild]) -> CoreResult<()> {
        let missing: Vec<String> = children
            .iter()
            .enumerate()
            .filter(|(_, c)| present(&c.student.full_name).is_none())
            .map(|(i, _)| format!("children[{}].fullName", i))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(CoreError::missing_fields(missing))
        }
    }

    pub(crate) fn relation(&self) -> Option<String> {
        present(&self.relation)
    }
}

/// Result of "set guardian only if unset".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The caller now owns the student.
    Claimed(Student),
    /// The caller already owned it; relation refreshed when given.
    AlreadyOwned(Student),
    ClaimedByOther,
    Missing,
}

/// Result of "release only if still active".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseOutcome {
    Released(Student),
    AlreadyReleased,
    Missing,
}
