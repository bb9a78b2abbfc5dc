//! # Core Domain Entities
//!
//! ## Clusters
//!
//! - **Identity**: `Identity` + `RoleProfile` payload selected by `Role`
//! - **Roster**: `Student` with its `ReleaseState`
//! - **Messaging**: `Notification` between two `Party` endpoints
//!
//! Wire names follow the mobile client: Guardians are `"Parent"`, Educators
//! are `"Teacher"`, and field names are camelCase.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ids::{IdentityId, NotificationId, StudentId};
use crate::time::Timestamp;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// Role tag of an identity. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "Parent")]
    Guardian,
    #[serde(rename = "Teacher")]
    Educator,
    Supervisor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Guardian => "Parent",
            Role::Educator => "Teacher",
            Role::Supervisor => "Supervisor",
        }
    }

    /// Only Guardians and Educators may send or receive notifications.
    pub fn is_notification_party(&self) -> bool {
        matches!(self, Role::Guardian | Role::Educator)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Parent" | "Guardian" | "parent" | "guardian" => Ok(Role::Guardian),
            "Teacher" | "Educator" | "teacher" | "educator" => Ok(Role::Educator),
            "Supervisor" | "supervisor" => Ok(Role::Supervisor),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// Emergency contact attached to a Guardian.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
}

/// Guardian-only fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardianProfile {
    /// Claimed students. Order carries no meaning; entries are unique.
    #[serde(default)]
    pub children: Vec<StudentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<EmergencyContact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

/// Educator-only fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducatorProfile {
    pub subject: String,
    #[serde(default)]
    pub classes: Vec<String>,
    /// Students on this educator's roster. Entries are unique.
    #[serde(default)]
    pub students: Vec<StudentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

/// Role-specific payload of an identity; the variant is the role tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role")]
pub enum RoleProfile {
    #[serde(rename = "Parent")]
    Guardian(GuardianProfile),
    #[serde(rename = "Teacher")]
    Educator(EducatorProfile),
    Supervisor,
}

impl RoleProfile {
    pub fn role(&self) -> Role {
        match self {
            RoleProfile::Guardian(_) => Role::Guardian,
            RoleProfile::Educator(_) => Role::Educator,
            RoleProfile::Supervisor => Role::Supervisor,
        }
    }
}

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: IdentityId,
    /// Unique, stored trimmed and lower-cased.
    pub email: String,
    /// Never serialized.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub full_name: String,
    pub phone_number: String,
    #[serde(flatten)]
    pub profile: RoleProfile,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Identity {
    pub fn role(&self) -> Role {
        self.profile.role()
    }

    pub fn as_guardian(&self) -> Option<&GuardianProfile> {
        match &self.profile {
            RoleProfile::Guardian(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_guardian_mut(&mut self) -> Option<&mut GuardianProfile> {
        match &mut self.profile {
            RoleProfile::Guardian(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_educator(&self) -> Option<&EducatorProfile> {
        match &self.profile {
            RoleProfile::Educator(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_educator_mut(&mut self) -> Option<&mut EducatorProfile> {
        match &mut self.profile {
            RoleProfile::Educator(e) => Some(e),
            _ => None,
        }
    }

    /// Guardian children or Educator students; empty for other roles.
    pub fn roster(&self) -> &[StudentId] {
        match &self.profile {
            RoleProfile::Guardian(g) => &g.children,
            RoleProfile::Educator(e) => &e.students,
            RoleProfile::Supervisor => &[],
        }
    }

    pub fn roster_contains(&self, student: StudentId) -> bool {
        self.roster().contains(&student)
    }

    /// Append to the roster set. Returns `false` when already present or
    /// when the role has no roster.
    pub fn add_to_roster(&mut self, student: StudentId) -> bool {
        let set = match &mut self.profile {
            RoleProfile::Guardian(g) => &mut g.children,
            RoleProfile::Educator(e) => &mut e.students,
            RoleProfile::Supervisor => return false,
        };
        if set.contains(&student) {
            return false;
        }
        set.push(student);
        true
    }

    /// Replace the roster set wholesale. No-op for roles without one.
    pub fn set_roster(&mut self, students: Vec<StudentId>) {
        match &mut self.profile {
            RoleProfile::Guardian(g) => g.children = students,
            RoleProfile::Educator(e) => e.students = students,
            RoleProfile::Supervisor => {}
        }
    }

    pub fn party(&self) -> Party {
        Party {
            id: self.id,
            role: self.role(),
        }
    }
}

// =============================================================================
// CLUSTER B: ROSTER
// =============================================================================

/// Release lifecycle of a student. `Released` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "ReleaseRecord", into = "ReleaseRecord")]
pub enum ReleaseState {
    #[default]
    Active,
    Released { at: Timestamp, by: IdentityId },
}

impl ReleaseState {
    pub fn is_released(&self) -> bool {
        matches!(self, ReleaseState::Released { .. })
    }
}

/// Flat wire form: `isReleased`, `releasedAt`, `releasedBy`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReleaseRecord {
    #[serde(default)]
    is_released: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    released_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    released_by: Option<IdentityId>,
}

impl From<ReleaseRecord> for ReleaseState {
    fn from(r: ReleaseRecord) -> Self {
        match (r.is_released, r.released_at, r.released_by) {
            (true, Some(at), Some(by)) => ReleaseState::Released { at, by },
            _ => ReleaseState::Active,
        }
    }
}

impl From<ReleaseState> for ReleaseRecord {
    fn from(s: ReleaseState) -> Self {
        match s {
            ReleaseState::Active => ReleaseRecord::default(),
            ReleaseState::Released { at, by } => ReleaseRecord {
                is_released: true,
                released_at: Some(at),
                released_by: Some(by),
            },
        }
    }
}

/// A student who is dropped off and picked up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: StudentId,
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Claiming Guardian; `None` while unclaimed.
    #[serde(rename = "parent", default, skip_serializing_if = "Option::is_none")]
    pub guardian: Option<IdentityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
    /// Controlling Educator.
    #[serde(rename = "primaryTeacher", default, skip_serializing_if = "Option::is_none")]
    pub educator: Option<IdentityId>,
    #[serde(flatten)]
    pub release: ReleaseState,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Student {
    pub fn is_claimed(&self) -> bool {
        self.guardian.is_some()
    }

    pub fn is_released(&self) -> bool {
        self.release.is_released()
    }
}

// =============================================================================
// CLUSTER C: MESSAGING
// =============================================================================

/// One endpoint of a notification: an identity plus the role it resolves as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Party {
    pub id: IdentityId,
    pub role: Role,
}

impl Party {
    pub fn new(id: IdentityId, role: Role) -> Self {
        Self { id, role }
    }

    pub fn guardian(id: IdentityId) -> Self {
        Self::new(id, Role::Guardian)
    }

    pub fn educator(id: IdentityId) -> Self {
        Self::new(id, Role::Educator)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Message,
    Announcement,
    Alert,
    Reminder,
    #[default]
    General,
    SchoolReached,
    StudentReleased,
}

impl FromStr for NotificationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(s.to_string()))
            .map_err(|_| format!("unknown notification type: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

/// A directed message in the ledger.
///
/// Sender, recipient, title, message and type never change after creation;
/// only `is_read` / `read_at` move, and always together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub sender: IdentityId,
    #[serde(rename = "senderModel")]
    pub sender_role: Role,
    pub recipient: IdentityId,
    #[serde(rename = "recipientModel")]
    pub recipient_role: Role,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub priority: Priority,
    pub is_read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_student: Option<StudentId>,
    pub created_at: Timestamp,
}

impl Notification {
    pub fn sender_party(&self) -> Party {
        Party::new(self.sender, self.sender_role)
    }

    pub fn recipient_party(&self) -> Party {
        Party::new(self.recipient, self.recipient_role)
    }

    pub fn is_recipient(&self, id: IdentityId) -> bool {
        self.recipient == id
    }

    /// True when `id` is the sender or the recipient.
    pub fn involves(&self, id: IdentityId) -> bool {
        self.sender == id || self.recipient == id
    }

    /// Set the read flag. Keeps the first `read_at`; returns whether the
    /// flag changed.
    pub fn mark_read(&mut self, at: Timestamp) -> bool {
        if self.is_read {
            return false;
        }
        self.is_read = true;
        self.read_at = Some(at);
        true
    }
}
