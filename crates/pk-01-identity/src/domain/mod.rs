//! Account inputs and views.
//!
//! Registration and update payloads arrive from the HTTP layer already
//! deserialized; every field is optional at this level so the service can
//! report all missing fields at once.

use serde::{Deserialize, Serialize};

use pickup_types::{EmergencyContact, Identity, IdentityId, Role};

/// Treat `None` and blank strings alike.
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Canonical stored form of an email address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardianRegistration {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub emergency_contact: Option<EmergencyContact>,
    pub photo: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducatorRegistration {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone_number: Option<String>,
    pub subject: Option<String>,
    #[serde(default)]
    pub classes: Vec<String>,
    pub department: Option<String>,
    pub employee_id: Option<String>,
    pub photo: Option<String>,
}

/// Partial Guardian profile update. Blank fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardianUpdate {
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub emergency_contact: Option<EmergencyContact>,
    pub photo: Option<String>,
}

/// Partial Educator profile update. Blank fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducatorUpdate {
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub subject: Option<String>,
    pub classes: Option<Vec<String>>,
    pub department: Option<String>,
    pub employee_id: Option<String>,
    pub photo: Option<String>,
}

/// Public directory entry for an Educator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EducatorSummary {
    pub id: IdentityId,
    pub full_name: String,
    pub subject: String,
    pub classes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

impl EducatorSummary {
    /// `None` unless `identity` is an Educator.
    pub fn from_identity(identity: &Identity) -> Option<Self> {
        let profile = identity.as_educator()?;
        Some(Self {
            id: identity.id,
            full_name: identity.full_name.clone(),
            subject: profile.subject.clone(),
            classes: profile.classes.clone(),
            department: profile.department.clone(),
        })
    }
}

/// Profile plus a freshly issued bearer token.
#[derive(Debug, Clone)]
pub struct Session {
    pub identity: Identity,
    pub token: String,
}

impl Session {
    pub fn role(&self) -> Role {
        self.identity.role()
    }
}
