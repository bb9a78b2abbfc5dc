//! Account operations: register, login, profile read and update.

use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::{
    normalize_email, present, EducatorRegistration, EducatorSummary, EducatorUpdate,
    GuardianRegistration, GuardianUpdate, Session,
};
use crate::guard::{Caller, TokenIssuer};
use crate::ports::{IdentityStore, PasswordHasher};
use pickup_types::{
    CoreError, CoreResult, EducatorProfile, GuardianProfile, Identity, IdentityId, Role,
    RoleProfile, TimeSource,
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

pub struct AccountService {
    store: Arc<dyn IdentityStore>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<TokenIssuer>,
    clock: Arc<dyn TimeSource>,
}

impl AccountService {
    pub fn new(
        store: Arc<dyn IdentityStore>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<TokenIssuer>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            store,
            hasher,
            tokens,
            clock,
        }
    }

    pub fn store(&self) -> &Arc<dyn IdentityStore> {
        &self.store
    }

    pub async fn register_guardian(&self, input: GuardianRegistration) -> CoreResult<Session> {
        let required = [
            ("fullName", present(&input.full_name)),
            ("email", present(&input.email)),
            ("password", present(&input.password)),
            ("phoneNumber", present(&input.phone_number)),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, v)| v.is_none())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(CoreError::missing_fields(missing));
        }
        let [(_, Some(full_name)), (_, Some(email)), (_, Some(password)), (_, Some(phone))] =
            required
        else {
            return Err(CoreError::Internal("required field check".into()));
        };

        let profile = RoleProfile::Guardian(GuardianProfile {
            children: Vec::new(),
            address: present(&input.address).map(String::from),
            emergency_contact: input.emergency_contact,
            photo: present(&input.photo).map(String::from),
        });
        self.register(full_name, email, password, phone, profile).await
    }

    pub async fn register_educator(&self, input: EducatorRegistration) -> CoreResult<Session> {
        let required = [
            ("fullName", present(&input.full_name)),
            ("email", present(&input.email)),
            ("password", present(&input.password)),
            ("phoneNumber", present(&input.phone_number)),
            ("subject", present(&input.subject)),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, v)| v.is_none())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(CoreError::missing_fields(missing));
        }
        let [(_, Some(full_name)), (_, Some(email)), (_, Some(password)), (_, Some(phone)), (_, Some(subject))] =
            required
        else {
            return Err(CoreError::Internal("required field check".into()));
        };

        let profile = RoleProfile::Educator(EducatorProfile {
            subject: subject.to_string(),
            classes: input.classes,
            students: Vec::new(),
            department: present(&input.department).map(String::from),
            employee_id: present(&input.employee_id).map(String::from),
            photo: present(&input.photo).map(String::from),
        });
        self.register(full_name, email, password, phone, profile).await
    }

    async fn register(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
        phone_number: &str,
        profile: RoleProfile,
    ) -> CoreResult<Session> {
        let email = normalize_email(email);
        let role = profile.role();

        if self.store.find_by_email(&email).await?.is_some() {
            return Err(CoreError::conflict(format!(
                "{} with this email already exists",
                role
            )));
        }

        let now = self.clock.now();
        let identity = Identity {
            id: IdentityId::new(),
            email,
            password_hash: self.hasher.hash(password)?,
            full_name: full_name.to_string(),
            phone_number: phone_number.to_string(),
            profile,
            created_at: now,
            updated_at: now,
        };
        let identity = self.store.insert(identity).await?;
        info!(identity_id = %identity.id, role = %role, "Registered identity");

        let token = self.tokens.issue(&identity)?;
        Ok(Session { identity, token })
    }

    /// Works for every role.
    pub async fn login(&self, email: Option<&str>, password: Option<&str>) -> CoreResult<Session> {
        let email = email.map(str::trim).filter(|s| !s.is_empty());
        let password = password.filter(|s| !s.is_empty());
        let (Some(email), Some(password)) = (email, password) else {
            let mut missing = Vec::new();
            if email.is_none() {
                missing.push("email");
            }
            if password.is_none() {
                missing.push("password");
            }
            return Err(CoreError::missing_fields(missing));
        };

        let identity = self
            .store
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or_else(|| CoreError::Unauthenticated(INVALID_CREDENTIALS.to_string()))?;

        if !self.hasher.verify(password, &identity.password_hash) {
            warn!(identity_id = %identity.id, "Login rejected: bad password");
            return Err(CoreError::Unauthenticated(INVALID_CREDENTIALS.to_string()));
        }

        let token = self.tokens.issue(&identity)?;
        Ok(Session { identity, token })
    }

    pub async fn me(&self, caller: &Caller) -> CoreResult<Identity> {
        self.store
            .get(caller.id)
            .await?
            .ok_or(CoreError::IdentityNotFound)
    }

    /// Profile of `caller`, which must hold `role`.
    pub async fn profile(&self, caller: &Caller, role: Role) -> CoreResult<Identity> {
        let identity = self.me(caller).await?;
        if identity.role() != role {
            return Err(CoreError::forbidden(format!(
                "Access denied. Requires {} role",
                role
            )));
        }
        Ok(identity)
    }

    pub async fn update_guardian_profile(
        &self,
        caller: &Caller,
        update: GuardianUpdate,
    ) -> CoreResult<Identity> {
        let mut identity = self.profile(caller, Role::Guardian).await?;
        apply_common(&mut identity, &update.full_name, &update.phone_number);

        if let Some(profile) = identity.as_guardian_mut() {
            if let Some(address) = present(&update.address) {
                profile.address = Some(address.to_string());
            }
            if let Some(contact) = update.emergency_contact {
                profile.emergency_contact = Some(contact);
            }
            if let Some(photo) = present(&update.photo) {
                profile.photo = Some(photo.to_string());
            }
        }

        identity.updated_at = self.clock.now();
        self.store.update(identity).await
    }

    pub async fn update_educator_profile(
        &self,
        caller: &Caller,
        update: EducatorUpdate,
    ) -> CoreResult<Identity> {
        let mut identity = self.profile(caller, Role::Educator).await?;
        apply_common(&mut identity, &update.full_name, &update.phone_number);

        if let Some(profile) = identity.as_educator_mut() {
            if let Some(subject) = present(&update.subject) {
                profile.subject = subject.to_string();
            }
            if let Some(classes) = update.classes {
                profile.classes = classes;
            }
            if let Some(department) = present(&update.department) {
                profile.department = Some(department.to_string());
            }
            if let Some(employee_id) = present(&update.employee_id) {
                profile.employee_id = Some(employee_id.to_string());
            }
            if let Some(photo) = present(&update.photo) {
                profile.photo = Some(photo.to_string());
            }
        }

        identity.updated_at = self.clock.now();
        self.store.update(identity).await
    }

    pub async fn list_educators(&self) -> CoreResult<Vec<EducatorSummary>> {
        Ok(self
            .store
            .list_by_role(Role::Educator)
            .await?
            .iter()
            .filter_map(EducatorSummary::from_identity)
            .collect())
    }
}

fn apply_common(identity: &mut Identity, full_name: &Option<String>, phone: &Option<String>) {
    if let Some(name) = present(full_name) {
        identity.full_name = name.to_string();
    }
    if let Some(phone) = present(phone) {
        identity.phone_number = phone.to_string();
    }
}
