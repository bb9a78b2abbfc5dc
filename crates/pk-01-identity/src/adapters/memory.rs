//! In-memory identity store.
//!
//! Backs development nodes and tests. Email and employee-id uniqueness are
//! enforced under the same write lock as the insert.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

use crate::ports::IdentityStore;
use pickup_types::{CoreError, CoreResult, Identity, IdentityId, Role, StudentId};

#[derive(Default)]
struct Tables {
    by_id: HashMap<IdentityId, Identity>,
    by_email: HashMap<String, IdentityId>,
}

impl Tables {
    fn employee_id_taken(&self, employee_id: &str, except: IdentityId) -> bool {
        self.by_id.values().any(|other| {
            other.id != except
                && other
                    .as_educator()
                    .and_then(|e| e.employee_id.as_deref())
                    .map(|eid| eid == employee_id)
                    .unwrap_or(false)
        })
    }
}

/// Identity store held in process memory.
#[derive(Default)]
pub struct InMemoryIdentityStore {
    tables: RwLock<Tables>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tables.read().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn insert(&self, identity: Identity) -> CoreResult<Identity> {
        let mut tables = self.tables.write();

        if tables.by_email.contains_key(&identity.email) {
            return Err(CoreError::conflict(format!(
                "{} with this email already exists",
                identity.role()
            )));
        }
        if let Some(eid) = identity.as_educator().and_then(|e| e.employee_id.as_deref()) {
            if tables.employee_id_taken(eid, identity.id) {
                return Err(CoreError::conflict("employeeId already in use"));
            }
        }

        tables.by_email.insert(identity.email.clone(), identity.id);
        tables.by_id.insert(identity.id, identity.clone());
        debug!(identity_id = %identity.id, role = %identity.role(), "Stored identity");
        Ok(identity)
    }

    async fn get(&self, id: IdentityId) -> CoreResult<Option<Identity>> {
        Ok(self.tables.read().by_id.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> CoreResult<Option<Identity>> {
        let tables = self.tables.read();
        Ok(tables
            .by_email
            .get(email)
            .and_then(|id| tables.by_id.get(id))
            .cloned())
    }

    async fn update(&self, mut identity: Identity) -> CoreResult<Identity> {
        let mut tables = self.tables.write();

        let stored = tables
            .by_id
            .get(&identity.id)
            .ok_or_else(|| CoreError::not_found(format!("{} not found", identity.role())))?;
        if stored.role() != identity.role() {
            return Err(CoreError::conflict("role cannot change after creation"));
        }

        // Roster sets change only through add_to_roster.
        identity.set_roster(stored.roster().to_vec());
        identity.email = stored.email.clone();
        identity.password_hash = stored.password_hash.clone();
        identity.created_at = stored.created_at;

        if let Some(eid) = identity.as_educator().and_then(|e| e.employee_id.as_deref()) {
            if tables.employee_id_taken(eid, identity.id) {
                return Err(CoreError::conflict("employeeId already in use"));
            }
        }

        tables.by_id.insert(identity.id, identity.clone());
        Ok(identity)
    }

    async fn add_to_roster(&self, id: IdentityId, student: StudentId) -> CoreResult<bool> {
        let mut tables = self.tables.write();
        let identity = tables
            .by_id
            .get_mut(&id)
            .ok_or_else(|| CoreError::not_found("identity not found"))?;

        if identity.role() == Role::Supervisor {
            return Err(CoreError::forbidden("supervisors have no roster"));
        }
        Ok(identity.add_to_roster(student))
    }

    async fn list_by_role(&self, role: Role) -> CoreResult<Vec<Identity>> {
        let mut out: Vec<Identity> = self
            .tables
            .read()
            .by_id
            .values()
            .filter(|i| i.role() == role)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.full_name.cmp(&b.full_name).then(a.id.cmp(&b.id)));
        Ok(out)
    }
}
