//! `Directory` backed by the identity and student stores.
//!
//! A notification endpoint is an `(id, role)` pair; it resolves only when
//! the stored identity carries that role.

use async_trait::async_trait;
use std::sync::Arc;

use crate::ports::StudentStore;
use pickup_types::{CoreResult, Party, StudentId};
use pk_01_identity::IdentityStore;
use pk_02_notifications::{Directory, PartySummary, StudentSummary};

pub struct StoreDirectory {
    identities: Arc<dyn IdentityStore>,
    students: Arc<dyn StudentStore>,
}

impl StoreDirectory {
    pub fn new(identities: Arc<dyn IdentityStore>, students: Arc<dyn StudentStore>) -> Self {
        Self {
            identities,
            students,
        }
    }
}

#[async_trait]
impl Directory for StoreDirectory {
    async fn party(&self, party: Party) -> CoreResult<Option<PartySummary>> {
        Ok(self
            .identities
            .get(party.id)
            .await?
            .filter(|identity| identity.role() == party.role)
            .map(|identity| PartySummary {
                id: identity.id,
                role: identity.role(),
                full_name: identity.full_name,
                email: identity.email,
            }))
    }

    async fn student(&self, id: StudentId) -> CoreResult<Option<StudentSummary>> {
        Ok(self.students.get(id).await?.map(|s| StudentSummary {
            id: s.id,
            full_name: s.full_name,
        }))
    }
}
