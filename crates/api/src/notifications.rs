//! Recipient lookup for report notifications.

use async_trait::async_trait;
use kontrol_core::types::DbId;
use kontrol_db::repositories::UserRepo;
use kontrol_db::DbPool;
use kontrol_events::{Recipient, RecipientDirectory, RecipientLookupError};

/// Sends report notifications to the organization's active admins.
pub struct OrganizationAdmins {
    pool: DbPool,
}

impl OrganizationAdmins {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecipientDirectory for OrganizationAdmins {
    async fn report_recipients(
        &self,
        organization_id: DbId,
    ) -> Result<Vec<Recipient>, RecipientLookupError> {
        let admins = UserRepo::list_active_admins(&self.pool, organization_id)
            .await
            .map_err(|e| RecipientLookupError(e.to_string()))?;
        Ok(admins
            .into_iter()
            .map(|user| Recipient {
                name: Some(user.display_name()),
                email: user.email,
            })
            .collect())
    }
}
