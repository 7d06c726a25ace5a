use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::Utc;
use dashmap::DashMap;

/// Credentials keyed by email, mirroring the unique index on the MySQL table.
pub struct MemoryAuthRepo {
    creds: DashMap<String, AuthCredentialsRecord>,
}

impl MemoryAuthRepo {
    pub fn new() -> Self {
        MemoryAuthRepo {
            creds: DashMap::new(),
        }
    }
}

impl Default for MemoryAuthRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl AuthRepo for MemoryAuthRepo {
    async fn create_credentials_in_tx<'t>(
        &self,
        _tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
        email: &str,
        password_hash: &str,
    ) -> Result<(), AuthError> {
        if self.creds.contains_key(email) {
            return Err(AuthError::EmailTaken);
        }
        self.creds.insert(
            email.to_string(),
            AuthCredentialsRecord {
                user_id,
                email: email.to_string(),
                password_hash: password_hash.to_string(),
                is_active: true,
                created_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn get_by_email(
        &self,
        email: &str,
    ) -> Result<Option<AuthCredentialsRecord>, AuthError> {
        Ok(self.creds.get(email).map(|rec| rec.value().clone()))
    }
}
