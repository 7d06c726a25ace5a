use crate::application_port::AuthError;
use crate::domain_model::UserId;
use crate::domain_port::UserRecord;

#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    async fn get_user(&self, user_id: UserId) -> Result<UserRecord, AuthError>;
}
