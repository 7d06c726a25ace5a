use crate::application_port::{AuthError, UserService};
use crate::domain_model::UserId;
use crate::domain_port::{UserRecord, UserRepo};
use std::sync::Arc;

pub struct RealUserService {
    user_repo: Arc<dyn UserRepo>,
}

impl RealUserService {
    pub fn new(user_repo: Arc<dyn UserRepo>) -> RealUserService {
        RealUserService { user_repo }
    }
}

#[async_trait::async_trait]
impl UserService for RealUserService {
    async fn get_user(&self, user_id: UserId) -> Result<UserRecord, AuthError> {
        self.user_repo
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}
