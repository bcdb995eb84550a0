use async_trait::async_trait;

use rollcall_model::{Role, User, UserId};

use crate::error::Result;

/// Staff account lookup for authentication and authorization gating.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, username: &str, password_hash: &str, role: Role) -> Result<User>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>>;
    async fn count(&self) -> Result<i64>;
}
