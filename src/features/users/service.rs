use crate::core::error::AppError;
use crate::core::query::{Filter, QueryOptions, Record};
use crate::core::store::Collection;

pub struct UserService {
    users: Collection,
}

impl UserService {
    pub fn new(users: Collection) -> Self {
        Self { users }
    }

    /// Users holding at least one role in the given government.
    pub async fn get_role_holding_users_by_government(
        &self,
        government_id: &str,
        options: QueryOptions,
    ) -> Result<Vec<Record>, AppError> {
        self.users
            .find(Filter::new().eq("roles.government", government_id), &options)
            .await
    }
}
