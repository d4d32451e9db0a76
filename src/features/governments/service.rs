use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::core::error::AppError;
use crate::core::query::{Filter, QueryOptions, Record};
use crate::core::store::{Collection, ID_FIELD};
use crate::features::petitions::PetitionService;
use crate::features::users::UserService;

const UID_NOT_FOUND: &str = "Government could not be found by that UID.";
const NO_CURRENT_GOVERNMENT: &str = "No currently operating government.";

#[async_trait]
pub trait PetitionSource: Send + Sync {
    async fn petitions_by_government(
        &self,
        government_id: &str,
        options: QueryOptions,
    ) -> Result<Vec<Record>, AppError>;
}

#[async_trait]
pub trait MemberSource: Send + Sync {
    async fn role_holding_users_by_government(
        &self,
        government_id: &str,
        options: QueryOptions,
    ) -> Result<Vec<Record>, AppError>;
}

#[async_trait]
impl PetitionSource for PetitionService {
    async fn petitions_by_government(
        &self,
        government_id: &str,
        options: QueryOptions,
    ) -> Result<Vec<Record>, AppError> {
        PetitionService::get_petitions_by_government(self, government_id, options).await
    }
}

#[async_trait]
impl MemberSource for UserService {
    async fn role_holding_users_by_government(
        &self,
        government_id: &str,
        options: QueryOptions,
    ) -> Result<Vec<Record>, AppError> {
        UserService::get_role_holding_users_by_government(self, government_id, options).await
    }
}

pub struct GovernmentService {
    governments: Collection,
    petitions: Arc<dyn PetitionSource>,
    members: Arc<dyn MemberSource>,
}

impl GovernmentService {
    pub fn new(
        governments: Collection,
        petitions: Arc<dyn PetitionSource>,
        members: Arc<dyn MemberSource>,
    ) -> Self {
        Self {
            governments,
            petitions,
            members,
        }
    }

    /// Looks a government up by `uid`. An absent or empty `uid` means the
    /// currently operating government.
    pub async fn get_government_by_uid(
        &self,
        uid: Option<&str>,
        options: QueryOptions,
    ) -> Result<Record, AppError> {
        match uid.filter(|uid| !uid.is_empty()) {
            Some(uid) => {
                debug!(target: "governments", uid, "looking up government by uid");
                self.governments
                    .find_one(Filter::new().eq("uid", uid), &options)
                    .await?
                    .ok_or_else(|| AppError::not_found(UID_NOT_FOUND.to_string()))
            }
            None => self
                .get_current_government(options)
                .await?
                .ok_or_else(|| AppError::not_found(NO_CURRENT_GOVERNMENT.to_string())),
        }
    }

    /// Returns `None` when no government is marked current; only
    /// [`Self::get_government_by_uid`] turns that into a not-found error.
    pub async fn get_current_government(
        &self,
        options: QueryOptions,
    ) -> Result<Option<Record>, AppError> {
        debug!(target: "governments", "looking up current government");
        self.governments
            .find_one(Filter::new().eq("current", true), &options)
            .await
    }

    pub async fn get_petitions_by_government_uid(
        &self,
        uid: Option<&str>,
        options: QueryOptions,
    ) -> Result<Vec<Record>, AppError> {
        let government_id = self.resolve_government_id(uid).await?;
        self.petitions
            .petitions_by_government(&government_id, options)
            .await
    }

    pub async fn get_members_by_government_uid(
        &self,
        uid: Option<&str>,
        options: QueryOptions,
    ) -> Result<Vec<Record>, AppError> {
        let government_id = self.resolve_government_id(uid).await?;
        self.members
            .role_holding_users_by_government(&government_id, options)
            .await
    }

    async fn resolve_government_id(&self, uid: Option<&str>) -> Result<String, AppError> {
        let government = self
            .get_government_by_uid(uid, QueryOptions::new().lean(true).select([ID_FIELD]))
            .await?;

        government.id().map(str::to_string).ok_or_else(|| {
            AppError::internal(format!("government record is missing `{ID_FIELD}`"))
        })
    }
}
