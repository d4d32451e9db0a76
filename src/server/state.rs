use std::sync::Arc;

use crate::core::error::AppError;
use crate::core::store::Store;
use crate::features::governments::{
    GOVERNMENTS_COLLECTION, GovernmentService, MemberSource, PetitionSource,
};
use crate::features::petitions::{PETITIONS_COLLECTION, PetitionService};
use crate::features::users::{USERS_COLLECTION, UserService};

#[derive(Clone)]
pub struct AppState {
    pub governments: Arc<GovernmentService>,
}

impl AppState {
    pub fn new(governments: Arc<GovernmentService>) -> Self {
        Self { governments }
    }

    /// Wires the lookup service to store-backed petition and user collaborators.
    pub fn from_store(store: &Store) -> Result<Self, AppError> {
        let petitions: Arc<dyn PetitionSource> =
            Arc::new(PetitionService::new(store.collection(PETITIONS_COLLECTION)?));
        let members: Arc<dyn MemberSource> =
            Arc::new(UserService::new(store.collection(USERS_COLLECTION)?));

        let governments = GovernmentService::new(
            store.collection(GOVERNMENTS_COLLECTION)?,
            petitions,
            members,
        );

        Ok(Self::new(Arc::new(governments)))
    }
}
