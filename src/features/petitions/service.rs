use crate::core::error::AppError;
use crate::core::query::{Filter, QueryOptions, Record};
use crate::core::store::Collection;

pub struct PetitionService {
    petitions: Collection,
}

impl PetitionService {
    pub fn new(petitions: Collection) -> Self {
        Self { petitions }
    }

    /// Petitions whose `government` field holds `government_id`.
    pub async fn get_petitions_by_government(
        &self,
        government_id: &str,
        options: QueryOptions,
    ) -> Result<Vec<Record>, AppError> {
        self.petitions
            .find(Filter::new().eq("government", government_id), &options)
            .await
    }
}
