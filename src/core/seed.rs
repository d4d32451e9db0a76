use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tokio::fs;
use tracing::{info, warn};

use crate::core::error::AppError;
use crate::core::store::{ID_FIELD, Store};
use crate::features::governments::{GOVERNMENTS_COLLECTION, GovernmentDto};
use crate::features::petitions::PETITIONS_COLLECTION;
use crate::features::users::USERS_COLLECTION;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedFile {
    #[serde(default)]
    pub governments: Vec<Value>,
    #[serde(default)]
    pub petitions: Vec<Value>,
    #[serde(default)]
    pub users: Vec<Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub governments: usize,
    pub petitions: usize,
    pub users: usize,
}

pub async fn load_seed(store: &Store, path: impl AsRef<Path>) -> Result<SeedSummary, AppError> {
    let path = path.as_ref();
    let raw = fs::read(path).await.map_err(|err| {
        AppError::configuration(format!("failed to read seed file {}: {err}", path.display()))
    })?;
    let seed: SeedFile = serde_json::from_slice(&raw).map_err(|err| {
        AppError::configuration(format!("invalid seed file {}: {err}", path.display()))
    })?;

    let summary = apply_seed(store, seed).await?;
    info!(
        target: "seed",
        path = %path.display(),
        governments = summary.governments,
        petitions = summary.petitions,
        users = summary.users,
        "seed data loaded"
    );

    Ok(summary)
}

pub async fn apply_seed(store: &Store, seed: SeedFile) -> Result<SeedSummary, AppError> {
    let mut current = Vec::new();
    for government in &seed.governments {
        let parsed = GovernmentDto::deserialize(government)
            .map_err(|err| AppError::bad_request(format!("invalid government in seed: {err}")))?;
        if parsed.current {
            current.push(parsed.uid);
        }
    }
    ensure_documents(GOVERNMENTS_COLLECTION, &seed.governments)?;
    ensure_documents(PETITIONS_COLLECTION, &seed.petitions)?;
    ensure_documents(USERS_COLLECTION, &seed.users)?;

    if current.len() > 1 {
        warn!(target: "seed", uids = ?current, "more than one government is marked current");
    }

    let summary = SeedSummary {
        governments: insert_all(store, GOVERNMENTS_COLLECTION, seed.governments).await?,
        petitions: insert_all(store, PETITIONS_COLLECTION, seed.petitions).await?,
        users: insert_all(store, USERS_COLLECTION, seed.users).await?,
    };

    Ok(summary)
}

// Checked before any write so a bad entry leaves the store untouched.
fn ensure_documents(collection: &str, documents: &[Value]) -> Result<(), AppError> {
    for (index, document) in documents.iter().enumerate() {
        let Value::Object(fields) = document else {
            return Err(AppError::bad_request(format!(
                "{collection} seed entry {index} must be a JSON object"
            )));
        };

        match fields.get(ID_FIELD) {
            None | Some(Value::Null) | Some(Value::String(_)) => {}
            Some(_) => {
                return Err(AppError::bad_request(format!(
                    "{collection} seed entry {index} has a non-string `{ID_FIELD}`"
                )));
            }
        }
    }

    Ok(())
}

async fn insert_all(
    store: &Store,
    collection: &str,
    documents: Vec<Value>,
) -> Result<usize, AppError> {
    let collection = store.collection(collection)?;
    let count = documents.len();
    for document in documents {
        collection.insert(document).await?;
    }
    Ok(count)
}
