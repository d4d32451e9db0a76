use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use sled::{Db, Tree};
use tokio::task;
use tracing::debug;

use crate::core::error::AppError;
use crate::core::query::{Document, Filter, Projection, QueryOptions, Record};

pub const ID_FIELD: &str = "_id";

/// Embedded document store. Each collection is a sled tree of JSON objects
/// keyed by `_id`.
#[derive(Clone)]
pub struct Store {
    db: Db,
    references: Arc<HashMap<String, HashMap<String, String>>>,
}

impl Store {
    pub fn new(db: Db) -> Self {
        Self {
            db,
            references: Arc::new(HashMap::new()),
        }
    }

    /// Declares `field` of `collection` as holding `_id`s of `target` documents,
    /// which makes it resolvable through [`QueryOptions::populate`].
    pub fn with_reference(mut self, collection: &str, field: &str, target: &str) -> Self {
        Arc::make_mut(&mut self.references)
            .entry(collection.to_string())
            .or_default()
            .insert(field.to_string(), target.to_string());
        self
    }

    pub fn collection(&self, name: &str) -> Result<Collection, AppError> {
        let tree = self
            .db
            .open_tree(name)
            .map_err(|err| AppError::internal(format!("failed to open {name} collection: {err}")))?;

        Ok(Collection {
            name: Arc::from(name),
            tree,
            store: self.clone(),
        })
    }

    fn reference(&self, collection: &str, field: &str) -> Option<&str> {
        self.references
            .get(collection)
            .and_then(|fields| fields.get(field))
            .map(String::as_str)
    }

    fn generate_id(&self) -> Result<String, AppError> {
        let id = self
            .db
            .generate_id()
            .map_err(|err| AppError::internal(format!("failed to generate document id: {err}")))?;
        Ok(format!("{id:024x}"))
    }
}

#[derive(Clone)]
pub struct Collection {
    name: Arc<str>,
    tree: Tree,
    store: Store,
}

impl Collection {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Writes a document, assigning `_id` when it has none. A document with the
    /// same `_id` is replaced.
    pub async fn insert(&self, document: Value) -> Result<String, AppError> {
        let Value::Object(mut fields) = document else {
            return Err(AppError::bad_request(format!(
                "{} documents must be JSON objects",
                self.name
            )));
        };

        let id = match fields.get(ID_FIELD).cloned() {
            Some(Value::String(id)) if !id.is_empty() => id,
            None | Some(Value::Null) | Some(Value::String(_)) => {
                let id = self.store.generate_id()?;
                fields.insert(ID_FIELD.to_string(), Value::String(id.clone()));
                id
            }
            Some(_) => {
                return Err(AppError::bad_request(format!(
                    "`{ID_FIELD}` of {} documents must be a string",
                    self.name
                )));
            }
        };

        let data = serde_json::to_vec(&fields)
            .map_err(|err| AppError::internal(format!("failed to encode document: {err}")))?;

        let tree = self.tree.clone();
        let key_bytes = id.clone().into_bytes();
        task::spawn_blocking(move || -> Result<(), AppError> {
            tree.insert(key_bytes, data)
                .map_err(|err| AppError::internal(format!("failed to write document: {err}")))?;
            Ok(())
        })
        .await
        .map_err(|err| AppError::internal(format!("store task join error: {err}")))??;

        self.tree
            .flush_async()
            .await
            .map_err(|err| AppError::internal(format!("failed to flush {}: {err}", self.name)))?;

        Ok(id)
    }

    pub async fn find_one(
        &self,
        filter: Filter,
        options: &QueryOptions,
    ) -> Result<Option<Record>, AppError> {
        let projection = Projection::parse(&options.select)?;
        let references = self.resolve_references(&options.populate)?;
        let mut found = self.scan(filter, Some(1)).await?;

        match found.pop() {
            Some(document) => {
                let record = self
                    .shape(document, &projection, &references, options.lean)
                    .await?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    pub async fn find(
        &self,
        filter: Filter,
        options: &QueryOptions,
    ) -> Result<Vec<Record>, AppError> {
        let projection = Projection::parse(&options.select)?;
        let references = self.resolve_references(&options.populate)?;
        let documents = self.scan(filter, None).await?;

        let mut records = Vec::with_capacity(documents.len());
        for document in documents {
            records.push(
                self.shape(document, &projection, &references, options.lean)
                    .await?,
            );
        }

        Ok(records)
    }

    /// Writes `fields` over the stored document with `_id == id` in one atomic
    /// step. Other stored fields are kept.
    pub(crate) async fn merge_fields(
        &self,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), AppError> {
        let tree = self.tree.clone();
        let name = self.name.clone();
        let id = id.to_string();

        task::spawn_blocking(move || -> Result<(), AppError> {
            let mut decode_error = None;
            let updated = tree
                .update_and_fetch(id.as_bytes(), |existing| {
                    decode_error = None;
                    let bytes = existing?;
                    let mut stored: Map<String, Value> = match serde_json::from_slice(bytes) {
                        Ok(stored) => stored,
                        Err(err) => {
                            decode_error = Some(err.to_string());
                            return Some(bytes.to_vec());
                        }
                    };
                    for (field, value) in &fields {
                        stored.insert(field.clone(), value.clone());
                    }
                    match serde_json::to_vec(&stored) {
                        Ok(encoded) => Some(encoded),
                        Err(err) => {
                            decode_error = Some(err.to_string());
                            Some(bytes.to_vec())
                        }
                    }
                })
                .map_err(|err| AppError::internal(format!("failed to update document: {err}")))?;

            if let Some(err) = decode_error {
                return Err(AppError::internal(format!(
                    "failed to merge stored {name} document {id}: {err}"
                )));
            }
            if updated.is_none() {
                return Err(AppError::not_found(format!(
                    "document {id} no longer exists in {name}"
                )));
            }
            Ok(())
        })
        .await
        .map_err(|err| AppError::internal(format!("store task join error: {err}")))??;

        self.tree
            .flush_async()
            .await
            .map_err(|err| AppError::internal(format!("failed to flush {}: {err}", self.name)))?;

        Ok(())
    }

    pub(crate) async fn get_raw(&self, id: &str) -> Result<Option<Map<String, Value>>, AppError> {
        let tree = self.tree.clone();
        let key_bytes = id.as_bytes().to_vec();

        task::spawn_blocking(move || -> Result<Option<Map<String, Value>>, AppError> {
            let maybe_bytes = tree
                .get(&key_bytes)
                .map_err(|err| AppError::internal(format!("document lookup failed: {err}")))?;

            maybe_bytes
                .map(|bytes| {
                    serde_json::from_slice(&bytes).map_err(|err| {
                        AppError::internal(format!("failed to decode stored document: {err}"))
                    })
                })
                .transpose()
        })
        .await
        .map_err(|err| AppError::internal(format!("store task join error: {err}")))?
    }

    async fn scan(
        &self,
        filter: Filter,
        limit: Option<usize>,
    ) -> Result<Vec<Map<String, Value>>, AppError> {
        let tree = self.tree.clone();
        let name = self.name.clone();

        let matches = task::spawn_blocking(move || -> Result<Vec<Map<String, Value>>, AppError> {
            let mut matches = Vec::new();
            for entry in tree.iter() {
                let (_, bytes) = entry
                    .map_err(|err| AppError::internal(format!("failed to scan {name}: {err}")))?;
                let document: Map<String, Value> = serde_json::from_slice(&bytes).map_err(|err| {
                    AppError::internal(format!("failed to decode stored {name} document: {err}"))
                })?;

                if filter.matches(&document) {
                    matches.push(document);
                    if limit.is_some_and(|limit| matches.len() >= limit) {
                        break;
                    }
                }
            }
            Ok(matches)
        })
        .await
        .map_err(|err| AppError::internal(format!("store task join error: {err}")))??;

        debug!(target: "store", collection = %self.name, matched = matches.len(), "scan complete");
        Ok(matches)
    }

    fn resolve_references(&self, paths: &[String]) -> Result<Vec<(String, Collection)>, AppError> {
        paths
            .iter()
            .map(|path| {
                let target = self.store.reference(&self.name, path).ok_or_else(|| {
                    AppError::bad_request(format!(
                        "cannot populate `{path}` on {}: not a reference field",
                        self.name
                    ))
                })?;
                Ok((path.clone(), self.store.collection(target)?))
            })
            .collect()
    }

    async fn shape(
        &self,
        document: Map<String, Value>,
        projection: &Projection,
        references: &[(String, Collection)],
        lean: bool,
    ) -> Result<Record, AppError> {
        let mut fields = projection.apply(document);
        populate(&mut fields, references).await?;

        if lean {
            Ok(Record::Lean(Value::Object(fields)))
        } else {
            Ok(Record::Live(Document::new(self.clone(), fields)))
        }
    }
}

async fn populate(
    fields: &mut Map<String, Value>,
    references: &[(String, Collection)],
) -> Result<(), AppError> {
    for (path, target) in references {
        // Projected away.
        let Some(value) = fields.get_mut(path) else {
            continue;
        };

        *value = match value.take() {
            Value::String(id) => target
                .get_raw(&id)
                .await?
                .map(Value::Object)
                .unwrap_or(Value::Null),
            Value::Array(ids) => {
                let mut resolved = Vec::with_capacity(ids.len());
                for id in ids {
                    if let Value::String(id) = id {
                        if let Some(document) = target.get_raw(&id).await? {
                            resolved.push(Value::Object(document));
                        }
                    }
                }
                Value::Array(resolved)
            }
            other => other,
        };
    }

    Ok(())
}
