use std::collections::BTreeSet;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::core::error::AppError;
use crate::core::store::{Collection, ID_FIELD};

/// Shapes a lookup result.
///
/// - `lean`: return plain JSON instead of a [`Document`] bound to its collection.
/// - `select`: field projection. `name` includes, `-name` excludes. Empty keeps
///   every field.
/// - `populate`: reference fields to resolve inline. Empty resolves nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub lean: bool,
    pub select: Vec<String>,
    pub populate: Vec<String>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lean(mut self, lean: bool) -> Self {
        self.lean = lean;
        self
    }

    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn populate<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.populate.extend(fields.into_iter().map(Into::into));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Projection {
    All,
    Include { fields: Vec<String>, keep_id: bool },
    Exclude(Vec<String>),
}

impl Projection {
    pub(crate) fn parse(select: &[String]) -> Result<Self, AppError> {
        let mut include = Vec::new();
        let mut exclude = Vec::new();
        let mut keep_id = true;

        for raw in select {
            let field = raw.trim();
            if field.is_empty() {
                continue;
            }

            match field.strip_prefix('-') {
                Some(ID_FIELD) => keep_id = false,
                Some(excluded) => exclude.push(excluded.to_string()),
                None => include.push(field.to_string()),
            }
        }

        if !include.is_empty() && !exclude.is_empty() {
            return Err(AppError::bad_request(
                "select cannot mix included and excluded fields".to_string(),
            ));
        }

        if !include.is_empty() {
            return Ok(Self::Include {
                fields: include,
                keep_id,
            });
        }

        if !keep_id {
            exclude.push(ID_FIELD.to_string());
        }

        if exclude.is_empty() {
            Ok(Self::All)
        } else {
            Ok(Self::Exclude(exclude))
        }
    }

    pub(crate) fn apply(&self, mut document: Map<String, Value>) -> Map<String, Value> {
        match self {
            Self::All => document,
            Self::Include { fields, keep_id } => document
                .into_iter()
                .filter(|(key, _)| {
                    (*keep_id && key == ID_FIELD) || fields.iter().any(|field| field == key)
                })
                .collect(),
            Self::Exclude(fields) => {
                for field in fields {
                    document.remove(field);
                }
                document
            }
        }
    }
}

/// Equality predicate over dotted field paths. Every condition must hold.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((path.into(), value.into()));
        self
    }

    pub fn matches(&self, document: &Map<String, Value>) -> bool {
        self.conditions.iter().all(|(path, expected)| {
            let mut segments = path.split('.');
            let Some(root) = segments.next().and_then(|head| document.get(head)) else {
                return false;
            };

            let rest: Vec<&str> = segments.collect();
            let mut candidates = Vec::new();
            collect_path_values(root, &rest, &mut candidates);

            candidates.iter().any(|candidate| {
                *candidate == expected
                    || matches!(candidate, Value::Array(items) if items.contains(expected))
            })
        })
    }
}

// Arrays are transparent: `roles.government` visits every element of `roles`.
fn collect_path_values<'a>(value: &'a Value, path: &[&str], out: &mut Vec<&'a Value>) {
    let Some((head, rest)) = path.split_first() else {
        out.push(value);
        return;
    };

    match value {
        Value::Object(fields) => {
            if let Some(next) = fields.get(*head) {
                collect_path_values(next, rest, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_path_values(item, path, out);
            }
        }
        _ => {}
    }
}

/// A document bound to the collection it was read from. Field changes are
/// tracked and written back by [`Document::save`].
pub struct Document {
    collection: Collection,
    id: Option<String>,
    data: Map<String, Value>,
    modified: BTreeSet<String>,
}

impl Document {
    pub(crate) fn new(collection: Collection, data: Map<String, Value>) -> Self {
        let id = data
            .get(ID_FIELD)
            .and_then(Value::as_str)
            .map(str::to_string);

        Self {
            collection,
            id,
            data,
            modified: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        let field = field.into();
        self.data.insert(field.clone(), value.into());
        self.modified.insert(field);
    }

    pub fn is_modified(&self) -> bool {
        !self.modified.is_empty()
    }

    pub fn modified_fields(&self) -> impl Iterator<Item = &str> {
        self.modified.iter().map(String::as_str)
    }

    /// Merges the modified fields into the stored document. Fields that were
    /// projected away on read, or changed by another save since, are left
    /// untouched.
    pub async fn save(&mut self) -> Result<(), AppError> {
        if self.modified.is_empty() {
            return Ok(());
        }

        let id = self.id.clone().ok_or_else(|| {
            AppError::bad_request(format!(
                "cannot save a {} document read without `{ID_FIELD}`",
                self.collection.name()
            ))
        })?;

        let changes = self
            .modified
            .iter()
            .filter_map(|field| {
                self.data
                    .get(field)
                    .map(|value| (field.clone(), value.clone()))
            })
            .collect();

        self.collection.merge_fields(&id, changes).await?;
        self.modified.clear();

        Ok(())
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.data)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("collection", &self.collection.name())
            .field("data", &self.data)
            .field("modified", &self.modified)
            .finish()
    }
}

#[derive(Debug)]
pub enum Record {
    Live(Document),
    Lean(Value),
}

impl Record {
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Live(document) => document.id(),
            Self::Lean(value) => value.get(ID_FIELD).and_then(Value::as_str),
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        match self {
            Self::Live(document) => document.get(field),
            Self::Lean(value) => value.get(field),
        }
    }

    pub fn is_lean(&self) -> bool {
        matches!(self, Self::Lean(_))
    }

    pub fn into_value(self) -> Value {
        match self {
            Self::Live(document) => document.into_value(),
            Self::Lean(value) => value,
        }
    }

    pub fn decode<T>(&self) -> Result<T, AppError>
    where
        T: DeserializeOwned,
    {
        let result = match self {
            Self::Live(document) => T::deserialize(&Value::Object(document.data.clone())),
            Self::Lean(value) => T::deserialize(value),
        };

        result.map_err(|err| AppError::internal(format!("failed to decode record: {err}")))
    }
}

impl Serialize for Record {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Live(document) => document.data.serialize(serializer),
            Self::Lean(value) => value.serialize(serializer),
        }
    }
}
