//! Data maps: the records placeholders are resolved against
//!
//! A data map holds, per entity, the records loaded for it. Only the first
//! record of an entity takes part in resolution.
//!
//! Three JSON shapes are accepted by [`DataMap::from_json`]:
//!
//! ```json
//! { "Company": { "Data": [ { "value": { "ID": 7, "Name": "Acme" } } ] } }
//! { "Company": { "ID": 7, "Name": "Acme" } }
//! { "Company.ID": 7, "Company.Name": "Acme" }
//! ```
//!
//! Attribute order is kept as written.

use std::path::Path;

use dxq_shared::constants::PLACEHOLDER_SEPARATOR;
use dxq_shared::Value;
use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use crate::error::{FilterError, Result};

/// One record: attribute name to value, in source order
pub type Record = IndexMap<String, Value>;

/// Anything placeholders can be resolved against
pub trait DataSource {
    /// The record used for `entity`, if the entity has one
    fn record(&self, entity: &str) -> Option<&Record>;
}

/// Records loaded for one entity
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityData {
    records: Vec<Record>,
}

impl EntityData {
    /// Entity data from a list of records
    #[must_use]
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// The records, in load order
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// The record resolution reads from
    #[must_use]
    pub fn first(&self) -> Option<&Record> {
        self.records.first()
    }

    /// True if no records were loaded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Entity name to loaded records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataMap {
    entities: IndexMap<String, EntityData>,
}

impl DataMap {
    /// An empty data map; every placeholder stays unresolved
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the records for an entity
    pub fn insert(&mut self, entity: impl Into<String>, data: EntityData) {
        self.entities.insert(entity.into(), data);
    }

    /// Set one attribute on the first record of an entity, creating both as
    /// needed
    pub fn set(&mut self, entity: &str, attribute: impl Into<String>, value: impl Into<Value>) {
        let data = self.entities.entry(entity.to_string()).or_default();
        if data.records.is_empty() {
            data.records.push(Record::new());
        }
        if let Some(record) = data.records.first_mut() {
            record.insert(attribute.into(), value.into());
        }
    }

    /// Builder form of [`DataMap::set`]
    #[must_use]
    pub fn with(mut self, entity: &str, attribute: &str, value: impl Into<Value>) -> Self {
        self.set(entity, attribute, value);
        self
    }

    /// Records for an entity
    #[must_use]
    pub fn entity(&self, entity: &str) -> Option<&EntityData> {
        self.entities.get(entity)
    }

    /// Entity names in insertion order
    pub fn entity_names(&self) -> impl Iterator<Item = &str> {
        self.entities.keys().map(String::as_str)
    }

    /// Number of entities
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// True if no entity is present
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Build a data map from JSON in any of the accepted shapes
    pub fn from_json(json: JsonValue) -> Result<Self> {
        let JsonValue::Object(root) = json else {
            return Err(FilterError::invalid_data(
                "<root>",
                format!("expected an object, found {}", json_type(&json)),
            ));
        };

        let mut map = DataMap::new();
        for (key, entry) in root {
            if let Some((entity, attribute)) = key.split_once(PLACEHOLDER_SEPARATOR) {
                map.set(entity, attribute, Value::from_json(entry));
                continue;
            }

            let data = entity_from_json(&key, entry)?;
            map.insert(key, data);
        }

        log::debug!("loaded data map with {} entities", map.len());
        Ok(map)
    }

    /// Parse a JSON document into a data map
    pub fn from_json_str(text: &str) -> Result<Self> {
        let json: JsonValue = serde_json::from_str(text)?;
        Self::from_json(json)
    }

    /// Read a JSON file into a data map
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }
}

impl DataSource for DataMap {
    fn record(&self, entity: &str) -> Option<&Record> {
        self.entities.get(entity).and_then(EntityData::first)
    }
}

impl<S: DataSource + ?Sized> DataSource for &S {
    fn record(&self, entity: &str) -> Option<&Record> {
        (**self).record(entity)
    }
}

fn entity_from_json(entity: &str, json: JsonValue) -> Result<EntityData> {
    match json {
        JsonValue::Object(mut fields) => {
            // result objects carry siblings such as "Total" next to "Data"
            if matches!(fields.get("Data"), Some(JsonValue::Array(_) | JsonValue::Null)) {
                let rows = fields.swap_remove("Data").unwrap_or(JsonValue::Null);
                return records_from_rows(entity, rows);
            }
            let record = fields
                .into_iter()
                .map(|(name, value)| (name, Value::from_json(value)))
                .collect();
            Ok(EntityData::new(vec![record]))
        }
        JsonValue::Array(rows) => records_from_rows(entity, JsonValue::Array(rows)),
        JsonValue::Null => Ok(EntityData::default()),
        other => Err(FilterError::invalid_data(
            entity,
            format!("expected an object or a list of records, found {}", json_type(&other)),
        )),
    }
}

fn records_from_rows(entity: &str, rows: JsonValue) -> Result<EntityData> {
    let rows = match rows {
        JsonValue::Array(rows) => rows,
        JsonValue::Null => Vec::new(),
        other => {
            return Err(FilterError::invalid_data(
                entity,
                format!("'Data' must be a list, found {}", json_type(&other)),
            ))
        }
    };

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let JsonValue::Object(mut row) = row else {
            return Err(FilterError::invalid_data(entity, "every row must be an object"));
        };
        // {"key", "EntityKey", "value": {...}} rows keep their attributes under "value"
        let fields = match row.get("value") {
            Some(JsonValue::Object(_)) => match row.swap_remove("value") {
                Some(JsonValue::Object(inner)) => inner,
                _ => row,
            },
            _ => row,
        };
        records.push(
            fields
                .into_iter()
                .map(|(name, value)| (name, Value::from_json(value)))
                .collect(),
        );
    }
    Ok(EntityData::new(records))
}

fn json_type(json: &JsonValue) -> &'static str {
    match json {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
