//! Export output mapping
//!
//! Parses the JSON array produced by an `export` invocation into typed
//! [`TaskRecord`]s. Deserialization is an explicit two-pass split: each
//! row is read into a generic key/value map first, then the keys matching
//! the built-in schema (with the `id` → index alias) are type-converted
//! and every remaining key is moved verbatim into the record's UDA map.
//! Unknown keys are never dropped and never cause a parse failure; this is
//! how custom attributes surface without a compile-time schema change.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tasklink_core::{Annotation, Error, Priority, Recurrence, Result, Status, TaskRecord};
use uuid::Uuid;

use crate::dates::decode_datetime;

/// Built-in schema field names; `id` is the wire alias for `index`
const KNOWN_FIELDS: &[&str] = &[
    "description",
    "id",
    "uuid",
    "status",
    "priority",
    "due",
    "entry",
    "start",
    "end",
    "modified",
    "tags",
    "project",
    "depends",
    "parent",
    "recur",
    "scheduled",
    "wait",
    "until",
    "urgency",
    "annotations",
    "imask",
    "rtype",
];

/// Parse the stdout of an `export` invocation
///
/// An empty array yields an empty list; malformed JSON is a
/// [`Error::Parse`], distinct from "no results".
pub fn parse_export(raw: &str) -> Result<Vec<TaskRecord>> {
    let rows: Vec<Map<String, Value>> = serde_json::from_str(raw)
        .map_err(|e| Error::Parse(format!("Invalid export JSON: {}", e)))?;
    rows.into_iter().map(parse_record).collect()
}

fn take_str(map: &Map<String, Value>, key: &str) -> Result<Option<String>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(Error::Parse(format!(
            "Field '{}' is not a string: {}",
            key, other
        ))),
    }
}

fn take_date(map: &Map<String, Value>, key: &str) -> Result<Option<chrono::DateTime<chrono::Utc>>> {
    match take_str(map, key)? {
        Some(raw) => Ok(Some(decode_datetime(&raw)?)),
        None => Ok(None),
    }
}

fn take_uuid(map: &Map<String, Value>, key: &str) -> Result<Option<Uuid>> {
    match take_str(map, key)? {
        Some(raw) => Uuid::parse_str(&raw)
            .map(Some)
            .map_err(|e| Error::Parse(format!("Field '{}' is not a uuid: {}", key, e))),
        None => Ok(None),
    }
}

/// Dependencies appear as a JSON array of uuid strings (v3 export) or a
/// single comma-joined string (v2 export); both forms are accepted.
fn take_depends(map: &Map<String, Value>) -> Result<Vec<Uuid>> {
    let parse_one = |raw: &str| {
        Uuid::parse_str(raw.trim())
            .map_err(|e| Error::Parse(format!("Dependency '{}' is not a uuid: {}", raw, e)))
    };
    match map.get("depends") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(joined)) => joined
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(parse_one)
            .collect(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => parse_one(s),
                other => Err(Error::Parse(format!(
                    "Dependency entry is not a string: {}",
                    other
                ))),
            })
            .collect(),
        Some(other) => Err(Error::Parse(format!(
            "Field 'depends' has unexpected shape: {}",
            other
        ))),
    }
}

fn take_tags(map: &Map<String, Value>) -> Result<Vec<String>> {
    match map.get("tags") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(Error::Parse(format!("Tag is not a string: {}", other))),
            })
            .collect(),
        Some(other) => Err(Error::Parse(format!(
            "Field 'tags' has unexpected shape: {}",
            other
        ))),
    }
}

fn take_annotations(map: &Map<String, Value>) -> Result<Vec<Annotation>> {
    match map.get("annotations") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                let obj = item.as_object().ok_or_else(|| {
                    Error::Parse(format!("Annotation is not an object: {}", item))
                })?;
                let entry = take_str(obj, "entry")?.ok_or_else(|| {
                    Error::Parse("Annotation missing entry timestamp".to_string())
                })?;
                let description = take_str(obj, "description")?.ok_or_else(|| {
                    Error::Parse("Annotation missing description".to_string())
                })?;
                Ok(Annotation {
                    entry: decode_datetime(&entry)?,
                    description,
                })
            })
            .collect(),
        Some(other) => Err(Error::Parse(format!(
            "Field 'annotations' has unexpected shape: {}",
            other
        ))),
    }
}

fn parse_record(map: Map<String, Value>) -> Result<TaskRecord> {
    let description = take_str(&map, "description")?
        .ok_or_else(|| Error::Parse("Export row missing description".to_string()))?;

    let index = map
        .get("id")
        .and_then(Value::as_u64)
        .ok_or_else(|| Error::Parse("Export row missing numeric id".to_string()))?;

    let uuid = take_uuid(&map, "uuid")?
        .ok_or_else(|| Error::Parse("Export row missing uuid".to_string()))?;

    let status = take_str(&map, "status")?
        .ok_or_else(|| Error::Parse("Export row missing status".to_string()))?
        .parse::<Status>()
        .map_err(Error::Parse)?;

    let priority = match take_str(&map, "priority")? {
        Some(raw) => Some(raw.parse::<Priority>().map_err(Error::Parse)?),
        None => None,
    };

    let recur = match take_str(&map, "recur")? {
        Some(raw) => Some(raw.parse::<Recurrence>().map_err(Error::Parse)?),
        None => None,
    };

    // Second pass: anything outside the built-in schema becomes a UDA
    // value, carried verbatim. Keys with an underscore prefix are engine
    // internals and are skipped.
    let mut udas: BTreeMap<String, Value> = BTreeMap::new();
    for (key, value) in &map {
        if !KNOWN_FIELDS.contains(&key.as_str()) && !key.starts_with('_') {
            udas.insert(key.clone(), value.clone());
        }
    }

    Ok(TaskRecord {
        description,
        index,
        uuid,
        status,
        priority,
        due: take_date(&map, "due")?,
        entry: take_date(&map, "entry")?,
        start: take_date(&map, "start")?,
        end: take_date(&map, "end")?,
        modified: take_date(&map, "modified")?,
        tags: take_tags(&map)?,
        project: take_str(&map, "project")?,
        depends: take_depends(&map)?,
        parent: take_uuid(&map, "parent")?,
        recur,
        scheduled: take_date(&map, "scheduled")?,
        wait: take_date(&map, "wait")?,
        until: take_date(&map, "until")?,
        urgency: map.get("urgency").and_then(Value::as_f64),
        annotations: take_annotations(&map)?,
        udas,
        imask: map.get("imask").cloned(),
        rtype: take_str(&map, "rtype")?,
    })
}
