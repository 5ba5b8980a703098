use serde_json::{Map, Value};
use tracing::warn;

use crate::field::{FieldConfig, FieldKind, FieldModel};

/// Convert a loosely-shaped schema document into an ordered field list.
///
/// Two source shapes are recognized, in precedence order: a non-empty
/// `fields` array of explicit records, else a JSON-Schema `properties` map
/// (plus `required`). When explicit records are present the `properties` map
/// is ignored entirely. Neither shape yielding anything is not an error; the
/// caller renders no fields.
pub fn normalize(schema: &Value) -> Vec<FieldModel> {
    let mut fields = match explicit_records(schema) {
        Some(records) => records,
        None => from_properties(schema),
    };
    // Stable: ties and missing orders keep their original relative position.
    fields.sort_by_key(|field| field.order);
    ensure_unique_names(&mut fields);
    fields
}

fn explicit_records(schema: &Value) -> Option<Vec<FieldModel>> {
    let records = schema.get("fields")?.as_array()?;
    if records.is_empty() {
        return None;
    }
    Some(
        records
            .iter()
            .enumerate()
            .map(|(position, record)| record_to_field(record, position))
            .collect(),
    )
}

fn record_to_field(record: &Value, position: usize) -> FieldModel {
    let label = text(record, "label");
    let id = match text_opt(record, "id") {
        Some(id) => id,
        None => {
            if label.is_empty() {
                format!("field-{position}")
            } else {
                label.clone()
            }
        }
    };
    let kind = text_opt(record, "type")
        .map(FieldKind::from)
        .unwrap_or_default();
    // null and absent order both sort as zero
    let order = record.get("order").and_then(Value::as_i64).unwrap_or(0);
    let mut config = record
        .get("config")
        .map(parse_config)
        .unwrap_or_default();
    if config.name.trim().is_empty() {
        if !label.is_empty() {
            config.name = label.clone();
        } else {
            // A record with neither a submission name nor a label is a
            // schema defect; keep it renderable under its id.
            warn!(
                target: "schema",
                id = %id,
                "field record missing config.name and label; using id"
            );
            config.name = id.clone();
        }
    }
    FieldModel {
        id,
        label,
        kind,
        order,
        config,
    }
}

fn parse_config(raw: &Value) -> FieldConfig {
    let Some(map) = raw.as_object() else {
        return FieldConfig::default();
    };
    let mut config = FieldConfig {
        name: map
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        placeholder: map
            .get("placeholder")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        required: map.get("required").and_then(Value::as_bool).unwrap_or(false),
        options: map
            .get("options")
            .and_then(Value::as_array)
            .map(|values| values.iter().map(option_text).collect())
            .unwrap_or_default(),
        rows: map
            .get("rows")
            .and_then(Value::as_u64)
            .map(|rows| rows as u32)
            .unwrap_or(4),
        extra: Map::new(),
    };
    for (key, value) in map {
        if !matches!(
            key.as_str(),
            "name" | "placeholder" | "required" | "options" | "rows"
        ) {
            config.extra.insert(key.clone(), value.clone());
        }
    }
    config
}

fn from_properties(schema: &Value) -> Vec<FieldModel> {
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Vec::new();
    };
    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|keys| keys.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    properties
        .iter()
        .enumerate()
        .map(|(position, (key, def))| property_to_field(key, def, position, &required))
        .collect()
}

fn property_to_field(key: &str, def: &Value, position: usize, required: &[&str]) -> FieldModel {
    let label = match text_opt(def, "title") {
        Some(title) => title,
        None => capitalize(key),
    };
    let kind = property_kind(def);
    let options = if kind == FieldKind::Select {
        def.get("enum")
            .and_then(Value::as_array)
            .map(|values| values.iter().map(option_text).collect())
            .unwrap_or_default()
    } else {
        Vec::new()
    };
    FieldModel {
        id: key.to_string(),
        label,
        kind,
        order: position as i64,
        config: FieldConfig {
            name: key.to_string(),
            placeholder: text(def, "description"),
            required: required.contains(&key),
            options,
            ..FieldConfig::default()
        },
    }
}

/// Kind decision table for JSON-Schema property definitions; first match wins.
fn property_kind(def: &Value) -> FieldKind {
    let ty = def.get("type").and_then(Value::as_str).unwrap_or_default();
    let format = def.get("format").and_then(Value::as_str).unwrap_or_default();
    let max_length = def.get("maxLength").and_then(Value::as_u64).unwrap_or(0);
    if ty == "string" && format == "email" {
        FieldKind::Input
    } else if ty == "string" && max_length > 100 {
        FieldKind::Textarea
    } else if ty == "boolean" {
        FieldKind::Checkbox
    } else if def.get("enum").is_some_and(Value::is_array) {
        FieldKind::Select
    } else {
        FieldKind::Input
    }
}

/// Submission keys must be unique within a list; later duplicates get a
/// positional suffix so the whole list stays submittable.
fn ensure_unique_names(fields: &mut [FieldModel]) {
    let mut seen: Vec<String> = Vec::with_capacity(fields.len());
    for (position, field) in fields.iter_mut().enumerate() {
        if seen.iter().any(|name| name == &field.config.name) {
            let renamed = format!("{}_{position}", field.config.name);
            warn!(
                target: "schema",
                original = %field.config.name,
                renamed = %renamed,
                "duplicate submission key"
            );
            field.config.name = renamed;
        }
        seen.push(field.config.name.clone());
    }
}

fn option_text(value: &Value) -> String {
    match value.as_str() {
        Some(text) => text.to_string(),
        None => value.to_string(),
    }
}

fn capitalize(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn text(value: &Value, key: &str) -> String {
    text_opt(value, key).unwrap_or_default()
}

fn text_opt(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
