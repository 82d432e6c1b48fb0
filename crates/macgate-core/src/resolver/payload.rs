// ── Payload construction ──
//
// Builds the request body for a strategy from the freshest list state.
// Existing entries are re-sent exactly as read so unknown per-entry fields
// survive a replace.

use serde_json::{Map, Value};

use super::strategy::{HostFieldSet, PayloadShape};
use crate::model::{HostListEntry, MacStyle, StaticHostList};

/// List fields carried along with a native-entries update.
pub const PRESERVED_FIELDS: &[&str] = &["name", "description", "host_format", "host_type", "value"];

/// File name used for CSV imports.
pub const CSV_FILE_NAME: &str = "hosts.csv";

/// A request body ready to send.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(Value),
    Csv(String),
}

/// Build the body for `shape` that appends `entries` to `list`.
pub fn build(shape: PayloadShape, list: &StaticHostList, entries: &[HostListEntry]) -> Body {
    match shape {
        PayloadShape::NativeEntries => Body::Json(native_entries(list, entries)),
        PayloadShape::FullBody => Body::Json(full_body(list, entries)),
        PayloadShape::EntriesOnly => {
            let mut obj = Map::new();
            obj.insert(list.schema.entries_key().into(), appended(list, entries));
            Body::Json(Value::Object(obj))
        }
        PayloadShape::HostRecord(fields) => Body::Json(host_record(fields, entries.first())),
        PayloadShape::CsvImport => Body::Csv(csv(entries)),
    }
}

/// `{id, <entries>, preserved fields}`.
pub fn native_entries(list: &StaticHostList, entries: &[HostListEntry]) -> Value {
    let mut obj = Map::new();
    obj.insert("id".into(), id_value(&list.id));
    obj.insert(list.schema.entries_key().into(), appended(list, entries));
    for field in PRESERVED_FIELDS {
        if let Some(value) = list.raw.get(*field) {
            obj.insert((*field).into(), value.clone());
        }
    }
    Value::Object(obj)
}

fn full_body(list: &StaticHostList, entries: &[HostListEntry]) -> Value {
    let mut obj = match &list.raw {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    obj.insert(list.schema.entries_key().into(), appended(list, entries));
    Value::Object(obj)
}

fn appended(list: &StaticHostList, entries: &[HostListEntry]) -> Value {
    let mut items = list.raw_entries();
    items.extend(entries.iter().map(|e| list.schema.entry_json(e)));
    Value::Array(items)
}

fn host_record(fields: HostFieldSet, entry: Option<&HostListEntry>) -> Value {
    let mut obj = Map::new();
    if let Some(entry) = entry {
        let (mac_field, description_field) = fields.fields();
        obj.insert(
            mac_field.into(),
            Value::String(entry.mac.format(fields.mac_style())),
        );
        obj.insert(
            description_field.into(),
            Value::String(entry.description.clone().unwrap_or_default()),
        );
    }
    Value::Object(obj)
}

fn csv(entries: &[HostListEntry]) -> String {
    let mut out = String::from("mac_address,description\n");
    for entry in entries {
        out.push_str(&entry.mac.format(MacStyle::ColonLower));
        out.push(',');
        out.push_str(&csv_field(entry.description.as_deref().unwrap_or_default()));
        out.push('\n');
    }
    out
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_owned()
    }
}

/// Numeric ids go back as numbers.
fn id_value(id: &str) -> Value {
    id.parse::<u64>()
        .map_or_else(|_| Value::String(id.to_owned()), Value::from)
}
