// ── Static host lists ──
//
// A static host list is a named set of MAC entries. Deployments disagree
// on the array key and field names, so the wire schema is detected per
// read and carried with the list.

use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::warn;

use super::mac::{MacAddress, MacStyle};

/// Which entry layout a list body uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HostSchema {
    /// `hosts: [{mac_address, description}]`, colon MACs.
    Hosts,
    /// `host_entries: [{host_address, host_address_desc}]`, hyphen upper MACs.
    HostEntries,
}

impl HostSchema {
    pub const fn entries_key(self) -> &'static str {
        match self {
            Self::Hosts => "hosts",
            Self::HostEntries => "host_entries",
        }
    }

    pub const fn mac_field(self) -> &'static str {
        match self {
            Self::Hosts => "mac_address",
            Self::HostEntries => "host_address",
        }
    }

    pub const fn description_field(self) -> &'static str {
        match self {
            Self::Hosts => "description",
            Self::HostEntries => "host_address_desc",
        }
    }

    pub const fn mac_style(self) -> MacStyle {
        match self {
            Self::Hosts => MacStyle::ColonLower,
            Self::HostEntries => MacStyle::HyphenUpper,
        }
    }

    /// Detect the schema from a list body. `host_entries` wins when both
    /// keys hold arrays; a body with neither is treated as an empty
    /// `HostEntries`. A key set to `null` or a non-array counts as absent.
    pub fn detect(body: &Value) -> Self {
        let has_array = |schema: Self| {
            body.get(schema.entries_key())
                .and_then(Value::as_array)
                .is_some()
        };
        if has_array(Self::HostEntries) {
            Self::HostEntries
        } else if has_array(Self::Hosts) {
            Self::Hosts
        } else {
            Self::HostEntries
        }
    }

    /// Render one entry in this schema's wire form.
    pub fn entry_json(self, entry: &HostListEntry) -> Value {
        let mut obj = Map::new();
        obj.insert(
            self.mac_field().into(),
            Value::String(entry.mac.format(self.mac_style())),
        );
        obj.insert(
            self.description_field().into(),
            Value::String(entry.description.clone().unwrap_or_default()),
        );
        Value::Object(obj)
    }
}

/// One MAC on a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostListEntry {
    pub mac: MacAddress,
    pub description: Option<String>,
}

impl HostListEntry {
    pub fn new(mac: MacAddress, description: Option<String>) -> Self {
        Self { mac, description }
    }
}

/// A list as last read from the platform.
///
/// Holds the raw body so replace payloads can carry fields this crate does
/// not model. Never reused across operations.
#[derive(Debug, Clone, Serialize)]
pub struct StaticHostList {
    pub id: String,
    pub name: Option<String>,
    pub schema: HostSchema,
    /// Path the list was read from, relative to the API surface.
    pub path: String,
    pub entries: Vec<HostListEntry>,
    #[serde(skip)]
    pub raw: Value,
}

impl StaticHostList {
    /// Normalize a list body. Entries whose MAC cannot be normalized are
    /// dropped from `entries` but stay in `raw`.
    pub fn from_body(requested_id: &str, path: impl Into<String>, raw: Value) -> Self {
        let schema = HostSchema::detect(&raw);
        let id = raw
            .get("id")
            .and_then(id_string)
            .unwrap_or_else(|| requested_id.to_owned());
        let name = raw.get("name").and_then(Value::as_str).map(str::to_owned);

        let entries = raw
            .get(schema.entries_key())
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| parse_entry(schema, item))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            id,
            name,
            schema,
            path: path.into(),
            entries,
            raw,
        }
    }

    /// Entries exactly as the platform returned them.
    pub fn raw_entries(&self) -> Vec<Value> {
        self.raw
            .get(self.schema.entries_key())
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()
    }
}

fn parse_entry(schema: HostSchema, item: &Value) -> Option<HostListEntry> {
    let raw_mac = item.get(schema.mac_field()).and_then(Value::as_str)?;
    match MacAddress::normalize(raw_mac) {
        Ok(mac) => {
            let description = item
                .get(schema.description_field())
                .and_then(Value::as_str)
                .filter(|d| !d.is_empty())
                .map(str::to_owned);
            Some(HostListEntry { mac, description })
        }
        Err(_) => {
            warn!(value = raw_mac, "skipping list entry with malformed MAC");
            None
        }
    }
}

/// `(id, name)` pair from the list-of-lists resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostListSummary {
    pub id: String,
    pub name: Option<String>,
}

impl HostListSummary {
    /// Extract summaries from `_embedded.items`, a bare array, or a
    /// `static-host-lists` array. Items without an id are skipped.
    pub fn parse_collection(body: &Value) -> Vec<Self> {
        let items = body
            .pointer("/_embedded/items")
            .and_then(Value::as_array)
            .or_else(|| body.as_array())
            .or_else(|| body.get("static-host-lists").and_then(Value::as_array));

        items
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| {
                        let id = item.get("id").and_then(id_string)?;
                        let name = item.get("name").and_then(Value::as_str).map(str::to_owned);
                        Some(Self { id, name })
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Ids arrive as numbers on some deployments and strings on others.
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A summary row for display.
pub fn summary_json(list: &StaticHostList) -> Value {
    json!({
        "id": list.id,
        "name": list.name,
        "schema": list.schema,
        "path": list.path,
        "entry_count": list.entries.len(),
    })
}
