// ── Mutation strategies ──
//
// A strategy is one (endpoint, verb, payload) guess at how this deployment
// accepts a new list entry. The cascade is plain data so callers can
// reorder or narrow it.

use macgate_api::{Surface, Verb};
use serde::Serialize;

use crate::model::{MacAddress, MacStyle, StaticHostList};

/// Where a strategy sends its request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointTemplate {
    /// The path the entity reader found the list at.
    Discovered,
    /// A template with `{list_id}` and `{mac}` placeholders.
    Path {
        surface: Surface,
        template: &'static str,
    },
}

impl EndpointTemplate {
    pub const fn api(template: &'static str) -> Self {
        Self::Path {
            surface: Surface::Api,
            template,
        }
    }

    pub const fn management(template: &'static str) -> Self {
        Self::Path {
            surface: Surface::Management,
            template,
        }
    }

    /// Resolve to a surface and relative path for this list and MAC.
    pub fn resolve(&self, list: &StaticHostList, mac: &MacAddress) -> (Surface, String) {
        match self {
            Self::Discovered => (Surface::Api, list.path.clone()),
            Self::Path { surface, template } => (
                *surface,
                template
                    .replace("{list_id}", &list.id)
                    .replace("{mac}", &mac.format(MacStyle::ColonLower)),
            ),
        }
    }
}

/// Field-name variants for a single host record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HostFieldSet {
    /// `{mac_address, description}`
    MacAddress,
    /// `{host_address, host_address_desc}`
    HostAddress,
    /// `{mac, notes}`
    Mac,
}

impl HostFieldSet {
    pub const fn fields(self) -> (&'static str, &'static str) {
        match self {
            Self::MacAddress => ("mac_address", "description"),
            Self::HostAddress => ("host_address", "host_address_desc"),
            Self::Mac => ("mac", "notes"),
        }
    }

    pub const fn mac_style(self) -> MacStyle {
        match self {
            Self::HostAddress => MacStyle::HyphenUpper,
            Self::MacAddress | Self::Mac => MacStyle::ColonLower,
        }
    }
}

/// What a strategy sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadShape {
    /// `{id, <entries>, preserved list fields}` with the entry appended.
    NativeEntries,
    /// The whole list body with the entry appended.
    FullBody,
    /// `{<entries>: [...]}` alone.
    EntriesOnly,
    /// A single host object.
    HostRecord(HostFieldSet),
    /// A one-row multipart CSV upload.
    CsvImport,
}

/// Whether a 2xx can be trusted before the change is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Propagation {
    /// The change must be visible on the verification read.
    Synchronous,
    /// A 2xx is accepted even when the verification read does not show it.
    Asynchronous,
}

/// Work done before a strategy's write. Its failure does not stop the write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Prerequisite {
    /// Create an endpoint record for the MAC; some deployments only accept
    /// list entries for known endpoints.
    RegisterEndpoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StrategyGroup {
    FieldAppend,
    EndpointFirst,
    WholeReplace,
    HostSubresource,
    ManagementSurface,
    FileImport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationStrategy {
    pub group: StrategyGroup,
    pub endpoint: EndpointTemplate,
    pub verb: Verb,
    pub payload: PayloadShape,
    pub propagation: Propagation,
    pub prerequisite: Option<Prerequisite>,
}

impl MutationStrategy {
    const fn sync(
        group: StrategyGroup,
        endpoint: EndpointTemplate,
        verb: Verb,
        payload: PayloadShape,
    ) -> Self {
        Self {
            group,
            endpoint,
            verb,
            payload,
            propagation: Propagation::Synchronous,
            prerequisite: None,
        }
    }

    /// Run `prerequisite` before the write.
    pub const fn after(mut self, prerequisite: Prerequisite) -> Self {
        self.prerequisite = Some(prerequisite);
        self
    }

    /// Short human label, e.g. `PATCH static-host-list/{list_id} (full_body)`.
    pub fn label(&self) -> String {
        let target = match &self.endpoint {
            EndpointTemplate::Discovered => "<discovered>",
            EndpointTemplate::Path { template, .. } => *template,
        };
        let payload = match self.payload {
            PayloadShape::NativeEntries => "native_entries".to_owned(),
            PayloadShape::FullBody => "full_body".to_owned(),
            PayloadShape::EntriesOnly => "entries_only".to_owned(),
            PayloadShape::HostRecord(fields) => format!("host_record:{fields}"),
            PayloadShape::CsvImport => "csv_import".to_owned(),
        };
        match self.prerequisite {
            Some(pre) => format!("{pre}, then {} {target} ({payload})", self.verb),
            None => format!("{} {target} ({payload})", self.verb),
        }
    }
}

// ── Strategy tables ─────────────────────────────────────────────────

const REPLACE_PATHS: &[&str] = &["static-host-list/{list_id}", "static-host-lists/{list_id}"];

const HOST_COLLECTION_PATHS: &[&str] = &[
    "static-host-list/{list_id}/host",
    "static-host-lists/{list_id}/host",
    "static-host-list/{list_id}/hosts",
    "static-host-lists/{list_id}/hosts",
];

const HOST_ITEM_PATHS: &[&str] = &[
    "static-host-list/{list_id}/host/{mac}",
    "static-host-lists/{list_id}/host/{mac}",
];

const MANAGEMENT_PATHS: &[&str] = &[
    "platform/static-host-list/{list_id}/host",
    "platform/static-host-lists/{list_id}/host",
    "management/static-host-list/{list_id}/host",
    "management/static-host-lists/{list_id}/host",
    "admin/static-host-list/{list_id}/host",
    "admin/static-host-lists/{list_id}/host",
    "config/static-host-list/{list_id}/host",
    "config/static-host-lists/{list_id}/host",
    "network/devices/static-host-list/{list_id}/add-mac",
    "network/devices/static-host-lists/{list_id}/add-mac",
];

const MANAGEMENT_IMPORT_PATHS: &[&str] = &[
    "platform/static-host-list/{list_id}/import",
    "management/static-host-list/{list_id}/import",
    "config/static-host-list/{list_id}/import",
];

fn group_strategies(group: StrategyGroup) -> Vec<MutationStrategy> {
    match group {
        StrategyGroup::FieldAppend => vec![MutationStrategy {
            group,
            endpoint: EndpointTemplate::Discovered,
            verb: Verb::Patch,
            payload: PayloadShape::NativeEntries,
            propagation: Propagation::Asynchronous,
            prerequisite: None,
        }],
        // Later groups run with the endpoint already registered.
        StrategyGroup::EndpointFirst => vec![
            MutationStrategy::sync(
                group,
                EndpointTemplate::Discovered,
                Verb::Patch,
                PayloadShape::NativeEntries,
            )
            .after(Prerequisite::RegisterEndpoint),
        ],
        StrategyGroup::WholeReplace => REPLACE_PATHS
            .iter()
            .copied()
            .flat_map(|path| {
                let endpoint = EndpointTemplate::api(path);
                [
                    (Verb::Patch, PayloadShape::FullBody),
                    (Verb::Put, PayloadShape::FullBody),
                    (Verb::Patch, PayloadShape::EntriesOnly),
                ]
                .map(|(verb, payload)| MutationStrategy::sync(group, endpoint.clone(), verb, payload))
            })
            .collect(),
        StrategyGroup::HostSubresource => {
            let mut out: Vec<MutationStrategy> = HOST_COLLECTION_PATHS
                .iter()
                .copied()
                .flat_map(|path| {
                    [HostFieldSet::MacAddress, HostFieldSet::HostAddress].map(|fields| {
                        MutationStrategy::sync(
                            group,
                            EndpointTemplate::api(path),
                            Verb::Post,
                            PayloadShape::HostRecord(fields),
                        )
                    })
                })
                .collect();
            out.extend(HOST_ITEM_PATHS.iter().copied().map(|path| {
                MutationStrategy::sync(
                    group,
                    EndpointTemplate::api(path),
                    Verb::Post,
                    PayloadShape::HostRecord(HostFieldSet::MacAddress),
                )
            }));
            out
        }
        StrategyGroup::ManagementSurface => MANAGEMENT_PATHS
            .iter()
            .copied()
            .map(|path| {
                MutationStrategy::sync(
                    group,
                    EndpointTemplate::management(path),
                    Verb::Post,
                    PayloadShape::HostRecord(HostFieldSet::MacAddress),
                )
            })
            .collect(),
        StrategyGroup::FileImport => MANAGEMENT_IMPORT_PATHS
            .iter()
            .copied()
            .map(EndpointTemplate::management)
            .chain(std::iter::once(EndpointTemplate::api(
                "static-host-list/{list_id}/import",
            )))
            .map(|endpoint| {
                MutationStrategy::sync(group, endpoint, Verb::Post, PayloadShape::CsvImport)
            })
            .collect(),
    }
}

/// Ordered cascade of strategies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadePlan {
    strategies: Vec<MutationStrategy>,
}

impl CascadePlan {
    pub const DEFAULT_ORDER: [StrategyGroup; 6] = [
        StrategyGroup::FieldAppend,
        StrategyGroup::EndpointFirst,
        StrategyGroup::WholeReplace,
        StrategyGroup::HostSubresource,
        StrategyGroup::ManagementSurface,
        StrategyGroup::FileImport,
    ];

    /// Build a plan from groups in the given order.
    pub fn with_group_order(order: &[StrategyGroup]) -> Self {
        Self {
            strategies: order.iter().flat_map(|g| group_strategies(*g)).collect(),
        }
    }

    pub fn from_strategies(strategies: Vec<MutationStrategy>) -> Self {
        Self { strategies }
    }

    pub fn strategies(&self) -> &[MutationStrategy] {
        &self.strategies
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl Default for CascadePlan {
    fn default() -> Self {
        Self::with_group_order(&Self::DEFAULT_ORDER)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_plan_starts_with_async_field_append() {
        let plan = CascadePlan::default();
        let first = &plan.strategies()[0];
        assert_eq!(first.group, StrategyGroup::FieldAppend);
        assert_eq!(first.verb, Verb::Patch);
        assert_eq!(first.propagation, Propagation::Asynchronous);
        assert!(
            plan.strategies()[1..]
                .iter()
                .all(|s| s.propagation == Propagation::Synchronous)
        );
    }

    #[test]
    fn default_plan_group_sizes() {
        let count = |g| {
            CascadePlan::default()
                .strategies()
                .iter()
                .filter(|s| s.group == g)
                .count()
        };
        assert_eq!(count(StrategyGroup::FieldAppend), 1);
        assert_eq!(count(StrategyGroup::EndpointFirst), 1);
        assert_eq!(count(StrategyGroup::WholeReplace), 6);
        assert_eq!(count(StrategyGroup::HostSubresource), 10);
        assert_eq!(count(StrategyGroup::ManagementSurface), 10);
        assert_eq!(count(StrategyGroup::FileImport), 4);
    }

    #[test]
    fn endpoint_first_registers_before_native_patch() {
        let plan = CascadePlan::default();
        let step = &plan.strategies()[1];
        assert_eq!(step.group, StrategyGroup::EndpointFirst);
        assert_eq!(step.prerequisite, Some(Prerequisite::RegisterEndpoint));
        assert_eq!(
            step.label(),
            "register_endpoint, then PATCH <discovered> (native_entries)"
        );
        assert!(
            plan.strategies()
                .iter()
                .filter(|s| s.group != StrategyGroup::EndpointFirst)
                .all(|s| s.prerequisite.is_none())
        );
    }

    #[test]
    fn group_order_is_respected() {
        let plan = CascadePlan::with_group_order(&[StrategyGroup::FileImport, StrategyGroup::FieldAppend]);
        assert_eq!(plan.strategies()[0].group, StrategyGroup::FileImport);
        assert_eq!(plan.strategies().last().unwrap().group, StrategyGroup::FieldAppend);
    }

    #[test]
    fn templates_resolve_list_id_and_mac() {
        let list = StaticHostList::from_body("7", "static-host-lists/7", json!({}));
        let mac = MacAddress::normalize("AABBCCDDEEFF").unwrap();

        assert_eq!(
            EndpointTemplate::Discovered.resolve(&list, &mac),
            (Surface::Api, "static-host-lists/7".to_owned())
        );
        assert_eq!(
            EndpointTemplate::api("static-host-list/{list_id}/host/{mac}").resolve(&list, &mac),
            (Surface::Api, "static-host-list/7/host/aa:bb:cc:dd:ee:ff".to_owned())
        );
        assert_eq!(
            EndpointTemplate::management("platform/static-host-list/{list_id}/host")
                .resolve(&list, &mac)
                .0,
            Surface::Management
        );
    }
}
