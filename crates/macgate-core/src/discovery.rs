// ── Entity reader ──
//
// Resource paths differ between deployments, so reads probe an ordered
// candidate table and keep the first path that answers 200 with JSON.
// Probing stops at the first hit.

use macgate_api::PlatformClient;
use serde_json::Value;
use tracing::{debug, trace};

use crate::model::{HostListSummary, StaticHostList};

/// Paths that may serve the collection of static host lists.
pub const LIST_COLLECTION_PATHS: &[&str] = &[
    "static-host-list",
    "static-host-lists",
    "network-devices",
    "device-databases",
    "endpoint/static-host-lists",
    "enforcement/static-host-lists",
    "policy/static-host-lists",
    "identity/static-host-lists",
    "config/static-host-lists",
    "config/static-host-list",
];

/// Paths that may serve one static host list; `{id}` is substituted.
pub const LIST_PATH_TEMPLATES: &[&str] = &[
    "static-host-list/{id}",
    "static-host-lists/{id}",
    "network-devices/{id}",
    "device-databases/{id}",
];

/// A path that answered, with its parsed body.
#[derive(Debug, Clone, PartialEq)]
pub struct Discovered {
    pub path: String,
    pub body: Value,
}

/// Candidate paths for a single list.
pub fn list_paths(list_id: &str) -> Vec<String> {
    LIST_PATH_TEMPLATES
        .iter()
        .map(|t| t.replace("{id}", list_id))
        .collect()
}

/// GET each candidate on the API surface in order and return the first that
/// answers 200 with a JSON body. Transport errors and other statuses move on
/// to the next candidate.
pub async fn discover<S: AsRef<str>>(client: &PlatformClient, candidates: &[S]) -> Option<Discovered> {
    for candidate in candidates {
        let path = candidate.as_ref();
        let url = match client.api_url(path) {
            Ok(url) => url,
            Err(e) => {
                debug!(path, error = %e, "skipping unbuildable candidate");
                continue;
            }
        };

        match client.get(url).await {
            Ok(raw) if raw.status == 200 => {
                if let Some(body) = raw.json() {
                    debug!(path, "discovered working path");
                    return Some(Discovered {
                        path: path.to_owned(),
                        body,
                    });
                }
                trace!(path, "200 without JSON body");
            }
            Ok(raw) => trace!(path, status = raw.status, "candidate rejected"),
            Err(e) => trace!(path, error = %e, "candidate unreachable"),
        }
    }
    None
}

/// Read one list through discovery. `None` when no candidate answers.
pub async fn read_list(client: &PlatformClient, list_id: &str) -> Option<StaticHostList> {
    let found = discover(client, &list_paths(list_id)).await?;
    Some(StaticHostList::from_body(list_id, found.path, found.body))
}

/// Read the collection of lists. `None` when no candidate answers.
pub async fn list_summaries(client: &PlatformClient) -> Option<Vec<HostListSummary>> {
    let found = discover(client, LIST_COLLECTION_PATHS).await?;
    Some(HostListSummary::parse_collection(&found.body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_paths_substitute_id_in_order() {
        assert_eq!(
            list_paths("12"),
            vec![
                "static-host-list/12",
                "static-host-lists/12",
                "network-devices/12",
                "device-databases/12",
            ]
        );
    }
}
