// ── API explorer ──
//
// Probes well-known paths and reports what each one answered, for
// operators working out which resources a deployment exposes.

use indexmap::IndexMap;
use macgate_api::{PlatformClient, Surface};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::discovery::LIST_COLLECTION_PATHS;

/// Top-level paths; `""` is the management root, reported as `root`.
pub const TOP_PATHS: &[&str] = &[
    "",
    "network",
    "config",
    "policy",
    "identity",
    "endpoint",
    "guest",
    "monitoring",
    "platform",
    "enforcement",
];

pub const DEVICE_PATHS: &[&str] = &[
    "guest/devices",
    "guest/device",
    "devices",
    "identity/devices",
    "guest/users",
    "guestuser",
];

const TEXT_PREVIEW_LEN: usize = 200;

/// What one probed path answered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeResult {
    /// HTTP status; absent when the request itself failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ProbeResult {
    pub fn is_available(&self) -> bool {
        self.status == Some(200) && self.data.is_some()
    }
}

/// Probe every known path in order. Later duplicates are skipped.
pub async fn explore(client: &PlatformClient) -> IndexMap<String, ProbeResult> {
    let mut report = IndexMap::new();

    for path in TOP_PATHS {
        let (key, surface) = if path.is_empty() {
            ("root", Surface::Management)
        } else {
            (*path, Surface::Api)
        };
        report.insert(key.to_owned(), probe(client, surface, path).await);
    }

    for path in LIST_COLLECTION_PATHS.iter().chain(DEVICE_PATHS) {
        if report.contains_key(*path) {
            continue;
        }
        report.insert((*path).to_owned(), probe(client, Surface::Api, path).await);
    }

    report
}

async fn probe(client: &PlatformClient, surface: Surface, path: &str) -> ProbeResult {
    let url = match client.url(surface, path) {
        Ok(url) => url,
        Err(e) => return failed(&e),
    };
    debug!(%url, "exploring");

    match client.get(url).await {
        Ok(raw) if raw.status == 200 => match raw.json() {
            Some(data) => ProbeResult {
                status: Some(200),
                data: Some(data),
                error: None,
                text: None,
            },
            None => ProbeResult {
                status: Some(200),
                data: None,
                error: Some("invalid JSON".into()),
                text: Some(raw.body.chars().take(TEXT_PREVIEW_LEN).collect()),
            },
        },
        Ok(raw) => ProbeResult {
            status: Some(raw.status),
            data: None,
            error: Some(format!("HTTP {}", raw.status)),
            text: (!raw.body.is_empty()).then(|| raw.body.chars().take(TEXT_PREVIEW_LEN).collect()),
        },
        Err(e) => failed(&e),
    }
}

fn failed(e: &macgate_api::Error) -> ProbeResult {
    ProbeResult {
        status: None,
        data: None,
        error: Some(e.to_string()),
        text: None,
    }
}
