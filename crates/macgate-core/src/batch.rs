// ── Batch reconciler ──
//
// Diffs a batch of MACs against one read of the list and submits a single
// native-entries update with whatever is new. Individual entries are not
// verified.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use macgate_api::Verb;

use crate::discovery;
use crate::error::CoreError;
use crate::model::{HostListEntry, MacAddress, StaticHostList};
use crate::resolver::payload;
use crate::session::Session;

/// One raw line of batch input.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BatchCandidate {
    #[serde(rename = "mac_address")]
    pub mac: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl BatchCandidate {
    pub fn new(mac: impl Into<String>, description: Option<String>) -> Self {
        Self {
            mac: mac.into(),
            description,
        }
    }
}

/// Per-batch counters. `skipped` is the sum of the three skip reasons.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub added: usize,
    pub skipped_existing: usize,
    pub skipped_duplicate: usize,
    pub skipped_invalid: usize,
    pub skipped: usize,
    pub macs_added: Vec<String>,
}

/// How a batch submission ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Written, or nothing needed writing.
    Applied(BatchReport),
    /// The platform refused the combined update.
    Rejected {
        report: BatchReport,
        status: Option<u16>,
        detail: String,
    },
}

/// Default description for entries added in bulk.
pub fn default_batch_description() -> String {
    format!(
        "Added via batch upload on {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    )
}

/// Split candidates into new entries and skip counts.
///
/// `added` and `macs_added` stay empty: they are filled only once the
/// update has been accepted.
pub fn plan(
    list: &StaticHostList,
    candidates: &[BatchCandidate],
    default_description: &str,
) -> (Vec<HostListEntry>, BatchReport) {
    let existing: HashSet<MacAddress> = list.entries.iter().map(|e| e.mac.clone()).collect();
    let mut seen: HashSet<MacAddress> = HashSet::new();
    let mut pending = Vec::new();
    let mut report = BatchReport::default();

    for candidate in candidates {
        let Ok(mac) = MacAddress::normalize(&candidate.mac) else {
            warn!(value = %candidate.mac, "skipping malformed MAC in batch");
            report.skipped_invalid += 1;
            continue;
        };
        if existing.contains(&mac) {
            debug!(%mac, "already on list");
            report.skipped_existing += 1;
            continue;
        }
        if !seen.insert(mac.clone()) {
            debug!(%mac, "repeated within batch");
            report.skipped_duplicate += 1;
            continue;
        }
        let description = candidate
            .description
            .clone()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| default_description.to_owned());
        pending.push(HostListEntry::new(mac, Some(description)));
    }

    report.skipped = report.skipped_existing + report.skipped_duplicate + report.skipped_invalid;
    (pending, report)
}

/// Read the list once and submit every new entry in one PATCH.
pub async fn reconcile(
    session: &Session,
    list_id: &str,
    candidates: &[BatchCandidate],
) -> Result<BatchOutcome, CoreError> {
    let client = session.client();
    let list = discovery::read_list(client, list_id)
        .await
        .ok_or_else(|| CoreError::unavailable("static host list", list_id))?;

    let (pending, mut report) = plan(&list, candidates, &default_batch_description());
    if pending.is_empty() {
        info!(list = list_id, skipped = report.skipped, "nothing new to add");
        return Ok(BatchOutcome::Applied(report));
    }

    let body = payload::native_entries(&list, &pending);
    let url = client.api_url(&list.path)?;
    let (status, detail) = match client.send(Verb::Patch, url, Some(&body)).await {
        Ok(raw) if raw.is_success() => {
            report.added = pending.len();
            report.macs_added = pending
                .iter()
                .map(|e| e.mac.format(list.schema.mac_style()))
                .collect();
            info!(list = list_id, added = report.added, "batch applied");
            return Ok(BatchOutcome::Applied(report));
        }
        Ok(raw) => (Some(raw.status), raw.preview()),
        Err(e) => (None, e.to_string()),
    };

    warn!(list = list_id, ?status, "batch update rejected");
    Ok(BatchOutcome::Rejected {
        report,
        status,
        detail,
    })
}

// ── Input parsing ───────────────────────────────────────────────────

/// Parse line-oriented batch text.
///
/// Blank lines and `#` comments are ignored. Fields split on `,` when the
/// line has one, else on tab. Malformed MACs are kept so the reconciler can
/// count them.
pub fn parse_batch_text(text: &str) -> Vec<BatchCandidate> {
    strip_bom(text)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            let sep = if line.contains(',') { ',' } else { '\t' };
            let mut fields = line.splitn(2, sep).map(str::trim);
            let mac = fields.next().unwrap_or_default();
            let description = fields
                .next()
                .filter(|d| !d.is_empty())
                .map(str::to_owned);
            BatchCandidate::new(mac, description)
        })
        .collect()
}

/// Parse a JSON array of `{mac_address, description}` objects.
pub fn parse_batch_json(text: &str) -> Result<Vec<BatchCandidate>, CoreError> {
    let value: Value =
        serde_json::from_str(strip_bom(text)).map_err(|e| CoreError::ValidationFailed {
            message: format!("batch JSON is not valid: {e}"),
        })?;
    serde_json::from_value(value).map_err(|e| CoreError::ValidationFailed {
        message: format!("batch JSON must be an array of {{mac_address, description}}: {e}"),
    })
}

/// Spreadsheet exports often start with a UTF-8 byte order mark.
fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{feff}').unwrap_or(text)
}
