//! API explorer command handler.

use serde_json::Value;
use tabled::Tabled;

use macgate_core::Registrar;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct ProbeRow {
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Result")]
    result: String,
}

fn probe_row(path: &str, probe: &Value) -> ProbeRow {
    let result = if probe.get("data").is_some() {
        "JSON".to_owned()
    } else {
        probe.get("error").map_or_else(|| "-".into(), output::cell)
    };
    ProbeRow {
        path: path.to_owned(),
        status: probe.get("status").map_or_else(|| "-".into(), output::cell),
        result,
    }
}

fn probe_table(data: &Value) -> String {
    let rows: Vec<ProbeRow> = data
        .as_object()
        .map(|report| report.iter().map(|(path, probe)| probe_row(path, probe)).collect())
        .unwrap_or_default();
    tabled::Table::new(rows)
        .with(tabled::settings::Style::rounded())
        .to_string()
}

/// Paths that answered with JSON, one per line.
fn available_paths(data: &Value) -> String {
    data.as_object()
        .map(|report| {
            report
                .iter()
                .filter(|(_, probe)| probe.get("data").is_some())
                .map(|(path, _)| path.as_str())
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default()
}

pub async fn handle(registrar: &Registrar, global: &GlobalOpts) -> Result<(), CliError> {
    let result = registrar.explore().await?;
    util::finish(global, &result, probe_table, available_paths)
}
