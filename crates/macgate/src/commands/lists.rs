//! Static host list command handlers.

use serde_json::Value;

use macgate_core::Registrar;

use crate::cli::{GlobalOpts, ListsArgs, ListsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Renderers ───────────────────────────────────────────────────────

fn lines_of(items: &Value, field: &str) -> String {
    items
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get(field))
                .map(output::cell)
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default()
}

/// Summary fields, then the entries as their own table.
fn list_detail(data: &Value) -> String {
    let summary = [
        format!("ID:      {}", output::cell(&data["id"])),
        format!("Name:    {}", output::cell(&data["name"])),
        format!("Schema:  {}", output::cell(&data["schema"])),
        format!("Path:    {}", output::cell(&data["path"])),
        format!("Entries: {}", output::cell(&data["entry_count"])),
    ]
    .join("\n");
    match data.get("entries") {
        Some(entries) => format!("{summary}\n{}", output::value_table(entries)),
        None => summary,
    }
}

fn matches_table(data: &Value) -> String {
    data.get("matches")
        .map(output::value_table)
        .unwrap_or_default()
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn handle(
    registrar: &Registrar,
    args: ListsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ListsCommand::List => {
            let result = registrar.list_lists().await?;
            util::finish(global, &result, output::value_table, |d| lines_of(d, "id"))
        }

        ListsCommand::View { list_id } => {
            let result = registrar.view_list(&list_id).await?;
            util::finish(global, &result, list_detail, |d| lines_of(&d["entries"], "mac"))
        }

        ListsCommand::Search { list_id, mac } => {
            let result = registrar.search_list(&list_id, &mac).await?;
            util::finish(global, &result, matches_table, |d| {
                lines_of(&d["matches"], "mac")
            })
        }

        ListsCommand::Add {
            list_id,
            mac,
            description,
        } => {
            let result = registrar
                .add_to_list(&list_id, &mac, description.as_deref())
                .await?;
            util::finish(global, &result, output::value_table, |d| {
                output::cell(&d["outcome"])
            })
        }

        ListsCommand::Batch {
            list_id,
            file,
            json,
        } => {
            let candidates = util::read_batch(file.as_deref(), json)?;
            let result = registrar.batch_add(&list_id, &candidates).await?;
            util::finish(global, &result, output::value_table, |d| {
                d.get("macs_added")
                    .and_then(Value::as_array)
                    .map(|macs| macs.iter().map(output::cell).collect::<Vec<_>>().join("\n"))
                    .unwrap_or_default()
            })
        }
    }
}

/// `macgate search <MAC>`: every list.
pub async fn search_all(
    registrar: &Registrar,
    mac: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let result = registrar.search_all_lists(mac).await?;
    util::finish(global, &result, matches_table, |d| {
        lines_of(&d["matches"], "list_id")
    })
}
