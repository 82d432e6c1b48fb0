//! Endpoint command handlers.

use serde_json::Value;

use macgate_core::Registrar;

use crate::cli::{EndpointArgs, EndpointCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

fn plain(record: &Value) -> String {
    record
        .get("id")
        .or_else(|| record.get("mac_address"))
        .map_or_else(String::new, output::cell)
}

pub async fn handle(
    registrar: &Registrar,
    args: EndpointArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let result = match args.command {
        EndpointCommand::Add { mac, description } => {
            registrar.add_endpoint(&mac, description.as_deref()).await?
        }
        EndpointCommand::Get { mac } => registrar.get_endpoint(&mac).await?,
    };
    util::finish(global, &result, output::value_table, plain)
}
