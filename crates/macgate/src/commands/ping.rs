//! Connectivity check command handler.

use serde_json::Value;

use macgate_core::Registrar;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util;

fn token_line(data: &Value) -> String {
    data.get("token_preview").map(output::cell).unwrap_or_default()
}

pub async fn handle(registrar: &Registrar, global: &GlobalOpts) -> Result<(), CliError> {
    let result = registrar.test_connection().await?;
    util::finish(global, &result, output::value_table, token_line)
}
