//! Shared helpers for command handlers.

use std::io::Read;
use std::path::Path;

use serde_json::Value;

use macgate_core::{ActionResult, BatchCandidate, parse_batch_json, parse_batch_text};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

/// Print an action result and turn an unsuccessful one into an error.
pub fn finish(
    global: &GlobalOpts,
    result: &ActionResult,
    table_fn: impl Fn(&Value) -> String,
    plain_fn: impl Fn(&Value) -> String,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let out = output::render_action(&global.output, result, color, table_fn, plain_fn);
    output::print_output(&out, global.quiet);

    if result.success {
        Ok(())
    } else {
        Err(CliError::OperationFailed {
            message: result.message.clone(),
        })
    }
}

/// `finish` with the generic table and the message as plain output.
pub fn finish_default(global: &GlobalOpts, result: &ActionResult) -> Result<(), CliError> {
    let message = result.message.clone();
    finish(global, result, output::value_table, move |_| message.clone())
}

/// Read batch input from a file, or stdin for `-` / no path.
pub fn read_batch(path: Option<&Path>, json: bool) -> Result<Vec<BatchCandidate>, CliError> {
    let text = match path {
        Some(p) if p != Path::new("-") => std::fs::read_to_string(p)?,
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    if json {
        Ok(parse_batch_json(&text)?)
    } else {
        Ok(parse_batch_text(&text))
    }
}
