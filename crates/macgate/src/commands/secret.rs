//! Secret generator command handler. Needs no platform connection.

use serde_json::json;

use macgate_core::{ActionResult, secret};

use crate::cli::{GlobalOpts, SecretArgs, SecretCommand};
use crate::error::CliError;
use crate::output;

use super::util;

pub fn handle(args: SecretArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        SecretCommand::Generate { length } => {
            let value = secret::generate(length)?;
            let result = ActionResult::ok(
                format!("Generated {length}-character secret"),
                json!({ "secret": value, "length": length }),
            );
            util::finish(global, &result, output::value_table, |d| {
                output::cell(&d["secret"])
            })
        }
    }
}
