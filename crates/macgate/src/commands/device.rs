//! Device command handlers.

use secrecy::SecretString;

use macgate_core::{Registrar, secret};

use crate::cli::{DeviceArgs, DeviceCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "secret".into(),
        reason: format!("prompt failed: {e}"),
    }
}

pub async fn handle(
    registrar: &Registrar,
    args: DeviceArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        DeviceCommand::Create { mac, email, name } => {
            let result = registrar
                .create_device(&mac, &email, name.as_deref())
                .await?;
            util::finish_default(global, &result)
        }

        DeviceCommand::SetSecret {
            mac,
            secret: given,
            generate,
        } => {
            let value = match (given, generate) {
                (Some(value), _) => value,
                (None, true) => secret::generate(secret::DEFAULT_LENGTH)?,
                (None, false) => rpassword::prompt_password("Device secret: ").map_err(prompt_err)?,
            };
            let result = registrar
                .set_device_secret(&mac, &SecretString::from(value.clone()))
                .await?;
            if generate && result.success {
                eprintln!("Generated secret: {value}");
            }
            util::finish_default(global, &result)
        }

        DeviceCommand::Provision {
            mac,
            email,
            name,
            role_id,
        } => {
            let result = registrar
                .provision_device(&mac, &email, name.as_deref(), role_id)
                .await?;
            // The secret is printed even on failure so it can be applied by hand.
            util::finish(global, &result, output::value_table, |d| {
                output::cell(&d["secret"])
            })
        }
    }
}
