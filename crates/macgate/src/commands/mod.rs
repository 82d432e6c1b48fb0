//! Command dispatch: bridges CLI args -> registrar actions -> output formatting.

pub mod config_cmd;
pub mod device;
pub mod endpoint;
pub mod explore;
pub mod lists;
pub mod ping;
pub mod secret;
pub mod util;

use macgate_core::Registrar;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a platform-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    registrar: &Registrar,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Endpoint(args) => endpoint::handle(registrar, args, global).await,
        Command::Lists(args) => lists::handle(registrar, args, global).await,
        Command::Search { mac } => lists::search_all(registrar, &mac, global).await,
        Command::Explore => explore::handle(registrar, global).await,
        Command::Ping => ping::handle(registrar, global).await,
        Command::Device(args) => device::handle(registrar, args, global).await,
        // Handled before a registrar is built
        Command::Secret(_) | Command::Config(_) | Command::Completions(_) => Err(
            CliError::Internal("local command routed to platform dispatch".into()),
        ),
    }
}
