//! Schema-uncertain host-list registration for network-access-control
//! platforms.
//!
//! The [`Registrar`] is the entry point: each action opens a fresh
//! [`Session`], discovers where the target resource lives, and for list
//! additions runs the [`MutationResolver`] cascade until a re-read shows
//! the entry.

pub mod batch;
pub mod config;
pub mod device;
pub mod discovery;
pub mod endpoint;
pub mod error;
pub mod explore;
pub mod gate;
pub mod model;
pub mod registrar;
pub mod resolver;
pub mod secret;
pub mod session;

pub use batch::{BatchCandidate, BatchOutcome, BatchReport, parse_batch_json, parse_batch_text};
pub use config::{DEFAULT_SETTLE_DELAY, PlatformConfig, TlsVerification};
pub use error::CoreError;
pub use model::{
    ActionResult, HostListEntry, HostListSummary, HostSchema, MacAddress, MacStyle, StaticHostList,
};
pub use registrar::Registrar;
pub use resolver::{CascadePlan, MutationOutcome, MutationResolver, StrategyGroup};
pub use session::Session;
