// ── Domain model ──

pub mod action;
pub mod host_list;
pub mod mac;

pub use action::ActionResult;
pub use host_list::{HostListEntry, HostListSummary, HostSchema, StaticHostList};
pub use mac::{MacAddress, MacStyle};
