// ── Idempotency gate ──

use crate::model::{HostListEntry, MacAddress, StaticHostList};

/// The entry for `mac` if the list already holds it, in any spelling.
pub fn already_present<'a>(list: &'a StaticHostList, mac: &MacAddress) -> Option<&'a HostListEntry> {
    list.entries.iter().find(|entry| entry.mac == *mac)
}
