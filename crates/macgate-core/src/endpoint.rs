// ── Endpoint records ──
//
// The platform's endpoint collection is the one resource with a stable
// path, so these calls fail loudly instead of probing.

use macgate_api::PlatformClient;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::CoreError;
use crate::model::{MacAddress, MacStyle};

pub const DEFAULT_ENDPOINT_DESCRIPTION: &str = "Added via macgate";

/// Create an endpoint record with status `Known`.
pub async fn add_endpoint(
    client: &PlatformClient,
    mac: &MacAddress,
    description: Option<&str>,
) -> Result<Value, CoreError> {
    let body = json!({
        "mac_address": mac.format(MacStyle::ColonLower),
        "status": "Known",
        "description": description.unwrap_or(DEFAULT_ENDPOINT_DESCRIPTION),
    });
    debug!(%mac, "creating endpoint record");
    Ok(client.post_json(client.api_url("endpoint")?, &body).await?)
}

/// Look up the endpoint record for `mac`; `None` when there is none.
pub async fn get_endpoint(
    client: &PlatformClient,
    mac: &MacAddress,
) -> Result<Option<Value>, CoreError> {
    let mut url = client.api_url("endpoint")?;
    let filter = json!({ "mac_address": mac.format(MacStyle::ColonLower) }).to_string();
    url.query_pairs_mut().append_pair("filter", &filter);

    let body: Value = client.get_json(url).await?;
    Ok(body
        .pointer("/_embedded/items/0")
        .filter(|item| !item.is_null())
        .cloned())
}
