// ── Per-operation session ──
//
// A session is one authenticated client plus the verification timing for a
// single registrar action. It is opened at the start of the action and
// dropped at the end; credentials are never shared between actions.

use std::time::Duration;

use macgate_api::PlatformClient;
use tracing::debug;

use crate::config::PlatformConfig;
use crate::error::CoreError;

pub struct Session {
    client: PlatformClient,
    settle_delay: Duration,
}

impl Session {
    /// Validate the config, acquire a fresh token, and build the client.
    pub async fn open(config: &PlatformConfig) -> Result<Self, CoreError> {
        config.validate()?;
        let urls = config.urls()?;
        let client =
            PlatformClient::connect(urls, &config.credentials(), &config.transport()).await?;
        debug!(token = %client.token().preview(), "session opened");
        Ok(Self {
            client,
            settle_delay: config.settle_delay,
        })
    }

    /// Wrap an existing client.
    pub fn from_client(client: PlatformClient, settle_delay: Duration) -> Self {
        Self {
            client,
            settle_delay,
        }
    }

    pub fn client(&self) -> &PlatformClient {
        &self.client
    }

    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    /// Give an accepted write time to become visible.
    pub(crate) async fn settle(&self) {
        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }
    }
}
