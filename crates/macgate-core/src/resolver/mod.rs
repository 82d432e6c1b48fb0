// ── Mutation resolver ──
//
// Adds one MAC to one list on a deployment whose write surface is unknown.
// Runs the cascade one strategy at a time: gate, build from fresh state,
// send, settle, re-read. Success is what the re-read shows, not what the
// status code claims.

pub mod payload;
pub mod strategy;

use macgate_api::{PlatformClient, RawResponse};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::discovery;
use crate::endpoint;
use crate::error::CoreError;
use crate::gate;
use crate::model::{HostListEntry, MacAddress, StaticHostList};
use crate::session::Session;

pub use payload::Body;
pub use strategy::{
    CascadePlan, EndpointTemplate, HostFieldSet, MutationStrategy, PayloadShape, Prerequisite,
    Propagation, StrategyGroup,
};

/// Result of one resolver run.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome {
    /// The entry is visible on the list.
    Verified {
        entry: HostListEntry,
        /// Strategy whose write made it visible; `None` if it was already there.
        strategy: Option<MutationStrategy>,
        already_present: bool,
    },
    /// An asynchronous strategy got a 2xx but the change is not yet visible.
    Optimistic {
        strategy: MutationStrategy,
        status: u16,
    },
    /// Every strategy was tried and none took effect.
    Failed {
        attempts: usize,
        last_status: Option<u16>,
        detail: String,
    },
}

impl MutationOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    /// JSON view for action results.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Verified {
                entry,
                strategy,
                already_present,
            } => json!({
                "outcome": "verified",
                "entry": entry,
                "already_present": already_present,
                "strategy": strategy.as_ref().map(StrategyView::from),
            }),
            Self::Optimistic { strategy, status } => json!({
                "outcome": "optimistic",
                "status": status,
                "strategy": StrategyView::from(strategy),
            }),
            Self::Failed {
                attempts,
                last_status,
                detail,
            } => json!({
                "outcome": "failed",
                "attempts": attempts,
                "last_status": last_status,
                "detail": detail,
            }),
        }
    }
}

#[derive(Serialize)]
struct StrategyView {
    group: StrategyGroup,
    label: String,
    propagation: Propagation,
}

impl From<&MutationStrategy> for StrategyView {
    fn from(s: &MutationStrategy) -> Self {
        Self {
            group: s.group,
            label: s.label(),
            propagation: s.propagation,
        }
    }
}

/// Default description for entries added one at a time.
pub fn default_description() -> String {
    format!(
        "Added via macgate on {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    )
}

/// Runs a [`CascadePlan`] against one session.
pub struct MutationResolver<'a> {
    session: &'a Session,
    plan: CascadePlan,
}

impl<'a> MutationResolver<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self::with_plan(session, CascadePlan::default())
    }

    pub fn with_plan(session: &'a Session, plan: CascadePlan) -> Self {
        Self { session, plan }
    }

    pub fn plan(&self) -> &CascadePlan {
        &self.plan
    }

    /// Ensure `mac` is on list `list_id`.
    ///
    /// Fails only if the list cannot be read at all; cascade exhaustion is a
    /// [`MutationOutcome::Failed`].
    pub async fn resolve(
        &self,
        list_id: &str,
        mac: &MacAddress,
        description: Option<&str>,
    ) -> Result<MutationOutcome, CoreError> {
        let client = self.session.client();
        let mut list = discovery::read_list(client, list_id)
            .await
            .ok_or_else(|| CoreError::unavailable("static host list", list_id))?;

        if let Some(existing) = gate::already_present(&list, mac) {
            info!(%mac, list = list_id, "already present, nothing to write");
            return Ok(MutationOutcome::Verified {
                entry: existing.clone(),
                strategy: None,
                already_present: true,
            });
        }

        let entry = HostListEntry::new(
            mac.clone(),
            Some(description.map_or_else(default_description, str::to_owned)),
        );

        let mut attempts = 0;
        let mut last_status = None;
        let mut last_detail = String::from("no strategies attempted");
        let mut outcome = None;

        // The re-read after each attempt is also the gate for the next one.
        for strategy in self.plan.strategies() {
            attempts += 1;
            let label = strategy.label();
            debug!(attempt = attempts, strategy = %label, "trying strategy");

            let accepted = match self.attempt(client, strategy, &list, &entry).await {
                Ok(raw) => {
                    last_status = Some(raw.status);
                    last_detail = format!("{label}: HTTP {}: {}", raw.status, raw.preview());
                    if raw.is_success() {
                        self.session.settle().await;
                    }
                    raw.is_success().then_some(raw.status)
                }
                Err(e) => {
                    last_status = None;
                    last_detail = format!("{label}: {e}");
                    debug!(strategy = %label, error = %e, "attempt failed");
                    None
                }
            };

            if let Some(fresh) = discovery::read_list(client, list_id).await {
                list = fresh;
            }

            if let Some(found) = gate::already_present(&list, mac) {
                info!(%mac, list = list_id, strategy = %label, "verified");
                outcome = Some(MutationOutcome::Verified {
                    entry: found.clone(),
                    strategy: Some(strategy.clone()),
                    already_present: false,
                });
                break;
            }

            if let Some(status) = accepted {
                if strategy.propagation == Propagation::Asynchronous {
                    warn!(
                        %mac,
                        list = list_id,
                        strategy = %label,
                        status,
                        "accepting unverified write from asynchronous strategy"
                    );
                    outcome = Some(MutationOutcome::Optimistic {
                        strategy: strategy.clone(),
                        status,
                    });
                    break;
                }
                debug!(strategy = %label, status, "2xx but change not visible");
            }
        }

        let outcome = outcome.unwrap_or(MutationOutcome::Failed {
            attempts,
            last_status,
            detail: last_detail,
        });

        Ok(self.final_check(list_id, mac, outcome).await)
    }

    async fn attempt(
        &self,
        client: &PlatformClient,
        strategy: &MutationStrategy,
        list: &StaticHostList,
        entry: &HostListEntry,
    ) -> Result<RawResponse, CoreError> {
        if let Some(Prerequisite::RegisterEndpoint) = strategy.prerequisite {
            match endpoint::add_endpoint(client, &entry.mac, None).await {
                Ok(_) => debug!(mac = %entry.mac, "endpoint registered"),
                Err(e) => debug!(mac = %entry.mac, error = %e, "endpoint registration failed"),
            }
        }
        let (surface, path) = strategy.endpoint.resolve(list, &entry.mac);
        let url = client.url(surface, &path)?;
        let raw = match payload::build(strategy.payload, list, std::slice::from_ref(entry)) {
            Body::Json(body) => client.send(strategy.verb, url, Some(&body)).await?,
            Body::Csv(csv) => client.upload_csv(url, payload::CSV_FILE_NAME, csv).await?,
        };
        Ok(raw)
    }

    /// One last read, which upgrades an optimistic or failed outcome when
    /// the entry turns out to be visible after all.
    async fn final_check(
        &self,
        list_id: &str,
        mac: &MacAddress,
        outcome: MutationOutcome,
    ) -> MutationOutcome {
        let strategy = match &outcome {
            MutationOutcome::Verified { .. } => return outcome,
            MutationOutcome::Optimistic { strategy, .. } => Some(strategy.clone()),
            MutationOutcome::Failed { .. } => None,
        };

        let Some(list) = discovery::read_list(self.session.client(), list_id).await else {
            return outcome;
        };
        match gate::already_present(&list, mac) {
            Some(found) => {
                info!(%mac, list = list_id, "verified on final read");
                MutationOutcome::Verified {
                    entry: found.clone(),
                    strategy,
                    already_present: false,
                }
            }
            None => outcome,
        }
    }
}
