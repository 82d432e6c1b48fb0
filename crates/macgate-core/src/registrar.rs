// ── Registrar ──
//
// The entry point for every inbound action. Each method validates its
// input, opens its own session, runs the operation, and folds the outcome
// into an `ActionResult`. Nothing is shared between calls.

use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tracing::info;

use crate::batch::{self, BatchCandidate, BatchOutcome};
use crate::config::PlatformConfig;
use crate::device;
use crate::discovery;
use crate::endpoint;
use crate::error::CoreError;
use crate::explore;
use crate::model::{ActionResult, MacAddress, MacStyle, host_list};
use crate::resolver::{CascadePlan, MutationOutcome, MutationResolver};
use crate::session::Session;

pub struct Registrar {
    config: PlatformConfig,
    plan: CascadePlan,
}

impl Registrar {
    pub fn new(config: PlatformConfig) -> Self {
        Self {
            config,
            plan: CascadePlan::default(),
        }
    }

    /// Replace the cascade used by [`add_to_list`](Self::add_to_list).
    pub fn with_plan(mut self, plan: CascadePlan) -> Self {
        self.plan = plan;
        self
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    async fn session(&self) -> Result<Session, CoreError> {
        Session::open(&self.config).await
    }

    /// Authenticate and report a token preview.
    pub async fn test_connection(&self) -> Result<ActionResult, CoreError> {
        let session = self.session().await?;
        let client = session.client();
        let url = client.urls().api().to_string();
        info!(url = %url, "connection test succeeded");
        Ok(ActionResult::ok(
            format!("Connected to {url}"),
            json!({ "url": url, "token_preview": client.token().preview() }),
        ))
    }

    // ── Endpoint records ─────────────────────────────────────────────

    pub async fn add_endpoint(
        &self,
        raw_mac: &str,
        description: Option<&str>,
    ) -> Result<ActionResult, CoreError> {
        let mac = MacAddress::normalize(raw_mac)?;
        let session = self.session().await?;
        let record = endpoint::add_endpoint(session.client(), &mac, description).await?;
        Ok(ActionResult::ok(format!("Endpoint {mac} created"), record))
    }

    pub async fn get_endpoint(&self, raw_mac: &str) -> Result<ActionResult, CoreError> {
        let mac = MacAddress::normalize(raw_mac)?;
        let session = self.session().await?;
        Ok(match endpoint::get_endpoint(session.client(), &mac).await? {
            Some(record) => ActionResult::ok(format!("Endpoint {mac} found"), record),
            None => ActionResult::failed(format!("No endpoint found for {mac}"), json!({})),
        })
    }

    // ── Static host lists ────────────────────────────────────────────

    pub async fn list_lists(&self) -> Result<ActionResult, CoreError> {
        let session = self.session().await?;
        let lists = discovery::list_summaries(session.client())
            .await
            .ok_or_else(|| CoreError::unavailable("static host list collection", "*"))?;
        Ok(ActionResult::ok(
            format!("{} static host list(s)", lists.len()),
            json!(lists),
        ))
    }

    pub async fn view_list(&self, list_id: &str) -> Result<ActionResult, CoreError> {
        require_list_id(list_id)?;
        let session = self.session().await?;
        let list = discovery::read_list(session.client(), list_id)
            .await
            .ok_or_else(|| CoreError::unavailable("static host list", list_id))?;

        let mut data = host_list::summary_json(&list);
        if let Value::Object(map) = &mut data {
            map.insert("entries".into(), json!(list.entries));
        }
        Ok(ActionResult::ok(
            format!("List {} has {} entries", list.id, list.entries.len()),
            data,
        ))
    }

    pub async fn search_list(&self, list_id: &str, raw_mac: &str) -> Result<ActionResult, CoreError> {
        require_list_id(list_id)?;
        let mac = MacAddress::normalize(raw_mac)?;
        let session = self.session().await?;
        let list = discovery::read_list(session.client(), list_id)
            .await
            .ok_or_else(|| CoreError::unavailable("static host list", list_id))?;

        let matches: Vec<_> = list.entries.iter().filter(|e| e.mac == mac).collect();
        let found = !matches.is_empty();
        let message = if found {
            format!("{mac} found on list {list_id}")
        } else {
            format!("{mac} is not on list {list_id}")
        };
        Ok(ActionResult::ok(
            message,
            json!({
                "found": found,
                "list": host_list::summary_json(&list),
                "matches": matches,
            }),
        ))
    }

    pub async fn search_all_lists(&self, raw_mac: &str) -> Result<ActionResult, CoreError> {
        let mac = MacAddress::normalize(raw_mac)?;
        let session = self.session().await?;
        let client = session.client();
        let summaries = discovery::list_summaries(client)
            .await
            .ok_or_else(|| CoreError::unavailable("static host list collection", "*"))?;

        let mut matches = Vec::new();
        for summary in &summaries {
            let Some(list) = discovery::read_list(client, &summary.id).await else {
                continue;
            };
            for entry in list.entries.iter().filter(|e| e.mac == mac) {
                matches.push(json!({
                    "list_id": summary.id,
                    "list_name": summary.name.as_deref().or(list.name.as_deref()),
                    "mac_address": entry.mac.format(list.schema.mac_style()),
                    "description": entry.description,
                }));
            }
        }

        let message = if matches.is_empty() {
            format!("{mac} not found in any of {} list(s)", summaries.len())
        } else {
            format!("{mac} found in {} list(s)", matches.len())
        };
        Ok(ActionResult::ok(
            message,
            json!({ "lists_searched": summaries.len(), "matches": matches }),
        ))
    }

    /// Add one MAC to a list through the mutation cascade.
    pub async fn add_to_list(
        &self,
        list_id: &str,
        raw_mac: &str,
        description: Option<&str>,
    ) -> Result<ActionResult, CoreError> {
        require_list_id(list_id)?;
        let mac = MacAddress::normalize(raw_mac)?;
        let session = self.session().await?;
        let resolver = MutationResolver::with_plan(&session, self.plan.clone());
        let outcome = resolver.resolve(list_id, &mac, description).await?;

        let message = match &outcome {
            MutationOutcome::Verified {
                already_present: true,
                ..
            } => format!("{mac} is already on list {list_id}"),
            MutationOutcome::Verified { .. } => format!("{mac} added to list {list_id}"),
            MutationOutcome::Optimistic { .. } => {
                format!("{mac} accepted for list {list_id}; not yet visible")
            }
            MutationOutcome::Failed { attempts, .. } => {
                format!("Could not add {mac} to list {list_id} after {attempts} attempts")
            }
        };
        info!(%mac, list = list_id, success = outcome.is_success(), "add_to_list finished");

        let result = if outcome.is_success() {
            ActionResult::ok(message, outcome.to_json())
        } else {
            ActionResult::failed(message, outcome.to_json())
        };
        Ok(result)
    }

    /// Add many MACs to a list in one update.
    pub async fn batch_add(
        &self,
        list_id: &str,
        candidates: &[BatchCandidate],
    ) -> Result<ActionResult, CoreError> {
        require_list_id(list_id)?;
        if candidates.is_empty() {
            return Err(CoreError::ValidationFailed {
                message: "batch contains no MAC addresses".into(),
            });
        }
        let session = self.session().await?;
        Ok(match batch::reconcile(&session, list_id, candidates).await? {
            BatchOutcome::Applied(report) if report.added == 0 => ActionResult::ok(
                format!("No new MAC addresses to add ({} skipped)", report.skipped),
                json!(report),
            ),
            BatchOutcome::Applied(report) => ActionResult::ok(
                format!("Added {} MAC address(es) to list {list_id}", report.added),
                json!(report),
            ),
            BatchOutcome::Rejected {
                report,
                status,
                detail,
            } => ActionResult::failed(
                match status {
                    Some(status) => format!("Batch update rejected (HTTP {status})"),
                    None => "Batch update could not be sent".to_owned(),
                },
                json!({ "report": report, "status": status, "detail": detail }),
            ),
        })
    }

    // ── Exploration ──────────────────────────────────────────────────

    pub async fn explore(&self) -> Result<ActionResult, CoreError> {
        let session = self.session().await?;
        let report = explore::explore(session.client()).await;
        let available = report.values().filter(|r| r.is_available()).count();
        Ok(ActionResult::ok(
            format!("{available} of {} paths answered with JSON", report.len()),
            json!(report),
        ))
    }

    // ── Devices ──────────────────────────────────────────────────────

    pub async fn create_device(
        &self,
        raw_mac: &str,
        email: &str,
        name: Option<&str>,
    ) -> Result<ActionResult, CoreError> {
        let mac = MacAddress::normalize(raw_mac)?;
        require_email(email)?;
        let session = self.session().await?;
        let outcome = device::create_device(session.client(), &mac, email, name).await?;
        Ok(device_result(&mac, "created", &outcome))
    }

    pub async fn set_device_secret(
        &self,
        raw_mac: &str,
        secret: &SecretString,
    ) -> Result<ActionResult, CoreError> {
        let mac = MacAddress::normalize(raw_mac)?;
        if secret.expose_secret().is_empty() {
            return Err(CoreError::ValidationFailed {
                message: "secret must not be empty".into(),
            });
        }
        let session = self.session().await?;
        let outcome = device::set_device_secret(session.client(), &mac, secret).await?;
        Ok(device_result(&mac, "updated", &outcome))
    }

    /// Create a device with a generated secret and apply it.
    ///
    /// Succeeds when the secret was applied; the secret is in the result
    /// data either way.
    pub async fn provision_device(
        &self,
        raw_mac: &str,
        email: &str,
        name: Option<&str>,
        role_id: Option<u32>,
    ) -> Result<ActionResult, CoreError> {
        let mac = MacAddress::normalize(raw_mac)?;
        require_email(email)?;
        let session = self.session().await?;
        let report = device::provision(
            session.client(),
            &mac,
            email,
            name,
            role_id.unwrap_or(device::DEFAULT_ROLE_ID),
        )
        .await?;

        let colon = mac.format(MacStyle::ColonLower);
        Ok(match (report.creation.success, report.secret_step.success) {
            (_, true) => ActionResult::ok(format!("Device {colon} provisioned"), report.to_json()),
            (true, false) => ActionResult::failed(
                format!("Device {colon} created but the secret was not applied"),
                report.to_json(),
            ),
            (false, false) => ActionResult::failed(
                format!("Device {colon} could not be provisioned"),
                report.to_json(),
            ),
        })
    }
}

fn device_result(mac: &MacAddress, verb: &str, outcome: &device::DeviceOutcome) -> ActionResult {
    match outcome {
        device::DeviceOutcome::Applied(_) => {
            ActionResult::ok(format!("Device {mac} {verb}"), outcome.to_json())
        }
        device::DeviceOutcome::Fallback(_) => ActionResult::ok(
            format!("Device {mac} {verb} as endpoint record (fallback)"),
            outcome.to_json(),
        ),
        device::DeviceOutcome::Failed { attempts, .. } => ActionResult::failed(
            format!("Device {mac} was not {verb} after {attempts} attempts"),
            outcome.to_json(),
        ),
    }
}

fn require_list_id(list_id: &str) -> Result<(), CoreError> {
    if list_id.trim().is_empty() {
        return Err(CoreError::ValidationFailed {
            message: "list id is required".into(),
        });
    }
    Ok(())
}

fn require_email(email: &str) -> Result<(), CoreError> {
    if email.trim().is_empty() || !email.contains('@') {
        return Err(CoreError::ValidationFailed {
            message: format!("{email:?} is not an email address"),
        });
    }
    Ok(())
}
