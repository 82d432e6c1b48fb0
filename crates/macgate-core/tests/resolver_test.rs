#![allow(clippy::unwrap_used)]
// Integration tests for discovery, the mutation cascade and batch
// reconciliation against a wiremock platform.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use secrecy::SecretString;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use macgate_api::{BearerToken, PlatformClient, PlatformUrls, Surface, TransportConfig, Verb};
use macgate_core::batch::{self, BatchCandidate, BatchOutcome};
use macgate_core::discovery;
use macgate_core::resolver::{
    CascadePlan, EndpointTemplate, HostFieldSet, MutationOutcome, MutationResolver,
    MutationStrategy, PayloadShape, Propagation, StrategyGroup,
};
use macgate_core::{CoreError, MacAddress, Session};

// ── Helpers ─────────────────────────────────────────────────────────

const LIST_PATH: &str = "/api/static-host-list/1";
const NEW_MAC: &str = "aa:bb:cc:dd:ee:ff";

async fn setup() -> (MockServer, Session) {
    let server = MockServer::start().await;
    let urls = PlatformUrls::parse(&server.uri()).unwrap();
    let token = BearerToken::new(SecretString::from("test-token".to_owned()));
    let client = PlatformClient::with_token(urls, token, &TransportConfig::default()).unwrap();
    (server, Session::from_client(client, Duration::ZERO))
}

fn mac(raw: &str) -> MacAddress {
    MacAddress::normalize(raw).unwrap()
}

fn list_body(with_new: bool) -> Value {
    let mut entries = vec![json!({ "host_address": "11-22-33-44-55-66", "host_address_desc": "printer" })];
    if with_new {
        entries.push(json!({ "host_address": "AA-BB-CC-DD-EE-FF", "host_address_desc": "cam" }));
    }
    json!({ "id": 1, "name": "lab", "host_entries": entries })
}

/// Serves the list, including the new entry once `added` is set.
struct ListResponder {
    added: Arc<AtomicBool>,
}

impl Respond for ListResponder {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(list_body(self.added.load(Ordering::SeqCst)))
    }
}

/// A write that takes effect.
struct ApplyingWrite {
    added: Arc<AtomicBool>,
    status: u16,
}

impl Respond for ApplyingWrite {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        self.added.store(true, Ordering::SeqCst);
        ResponseTemplate::new(self.status)
    }
}

/// Serves the list, showing the new entry from the `visible_from`th read on.
struct DelayedList {
    reads: AtomicUsize,
    visible_from: usize,
}

impl Respond for DelayedList {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let read = self.reads.fetch_add(1, Ordering::SeqCst) + 1;
        ResponseTemplate::new(200).set_body_json(list_body(read >= self.visible_from))
    }
}

async fn mount_list(server: &MockServer, added: &Arc<AtomicBool>) {
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(ListResponder {
            added: Arc::clone(added),
        })
        .mount(server)
        .await;
}

async fn forbid_writes(server: &MockServer) {
    for verb in ["POST", "PUT", "PATCH"] {
        Mock::given(method(verb))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(server)
            .await;
    }
}

fn strategy(
    group: StrategyGroup,
    endpoint: EndpointTemplate,
    verb: Verb,
    payload: PayloadShape,
    propagation: Propagation,
) -> MutationStrategy {
    MutationStrategy {
        group,
        endpoint,
        verb,
        payload,
        propagation,
        prerequisite: None,
    }
}

/// A list write the platform refuses until the MAC is a known endpoint.
struct EndpointGatedWrite {
    endpoint_known: Arc<AtomicBool>,
    added: Arc<AtomicBool>,
}

impl Respond for EndpointGatedWrite {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        if self.endpoint_known.load(Ordering::SeqCst) {
            self.added.store(true, Ordering::SeqCst);
            ResponseTemplate::new(200)
        } else {
            ResponseTemplate::new(422).set_body_string("unknown endpoint")
        }
    }
}

/// Endpoint creation that flips `endpoint_known`.
struct EndpointCreate {
    endpoint_known: Arc<AtomicBool>,
    status: u16,
}

impl Respond for EndpointCreate {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        if self.status >= 300 {
            return ResponseTemplate::new(self.status).set_body_string("conflict");
        }
        self.endpoint_known.store(true, Ordering::SeqCst);
        ResponseTemplate::new(self.status).set_body_json(json!({ "id": 9, "status": "Known" }))
    }
}

// ── Discovery ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_discovery_stops_at_first_answering_path() {
    let (server, session) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/static-host-list"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/static-host-lists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 3 }])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/network-devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let found = discovery::discover(
        session.client(),
        &["static-host-list", "static-host-lists", "network-devices"],
    )
    .await
    .unwrap();

    assert_eq!(found.path, "static-host-lists");
    assert_eq!(found.body, json!([{ "id": 3 }]));
}

#[tokio::test]
async fn test_discovery_skips_non_json_200() {
    let (server, session) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/static-host-list/5"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/static-host-lists/5"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": 5, "hosts": [] })),
        )
        .mount(&server)
        .await;

    let list = discovery::read_list(session.client(), "5").await.unwrap();
    assert_eq!(list.path, "static-host-lists/5");
}

#[tokio::test]
async fn test_discovery_exhaustion_is_none() {
    let (_server, session) = setup().await;
    assert!(discovery::read_list(session.client(), "9").await.is_none());
    assert!(discovery::list_summaries(session.client()).await.is_none());
}

// ── Gate ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_present_mac_in_other_format_causes_no_write() {
    let (server, session) = setup().await;
    let added = Arc::new(AtomicBool::new(true));
    mount_list(&server, &added).await;
    forbid_writes(&server).await;

    let outcome = MutationResolver::new(&session)
        .resolve("1", &mac("AABB.CCDD.EEFF"), None)
        .await
        .unwrap();

    match outcome {
        MutationOutcome::Verified {
            entry,
            strategy,
            already_present,
        } => {
            assert!(already_present);
            assert!(strategy.is_none());
            assert_eq!(entry.mac, mac(NEW_MAC));
        }
        other => panic!("expected Verified, got {other:?}"),
    }
}

#[tokio::test]
async fn test_second_resolve_writes_nothing() {
    let (server, session) = setup().await;
    let added = Arc::new(AtomicBool::new(false));
    mount_list(&server, &added).await;

    Mock::given(method("PATCH"))
        .and(path(LIST_PATH))
        .respond_with(ApplyingWrite {
            added: Arc::clone(&added),
            status: 200,
        })
        .expect(1)
        .mount(&server)
        .await;

    let resolver = MutationResolver::new(&session);
    let first = resolver.resolve("1", &mac(NEW_MAC), Some("cam")).await.unwrap();
    assert!(matches!(
        first,
        MutationOutcome::Verified {
            already_present: false,
            ..
        }
    ));

    let second = resolver.resolve("1", &mac(NEW_MAC), Some("cam")).await.unwrap();
    assert!(matches!(
        second,
        MutationOutcome::Verified {
            already_present: true,
            ..
        }
    ));
}

// ── Cascade ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_cascade_moves_past_error_and_unverified_sync_success() {
    let (server, session) = setup().await;
    let added = Arc::new(AtomicBool::new(false));
    mount_list(&server, &added).await;

    Mock::given(method("PATCH"))
        .and(path(LIST_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(LIST_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/static-host-list/1/host"))
        .and(body_json(json!({ "host_address": "AA-BB-CC-DD-EE-FF", "host_address_desc": "cam" })))
        .respond_with(ApplyingWrite {
            added: Arc::clone(&added),
            status: 201,
        })
        .expect(1)
        .mount(&server)
        .await;

    let plan = CascadePlan::from_strategies(vec![
        strategy(
            StrategyGroup::FieldAppend,
            EndpointTemplate::Discovered,
            Verb::Patch,
            PayloadShape::NativeEntries,
            Propagation::Asynchronous,
        ),
        strategy(
            StrategyGroup::WholeReplace,
            EndpointTemplate::api("static-host-list/{list_id}"),
            Verb::Put,
            PayloadShape::FullBody,
            Propagation::Synchronous,
        ),
        strategy(
            StrategyGroup::HostSubresource,
            EndpointTemplate::api("static-host-list/{list_id}/host"),
            Verb::Post,
            PayloadShape::HostRecord(HostFieldSet::HostAddress),
            Propagation::Synchronous,
        ),
    ]);

    let outcome = MutationResolver::with_plan(&session, plan)
        .resolve("1", &mac(NEW_MAC), Some("cam"))
        .await
        .unwrap();

    match outcome {
        MutationOutcome::Verified {
            strategy: Some(strategy),
            already_present: false,
            ..
        } => assert_eq!(strategy.group, StrategyGroup::HostSubresource),
        other => panic!("expected Verified by host subresource, got {other:?}"),
    }
}

#[tokio::test]
async fn test_asynchronous_success_is_accepted_optimistically() {
    let (server, session) = setup().await;
    let added = Arc::new(AtomicBool::new(false));
    mount_list(&server, &added).await;

    Mock::given(method("PATCH"))
        .and(path(LIST_PATH))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let outcome = MutationResolver::new(&session)
        .resolve("1", &mac(NEW_MAC), None)
        .await
        .unwrap();

    match outcome {
        MutationOutcome::Optimistic { strategy, status } => {
            assert_eq!(status, 204);
            assert_eq!(strategy.group, StrategyGroup::FieldAppend);
        }
        other => panic!("expected Optimistic, got {other:?}"),
    }
}

#[tokio::test]
async fn test_list_write_succeeds_after_endpoint_registration() {
    let (server, session) = setup().await;
    let added = Arc::new(AtomicBool::new(false));
    let endpoint_known = Arc::new(AtomicBool::new(false));
    mount_list(&server, &added).await;

    Mock::given(method("POST"))
        .and(path("/api/endpoint"))
        .and(body_json(json!({
            "mac_address": NEW_MAC,
            "status": "Known",
            "description": "Added via macgate",
        })))
        .respond_with(EndpointCreate {
            endpoint_known: Arc::clone(&endpoint_known),
            status: 201,
        })
        .expect(1)
        .mount(&server)
        .await;
    // Refused once by the plain field append, accepted after registration.
    Mock::given(method("PATCH"))
        .and(path(LIST_PATH))
        .respond_with(EndpointGatedWrite {
            endpoint_known: Arc::clone(&endpoint_known),
            added: Arc::clone(&added),
        })
        .expect(2)
        .mount(&server)
        .await;

    let plan = CascadePlan::with_group_order(&[
        StrategyGroup::FieldAppend,
        StrategyGroup::EndpointFirst,
        StrategyGroup::WholeReplace,
    ]);
    let outcome = MutationResolver::with_plan(&session, plan)
        .resolve("1", &mac(NEW_MAC), None)
        .await
        .unwrap();

    match outcome {
        MutationOutcome::Verified {
            strategy: Some(strategy),
            already_present: false,
            ..
        } => assert_eq!(strategy.group, StrategyGroup::EndpointFirst),
        other => panic!("expected Verified via endpoint-first, got {other:?}"),
    }
}

#[tokio::test]
async fn test_endpoint_registration_failure_does_not_stop_list_write() {
    let (server, session) = setup().await;
    let added = Arc::new(AtomicBool::new(false));
    mount_list(&server, &added).await;

    Mock::given(method("POST"))
        .and(path("/api/endpoint"))
        .respond_with(EndpointCreate {
            endpoint_known: Arc::new(AtomicBool::new(false)),
            status: 409,
        })
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(LIST_PATH))
        .respond_with(ApplyingWrite {
            added: Arc::clone(&added),
            status: 200,
        })
        .expect(1)
        .mount(&server)
        .await;

    let plan = CascadePlan::with_group_order(&[StrategyGroup::EndpointFirst]);
    let outcome = MutationResolver::with_plan(&session, plan)
        .resolve("1", &mac(NEW_MAC), None)
        .await
        .unwrap();

    assert!(
        matches!(
            outcome,
            MutationOutcome::Verified {
                strategy: Some(MutationStrategy {
                    group: StrategyGroup::EndpointFirst,
                    ..
                }),
                ..
            }
        ),
        "got {outcome:?}"
    );
}

#[tokio::test]
async fn test_final_read_upgrades_failure() {
    let (server, session) = setup().await;

    // Read 1: initial, read 2: after the attempt, read 3: final check.
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(DelayedList {
            reads: AtomicUsize::new(0),
            visible_from: 3,
        })
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(LIST_PATH))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;

    let plan = CascadePlan::from_strategies(vec![strategy(
        StrategyGroup::WholeReplace,
        EndpointTemplate::api("static-host-list/{list_id}"),
        Verb::Put,
        PayloadShape::FullBody,
        Propagation::Synchronous,
    )]);

    let outcome = MutationResolver::with_plan(&session, plan)
        .resolve("1", &mac(NEW_MAC), None)
        .await
        .unwrap();

    assert!(
        matches!(
            outcome,
            MutationOutcome::Verified {
                already_present: false,
                strategy: None,
                ..
            }
        ),
        "got {outcome:?}"
    );
}

#[tokio::test]
async fn test_exhausted_cascade_reports_last_attempt() {
    let (server, session) = setup().await;
    let added = Arc::new(AtomicBool::new(false));
    mount_list(&server, &added).await;

    Mock::given(method("PUT"))
        .and(path(LIST_PATH))
        .respond_with(ResponseTemplate::new(422).set_body_string("host_entries is read-only"))
        .mount(&server)
        .await;

    let plan = CascadePlan::with_group_order(&[StrategyGroup::WholeReplace]);
    let attempts_expected = plan.len();
    let outcome = MutationResolver::with_plan(&session, plan)
        .resolve("1", &mac(NEW_MAC), None)
        .await
        .unwrap();

    match outcome {
        MutationOutcome::Failed {
            attempts,
            last_status,
            detail,
        } => {
            assert_eq!(attempts, attempts_expected);
            // Last strategy is PATCH entries-only on the plural path, which 404s.
            assert_eq!(last_status, Some(404));
            assert!(detail.starts_with("PATCH static-host-lists/{list_id}"), "{detail}");
        }
        other => panic!("expected Failed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreadable_list_is_fatal_without_writes() {
    let (server, session) = setup().await;
    forbid_writes(&server).await;

    let result = MutationResolver::new(&session)
        .resolve("404", &mac(NEW_MAC), None)
        .await;

    assert!(matches!(result, Err(CoreError::EntityUnavailable { .. })));
}

#[tokio::test]
async fn test_file_import_uploads_csv_to_management_surface() {
    let (server, session) = setup().await;
    let added = Arc::new(AtomicBool::new(false));
    mount_list(&server, &added).await;

    Mock::given(method("POST"))
        .and(path("/platform/static-host-list/1/import"))
        .and(body_string_contains("filename=\"hosts.csv\""))
        .and(body_string_contains("mac_address,description"))
        .and(body_string_contains("aa:bb:cc:dd:ee:ff,cam"))
        .respond_with(ApplyingWrite {
            added: Arc::clone(&added),
            status: 200,
        })
        .expect(1)
        .mount(&server)
        .await;

    let plan = CascadePlan::with_group_order(&[StrategyGroup::FileImport]);
    assert!(matches!(
        plan.strategies()[0].endpoint,
        EndpointTemplate::Path {
            surface: Surface::Management,
            ..
        }
    ));

    let outcome = MutationResolver::with_plan(&session, plan)
        .resolve("1", &mac(NEW_MAC), Some("cam"))
        .await
        .unwrap();
    assert!(outcome.is_success(), "got {outcome:?}");
}

// ── Batch ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_batch_submits_one_combined_update() {
    let (server, session) = setup().await;
    let added = Arc::new(AtomicBool::new(false));
    mount_list(&server, &added).await;

    Mock::given(method("PATCH"))
        .and(path(LIST_PATH))
        .and(body_json(json!({
            "id": 1,
            "name": "lab",
            "host_entries": [
                { "host_address": "11-22-33-44-55-66", "host_address_desc": "printer" },
                { "host_address": "AA-BB-CC-DD-EE-FF", "host_address_desc": "cam" },
            ],
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let candidates = [
        BatchCandidate::new("11:22:33:44:55:66", None),
        BatchCandidate::new("AA:BB:CC:DD:EE:FF", Some("cam".into())),
        BatchCandidate::new("aabb.ccdd.eeff", Some("dup".into())),
        BatchCandidate::new("bogus", None),
    ];

    let outcome = batch::reconcile(&session, "1", &candidates).await.unwrap();
    let BatchOutcome::Applied(report) = outcome else {
        panic!("expected Applied, got {outcome:?}");
    };
    assert_eq!(report.added, 1);
    assert_eq!(report.macs_added, vec!["AA-BB-CC-DD-EE-FF".to_owned()]);
    assert_eq!(report.skipped_existing, 1);
    assert_eq!(report.skipped_duplicate, 1);
    assert_eq!(report.skipped_invalid, 1);
    assert_eq!(report.skipped, 3);
}

#[tokio::test]
async fn test_batch_with_nothing_new_sends_nothing() {
    let (server, session) = setup().await;
    let added = Arc::new(AtomicBool::new(true));
    mount_list(&server, &added).await;
    forbid_writes(&server).await;

    let candidates = [BatchCandidate::new("aa-bb-cc-dd-ee-ff", None)];
    let outcome = batch::reconcile(&session, "1", &candidates).await.unwrap();
    let BatchOutcome::Applied(report) = outcome else {
        panic!("expected Applied");
    };
    assert_eq!(report.added, 0);
    assert_eq!(report.skipped_existing, 1);
}

#[tokio::test]
async fn test_batch_rejection_carries_status_and_body() {
    let (server, session) = setup().await;
    let added = Arc::new(AtomicBool::new(false));
    mount_list(&server, &added).await;

    Mock::given(method("PATCH"))
        .and(path(LIST_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid host_entries"))
        .mount(&server)
        .await;

    let candidates = [BatchCandidate::new(NEW_MAC, None)];
    match batch::reconcile(&session, "1", &candidates).await.unwrap() {
        BatchOutcome::Rejected {
            report,
            status,
            detail,
        } => {
            assert_eq!(status, Some(400));
            assert_eq!(detail, "invalid host_entries");
            assert_eq!(report.added, 0);
        }
        other @ BatchOutcome::Applied(_) => panic!("expected Rejected, got {other:?}"),
    }
}
