#![allow(clippy::unwrap_used)]
// End-to-end tests for the controller and message pump against a mock
// cloud service.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use icomfort_core::api::{CloudConfig, Endpoints};
use icomfort_core::{
    ClientConfig, ClientError, CloudController, PumpState, SetpointChange, Zone, ZoneKey,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn config_for(server: &MockServer) -> ClientConfig {
    let base = Url::parse(&server.uri()).unwrap();
    ClientConfig {
        email: "user@example.com".into(),
        password: "hunter2".to_string().into(),
        cloud: CloudConfig {
            endpoints: Endpoints::with_base(&base).unwrap(),
            client_id: "test-client".into(),
            ..CloudConfig::default()
        },
        poll_interval: Duration::from_millis(50),
        init_timeout: Duration::from_secs(5),
        ..ClientConfig::default()
    }
}

fn login_body() -> serde_json::Value {
    json!({
        "ServerAssignedRoot": {
            "serverAssigned": {
                "security": {
                    "userToken": { "encoded": "bearer-1", "expires": "2099-01-01T00:00:00Z" }
                }
            }
        },
        "readyHomes": {
            "homes": [ { "homeId": 1, "systems": [ { "sysId": "sys-1", "id": 0 } ] } ]
        }
    })
}

/// Mount happy-path authenticate / login / request-data mocks.
async fn mount_handshake(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/mobile/authenticate"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "certificateToken": "cert-1" })),
        )
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v2/user/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_body()))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/messages/requestData"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}

fn zone_update(zone_id: u32, temperature: f64) -> serde_json::Value {
    json!({
        "messages": [
            {
                "MessageId": "msg-1",
                "SenderID": "sys-1",
                "MessageType": "PropertyChange",
                "Data": {
                    "zones": [
                        { "id": zone_id, "status": { "temperature": temperature } }
                    ]
                }
            }
        ]
    })
}

async fn count_requests(server: &MockServer, url_path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == url_path)
        .count()
}

async fn wait_for(mut cond: impl FnMut() -> bool, what: &str) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

// ── Connection & initialization ─────────────────────────────────────

#[tokio::test]
async fn first_zone_update_activates_exactly_one_zone() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;

    Mock::given(method("GET"))
        .and(path("/v1/messages/retrieve"))
        .respond_with(ResponseTemplate::new(200).set_body_json(zone_update(0, 70.0)))
        .mount(&server)
        .await;

    let controller = CloudController::new(config_for(&server)).unwrap();
    controller.server_connect().await.unwrap();

    // Enumerated but not yet reporting: the system exists, no zone does.
    assert_eq!(controller.system_list().len(), 1);
    assert!(controller.get_zones().is_empty());

    controller.initialize().await.unwrap();

    let zones = controller.get_zones();
    assert_eq!(zones.len(), 1);
    assert_eq!(zones[0].status.temperature, Some(70.0));
    assert_eq!(zones[0].unique_id(), "sys-1_0");
}

#[tokio::test]
async fn initialize_times_out_without_failing() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;

    // No zone updates ever arrive.
    Mock::given(method("GET"))
        .and(path("/v1/messages/retrieve"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "messages": [] })))
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.init_timeout = Duration::from_millis(200);
    let controller = CloudController::new(config).unwrap();

    controller.server_connect().await.unwrap();
    controller.initialize().await.unwrap();

    assert!(controller.get_zones().is_empty());
}

#[tokio::test]
async fn connect_failure_surfaces_synchronously() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/mobile/authenticate"))
        .respond_with(ResponseTemplate::new(500).set_body_string("certificate rejected"))
        .mount(&server)
        .await;

    let controller = CloudController::new(config_for(&server)).unwrap();
    let result = controller.server_connect().await;

    match result {
        Err(ClientError::AuthFailed { message }) => {
            assert_eq!(message, "certificate rejected");
        }
        other => panic!("expected AuthFailed, got: {other:?}"),
    }
    assert_eq!(*controller.pump_state().borrow(), PumpState::Disconnected);
}

// ── Pump reconnect behavior ─────────────────────────────────────────

#[tokio::test]
async fn unauthorized_response_triggers_exactly_one_reauth() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;

    // First retrieve is rejected as unauthorized, all later ones succeed.
    Mock::given(method("GET"))
        .and(path("/v1/messages/retrieve"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/messages/retrieve"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "messages": [] })))
        .mount(&server)
        .await;

    let controller = CloudController::new(config_for(&server)).unwrap();
    controller.server_connect().await.unwrap();
    controller.start_message_pump(None);

    // connect logged in once; the unauthorized cycle forces exactly one more.
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if count_requests(&server, "/v2/user/login").await == 2 {
            break;
        }
        assert!(Instant::now() < deadline, "reauth never happened");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    // Give the pump a few more cycles: no further reauths may occur.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(count_requests(&server, "/v2/user/login").await, 2);
    assert_eq!(*controller.pump_state().borrow(), PumpState::Polling);

    controller.shutdown().await;
}

#[tokio::test]
async fn consecutive_failures_below_threshold_do_not_reconnect() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;

    Mock::given(method("GET"))
        .and(path("/v1/messages/retrieve"))
        .respond_with(ResponseTemplate::new(500).set_body_string("relay error"))
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.failure_threshold = 3;
    config.poll_interval = Duration::from_millis(100);
    let controller = CloudController::new(config).unwrap();

    let errors: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&errors);
    let on_error: icomfort_core::PumpErrorHandler = Arc::new(move |err: &ClientError| {
        sink.lock().unwrap().push(err.to_string());
    });

    controller.server_connect().await.unwrap();
    controller.start_message_pump(Some(on_error));

    // Two absorbed failures: still polling, no reauth yet.
    wait_for(
        || errors.lock().unwrap().len() >= 2,
        "two absorbed cycle failures",
    )
    .await;
    assert_eq!(count_requests(&server, "/v2/user/login").await, 1);
    assert_eq!(*controller.pump_state().borrow(), PumpState::Polling);

    // The third failure trips the threshold and forces a reconnect.
    wait_for(|| errors.lock().unwrap().len() >= 3, "third cycle failure").await;
    wait_for_reauth(&server).await;

    controller.shutdown().await;
}

async fn wait_for_reauth(server: &MockServer) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while count_requests(server, "/v2/user/login").await < 2 {
        assert!(Instant::now() < deadline, "threshold reconnect never happened");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

// ── Observers ───────────────────────────────────────────────────────

#[tokio::test]
async fn observers_receive_updated_active_zones() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;

    Mock::given(method("GET"))
        .and(path("/v1/messages/retrieve"))
        .respond_with(ResponseTemplate::new(200).set_body_json(zone_update(0, 71.0)))
        .mount(&server)
        .await;

    let controller = CloudController::new(config_for(&server)).unwrap();
    let seen: Arc<Mutex<Vec<Zone>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    controller.on_update(Arc::new(move |zone: &Zone| {
        sink.lock().unwrap().push(zone.clone());
    }));

    controller.server_connect().await.unwrap();
    controller.start_message_pump(None);

    wait_for(|| !seen.lock().unwrap().is_empty(), "first observer delivery").await;
    let first = seen.lock().unwrap()[0].clone();
    assert_eq!(first.status.temperature, Some(71.0));
    assert!(first.is_active());

    controller.shutdown().await;
}

// ── Commands ────────────────────────────────────────────────────────

#[tokio::test]
async fn setpoint_command_addresses_manual_mode_schedule() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;

    Mock::given(method("GET"))
        .and(path("/v1/messages/retrieve"))
        .respond_with(ResponseTemplate::new(200).set_body_json(zone_update(1, 70.0)))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/messages/publish"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let controller = CloudController::new(config_for(&server)).unwrap();
    controller.server_connect().await.unwrap();
    controller.initialize().await.unwrap();

    let zone = ZoneKey::new("sys-1", 1);
    controller
        .set_temperature(
            &zone,
            SetpointChange {
                hsp: Some(68.0),
                csp: None,
            },
        )
        .await
        .unwrap();

    let body: serde_json::Value = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .find(|r| r.url.path() == "/v1/messages/publish")
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .unwrap();

    assert_eq!(body["MessageType"], "Command");
    assert_eq!(body["TargetID"], "sys-1");
    let schedule = &body["Data"]["schedules"][0];
    assert_eq!(schedule["id"], 17, "zone 1 writes to schedule base + 1");
    let period = &schedule["schedule"]["periods"][0]["period"];
    assert_eq!(period["hsp"], 68.0);
    assert_eq!(period["hspC"], 20.0);
}

#[tokio::test]
async fn commands_on_unknown_zones_are_rejected() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;

    Mock::given(method("GET"))
        .and(path("/v1/messages/retrieve"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "messages": [] })))
        .mount(&server)
        .await;

    let controller = CloudController::new(config_for(&server)).unwrap();
    controller.server_connect().await.unwrap();

    let result = controller
        .set_hvac_mode(&ZoneKey::new("sys-1", 5), icomfort_core::HvacMode::Heat)
        .await;

    assert!(
        matches!(result, Err(ClientError::UnknownZone { .. })),
        "expected UnknownZone, got: {result:?}"
    );
}

// ── Shutdown ────────────────────────────────────────────────────────

#[tokio::test]
async fn shutdown_stops_the_pump_and_clears_state() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;

    Mock::given(method("GET"))
        .and(path("/v1/messages/retrieve"))
        .respond_with(ResponseTemplate::new(200).set_body_json(zone_update(0, 70.0)))
        .mount(&server)
        .await;

    let controller = CloudController::new(config_for(&server)).unwrap();
    controller.server_connect().await.unwrap();
    controller.start_message_pump(None);

    wait_for(
        {
            let controller = controller.clone();
            move || !controller.get_zones().is_empty()
        },
        "first zone activation",
    )
    .await;

    controller.shutdown().await;
    assert!(controller.get_zones().is_empty());
    assert_eq!(*controller.pump_state().borrow(), PumpState::Disconnected);

    let polls_after_shutdown = count_requests(&server, "/v1/messages/retrieve").await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(
        count_requests(&server, "/v1/messages/retrieve").await,
        polls_after_shutdown,
        "pump must not poll after shutdown"
    );

    // Idempotent.
    controller.shutdown().await;
}
