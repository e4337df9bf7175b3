#![allow(clippy::unwrap_used)]
// End-to-end tests for `DmsSession` against a wiremock DMS.

use std::sync::Mutex;
use std::time::Duration;

use futures_util::StreamExt;
use futures_util::stream::{self, BoxStream};
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::sync::{broadcast, mpsc};
use tokio_stream::wrappers::UnboundedReceiverStream;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fwdms_core::{
    CoreError, DmsSession, FirmwareList, FirmwareVersionEntry, HostTarget, InstallReporter,
    ReachabilitySource, ReachabilityState, SessionConfig, SessionEvent,
};

// ── Helpers ─────────────────────────────────────────────────────────

/// Never reports anything; keeps reachability out of the way.
struct Silent;

impl ReachabilitySource for Silent {
    fn subscribe(
        &self,
        _target: &HostTarget,
    ) -> Result<BoxStream<'static, ReachabilityState>, CoreError> {
        Ok(stream::pending().boxed())
    }
}

/// Reports whatever the test pushes.
struct Manual(Mutex<Option<mpsc::UnboundedReceiver<ReachabilityState>>>);

impl Manual {
    fn new() -> (Self, mpsc::UnboundedSender<ReachabilityState>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self(Mutex::new(Some(rx))), tx)
    }
}

impl ReachabilitySource for Manual {
    fn subscribe(
        &self,
        _target: &HostTarget,
    ) -> Result<BoxStream<'static, ReachabilityState>, CoreError> {
        let rx = self.0.lock().unwrap().take().unwrap();
        Ok(UnboundedReceiverStream::new(rx).boxed())
    }
}

fn config(base: &str, dir: &tempfile::TempDir) -> SessionConfig {
    SessionConfig::new(Url::parse(base).unwrap()).with_download_dir(dir.path())
}

async fn setup() -> (MockServer, tempfile::TempDir, DmsSession) {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let session = DmsSession::with_source("ABC123", config(&server.uri(), &dir), &Silent).unwrap();
    (server, dir, session)
}

fn release_1_2_0() -> FirmwareVersionEntry {
    FirmwareVersionEntry {
        version: "1.2.0".into(),
        description: "release".into(),
        tag: "stable".into(),
        size_bytes: 45000,
    }
}

async fn mount_catalog(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v1/devices/ABC123/firmware"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "versions": [
                { "version": "1.2.0", "description": "release", "tag": "stable", "size": 45000 }
            ]
        })))
        .mount(server)
        .await;
}

/// Address with nothing listening on it.
async fn dead_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

async fn next_event(rx: &mut broadcast::Receiver<SessionEvent>) -> SessionEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for event")
        .unwrap()
}

fn assert_no_list_event(rx: &mut broadcast::Receiver<SessionEvent>) {
    loop {
        match rx.try_recv() {
            Ok(SessionEvent::NewFirmwareList(list)) => panic!("unexpected list event: {list:?}"),
            Ok(SessionEvent::ReachabilityChanged(_)) => {}
            Err(_) => break,
        }
    }
}

// ── Catalog retrieval ───────────────────────────────────────────────

#[tokio::test]
async fn retrieve_updates_cache_and_publishes_same_list() {
    let (server, _dir, session) = setup().await;
    mount_catalog(&server).await;
    let mut events = session.subscribe();

    assert!(session.firmware_list().is_empty());
    let list = session.retrieve_available_versions().await.unwrap();

    assert_eq!(&*list, &[release_1_2_0()]);
    assert!(session.firmware_list().ptr_eq(&list));
    match next_event(&mut events).await {
        SessionEvent::NewFirmwareList(published) => assert!(published.ptr_eq(&list)),
        other => panic!("expected NewFirmwareList, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_catalog_is_success() {
    let (server, _dir, session) = setup().await;
    Mock::given(method("GET"))
        .and(path("/v1/devices/ABC123/firmware"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "versions": [] })))
        .mount(&server)
        .await;
    let mut events = session.subscribe();

    let list = session.retrieve_available_versions().await.unwrap();

    assert!(list.is_empty());
    assert_eq!(next_event(&mut events).await, SessionEvent::NewFirmwareList(FirmwareList::default()));
}

#[tokio::test]
async fn unreachable_service_is_network_error_and_keeps_cache() {
    let dir = tempfile::tempdir().unwrap();
    let session = DmsSession::with_source("ABC123", config(&dead_url().await, &dir), &Silent).unwrap();
    let mut events = session.subscribe();

    let result = session.retrieve_available_versions().await;

    assert!(
        matches!(result, Err(CoreError::Network { .. })),
        "expected Network error, got: {result:?}"
    );
    assert!(result.as_ref().unwrap_err().is_transient());
    assert!(session.firmware_list().is_empty());
    assert_no_list_event(&mut events);
}

#[tokio::test]
async fn failed_retrieval_leaves_previous_list() {
    let (server, _dir, session) = setup().await;
    Mock::given(method("GET"))
        .and(path("/v1/devices/ABC123/firmware"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "version": "1.2.0", "description": "release", "tag": "stable", "size": 45000 }
        ])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/devices/ABC123/firmware"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "db down" })))
        .mount(&server)
        .await;

    let first = session.retrieve_available_versions().await.unwrap();
    let mut events = session.subscribe();
    // Drain anything published before this point.
    while events.try_recv().is_ok() {}

    let second = session.retrieve_available_versions().await;

    assert!(
        matches!(second, Err(CoreError::Service { status: 500, ref message }) if message == "db down"),
        "expected Service error, got: {second:?}"
    );
    assert!(session.firmware_list().ptr_eq(&first));
    assert_no_list_event(&mut events);
}

#[tokio::test]
async fn malformed_catalog_is_parse_error() {
    let (server, _dir, session) = setup().await;
    Mock::given(method("GET"))
        .and(path("/v1/devices/ABC123/firmware"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"versions\": 42}"))
        .mount(&server)
        .await;

    let result = session.retrieve_available_versions().await;
    assert!(
        matches!(result, Err(CoreError::Parse { .. })),
        "expected Parse error, got: {result:?}"
    );
    assert!(session.firmware_list().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_retrievals_end_with_cache_matching_last_event() {
    let (server, _dir, session) = setup().await;
    mount_catalog(&server).await;
    let mut events = session.subscribe();

    let calls = (0..8).map(|_| {
        let session = session.clone();
        tokio::spawn(async move { session.retrieve_available_versions().await })
    });
    for call in calls.collect::<Vec<_>>() {
        call.await.unwrap().unwrap();
    }

    let mut last = None;
    while let Ok(event) = events.try_recv() {
        if let SessionEvent::NewFirmwareList(list) = event {
            last = Some(list);
        }
    }
    assert!(session.firmware_list().ptr_eq(&last.unwrap()));
}

#[tokio::test]
async fn sessions_do_not_share_state() {
    let (server, dir, session) = setup().await;
    mount_catalog(&server).await;
    let other = DmsSession::with_source("XYZ789", config(&server.uri(), &dir), &Silent).unwrap();
    let mut other_events = other.subscribe();

    session.retrieve_available_versions().await.unwrap();

    assert!(other.firmware_list().is_empty());
    assert!(other_events.try_recv().is_err());
}

// ── Firmware download ───────────────────────────────────────────────

#[tokio::test]
async fn download_returns_path_of_complete_image() {
    let (server, dir, session) = setup().await;
    mount_catalog(&server).await;
    let image = vec![0xA5u8; 45000];
    Mock::given(method("GET"))
        .and(path("/v1/devices/ABC123/firmware/1.2.0/image"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(image.clone()))
        .mount(&server)
        .await;

    let before = session.retrieve_available_versions().await.unwrap();
    let firmware_path = session.load_firmware_version("1.2.0").await.unwrap();

    assert_eq!(firmware_path, dir.path().join("ABC123").join("1.2.0.bin"));
    assert_eq!(firmware_path, session.image_path("1.2.0"));
    assert_eq!(std::fs::read(&firmware_path).unwrap(), image);

    // Re-listing after a download still shows the same entry.
    let after = session.retrieve_available_versions().await.unwrap();
    assert_eq!(after.find("1.2.0"), before.find("1.2.0"));
    assert_eq!(after.find("1.2.0"), Some(&release_1_2_0()));
}

#[tokio::test]
async fn unknown_version_is_not_found() {
    let (server, dir, session) = setup().await;
    Mock::given(method("GET"))
        .and(path("/v1/devices/ABC123/firmware/9.9.9/image"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result = session.load_firmware_version("9.9.9").await;

    assert!(
        matches!(result, Err(CoreError::NotFound { ref version }) if version == "9.9.9"),
        "expected NotFound error, got: {result:?}"
    );
    assert!(!dir.path().join("ABC123").join("9.9.9.bin").exists());
}

#[tokio::test]
async fn download_to_unwritable_location_is_storage_error() {
    let (server, dir, session) = setup().await;
    Mock::given(method("GET"))
        .and(path("/v1/devices/ABC123/firmware/1.2.0/image"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8; 64]))
        .mount(&server)
        .await;
    // Occupy the per-device directory name with a plain file.
    std::fs::write(dir.path().join("ABC123"), b"in the way").unwrap();

    let result = session.load_firmware_version("1.2.0").await;
    assert!(
        matches!(result, Err(CoreError::Storage { .. })),
        "expected Storage error, got: {result:?}"
    );
}

#[tokio::test]
async fn hostile_version_stays_inside_download_dir() {
    let (_server, dir, session) = setup().await;
    let image_path = session.image_path("../../escape");
    assert!(image_path.starts_with(dir.path().join("ABC123")));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_downloads_of_one_version_each_return_complete_image() {
    let (server, dir, session) = setup().await;
    let image: Vec<u8> = (0..=250u8).cycle().take(2 * 1024 * 1024).collect();
    Mock::given(method("GET"))
        .and(path("/v1/devices/ABC123/firmware/1.2.0/image"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(image.clone()))
        .mount(&server)
        .await;

    for _ in 0..3 {
        let calls: Vec<_> = (0..6)
            .map(|_| {
                let session = session.clone();
                let image = image.clone();
                tokio::spawn(async move {
                    let firmware_path = session.load_firmware_version("1.2.0").await.unwrap();
                    // Read back right away, while other downloads may still be landing.
                    assert!(tokio::fs::read(&firmware_path).await.unwrap() == image);
                    firmware_path
                })
            })
            .collect();
        for call in calls {
            assert_eq!(call.await.unwrap(), session.image_path("1.2.0"));
        }
    }

    let entries: Vec<_> = std::fs::read_dir(dir.path().join("ABC123"))
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(entries, vec![std::ffi::OsString::from("1.2.0.bin")]);
}

#[tokio::test]
async fn distinct_versions_are_stored_in_distinct_files() {
    let (server, _dir, session) = setup().await;
    for (version, byte) in [("1.0%2Fbeta", 1u8), ("1.0_beta", 2u8)] {
        Mock::given(method("GET"))
            .and(path(format!("/v1/devices/ABC123/firmware/{version}/image")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![byte; 16]))
            .mount(&server)
            .await;
    }

    let slashed = session.load_firmware_version("1.0/beta").await.unwrap();
    let underscored = session.load_firmware_version("1.0_beta").await.unwrap();

    assert_ne!(slashed, underscored);
    assert_eq!(std::fs::read(&slashed).unwrap(), vec![1u8; 16]);
    assert_eq!(std::fs::read(&underscored).unwrap(), vec![2u8; 16]);
}

#[tokio::test]
async fn empty_version_is_rejected_without_request() {
    let (server, _dir, session) = setup().await;
    let result = session.load_firmware_version("").await;
    assert!(matches!(result, Err(CoreError::InvalidArgument { .. })));
    assert!(server.received_requests().await.unwrap().is_empty());
}

// ── Reachability events ─────────────────────────────────────────────

#[tokio::test]
async fn repeated_unreachable_probes_emit_one_event() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let (source, probes) = Manual::new();
    let session = DmsSession::with_source("ABC123", config(&server.uri(), &dir), &source).unwrap();
    let mut events = session.subscribe();
    assert_eq!(session.reachability(), None);

    probes.send(ReachabilityState::Unreachable).unwrap();
    probes.send(ReachabilityState::Unreachable).unwrap();
    probes.send(ReachabilityState::Reachable).unwrap();

    assert_eq!(next_event(&mut events).await, SessionEvent::ReachabilityChanged(false));
    assert_eq!(next_event(&mut events).await, SessionEvent::ReachabilityChanged(true));
    assert_eq!(session.reachability(), Some(ReachabilityState::Reachable));
}

#[tokio::test]
async fn reachability_watch_follows_transitions() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let (source, probes) = Manual::new();
    let session = DmsSession::with_source("ABC123", config(&server.uri(), &dir), &source).unwrap();
    let mut state = session.reachability_watch();
    assert_eq!(*state.borrow(), None);

    probes.send(ReachabilityState::Reachable).unwrap();
    tokio::time::timeout(
        Duration::from_secs(5),
        state.wait_for(|s| *s == Some(ReachabilityState::Reachable)),
    )
    .await
    .expect("timed out waiting for reachability")
    .unwrap();

    probes.send(ReachabilityState::Unreachable).unwrap();
    tokio::time::timeout(
        Duration::from_secs(5),
        state.wait_for(|s| *s == Some(ReachabilityState::Unreachable)),
    )
    .await
    .expect("timed out waiting for reachability")
    .unwrap();
}

#[tokio::test]
async fn firmware_list_watch_sees_each_retrieval() {
    let (server, _dir, session) = setup().await;
    mount_catalog(&server).await;
    let mut lists = session.firmware_list_watch();
    assert!(lists.borrow_and_update().is_empty());

    let list = session.retrieve_available_versions().await.unwrap();

    assert!(lists.has_changed().unwrap());
    assert!(lists.borrow_and_update().ptr_eq(&list));
}

#[tokio::test]
async fn operations_do_not_wait_for_reachability() {
    let (server, _dir, session) = setup().await;
    mount_catalog(&server).await;

    // Reachability is still unknown; the call goes out regardless.
    assert_eq!(session.reachability(), None);
    session.retrieve_available_versions().await.unwrap();
}

#[tokio::test]
async fn event_stream_ends_when_session_is_dropped() {
    let (server, _dir, session) = setup().await;
    mount_catalog(&server).await;
    let mut stream = session.events();

    session.retrieve_available_versions().await.unwrap();
    drop(session);

    let first = stream.next().await;
    assert!(matches!(first, Some(SessionEvent::NewFirmwareList(_))));
    let end = tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .unwrap();
    assert_eq!(end, None);
}

#[tokio::test]
async fn invalid_device_id_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let result = DmsSession::with_source("", config("https://dms.example.com", &dir), &Silent);
    assert!(matches!(result, Err(CoreError::InvalidArgument { .. })));
}

// ── Install reporting ───────────────────────────────────────────────

#[tokio::test]
async fn install_report_is_sent_in_background() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    Mock::given(method("POST"))
        .and(path("/v1/installations"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    DmsSession::report_installation_result(&config(&server.uri(), &dir), "device-uuid", "bgx13p.1.2.0");

    let received = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let requests = server.received_requests().await.unwrap();
            if !requests.is_empty() {
                return requests;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .unwrap();

    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(body["device_uuid"], "device-uuid");
    assert_eq!(body["bundle_id"], "bgx13p.1.2.0");
}

#[tokio::test]
async fn install_report_failure_is_swallowed() {
    let dir = tempfile::tempdir().unwrap();
    // Nothing listening: the report fails in the background and the caller
    // never hears about it.
    DmsSession::report_installation_result(&config(&dead_url().await, &dir), "uuid", "bundle");
    tokio::time::sleep(Duration::from_millis(50)).await;
}

#[tokio::test]
async fn awaited_report_surfaces_rejection() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    Mock::given(method("POST"))
        .and(path("/v1/installations"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({ "error": "unknown bundle" })))
        .mount(&server)
        .await;

    let reporter = InstallReporter::new(&config(&server.uri(), &dir)).unwrap();
    let result = reporter.send("device-uuid", "nope").await;

    assert!(
        matches!(result, Err(CoreError::Service { status: 422, ref message }) if message == "unknown bundle"),
        "expected Service error, got: {result:?}"
    );
}
