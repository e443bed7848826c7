use std::time::Duration;

use replykit_util::logging::{self, ConsoleTarget, LoggingOptions};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn debug_logging_forwards_only_application_events() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/log"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let log_dir = tempfile::tempdir().expect("tempdir");
    let options = LoggingOptions {
        console: ConsoleTarget::File(log_dir.path().join("replykit.log")),
        remote_endpoint: Some(Url::parse(&format!("{}/log", server.uri())).expect("endpoint")),
        default_filter: "debug".to_string(),
    };
    let worker = temp_env::with_var_unset("RUST_LOG", || logging::init(options))
        .expect("install subscriber")
        .expect("remote worker");
    tokio::spawn(worker.run());

    tracing::info!(target: "replykit::form", "single user event");
    tokio::time::sleep(Duration::from_secs(2)).await;

    let requests = server.received_requests().await.expect("recording enabled");
    let bodies: Vec<serde_json::Value> = requests
        .iter()
        .map(|request| serde_json::from_slice(&request.body).expect("json body"))
        .collect();
    assert_eq!(bodies.len(), 1, "forwarded records: {bodies:?}");
    assert_eq!(bodies[0]["level"], "info");
    assert!(
        bodies[0]["message"]
            .as_str()
            .is_some_and(|message| message.ends_with("single user event"))
    );
}
