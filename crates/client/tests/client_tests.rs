use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use bytes::Bytes;
use futures::StreamExt;
use secrecy::SecretString;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use vitrine_client::{Error, TokenRefresher, VitrineClient};
use vitrine_core::{Code, Filter, LoginResponse, Memory, Status};
use vitrine_server::config::VitrineConfig;
use vitrine_server::state_factory::create_state;
use vitrine_store::testing::laptop;

struct TestServer {
    base_url: String,
    dir: TempDir,
    shutdown: CancellationToken,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Serve the full router on an ephemeral port.
async fn spawn_server() -> TestServer {
    let dir = tempfile::tempdir().unwrap();
    let mut config = VitrineConfig::default();
    config.attachments.dir = dir.path().join("img");
    config.auth.seed_demo_users = true;

    let shutdown = CancellationToken::new();
    let state = create_state(
        &config,
        &SecretString::new("client-test-secret".into()),
        shutdown.clone(),
    )
    .await
    .unwrap();
    let app = vitrine_server::api::router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let stop = shutdown.clone();
    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { stop.cancelled().await })
            .await
            .unwrap();
    });

    TestServer {
        base_url: format!("http://{addr}"),
        dir,
        shutdown,
    }
}

async fn admin_client(server: &TestServer) -> VitrineClient {
    let client = VitrineClient::new(&server.base_url).unwrap();
    client.login("admin1", "secret").await.unwrap();
    client
}

#[test]
fn builder_rejects_relative_urls() {
    let err = VitrineClient::new("localhost:8080").unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
}

#[tokio::test]
async fn health_check() {
    let server = spawn_server().await;
    let client = VitrineClient::new(&server.base_url).unwrap();
    assert!(client.health().await.unwrap());
}

#[tokio::test]
async fn login_stores_token() {
    let server = spawn_server().await;
    let client = VitrineClient::new(&server.base_url).unwrap();
    assert!(client.token().await.is_none());

    let resp = client.login("user1", "secret").await.unwrap();
    assert_eq!(client.token().await.as_deref(), Some(resp.access_token.as_str()));
    assert_eq!(resp.expires_in, 900);
}

#[tokio::test]
async fn bad_credentials_are_not_found() {
    let server = spawn_server().await;
    let client = VitrineClient::new(&server.base_url).unwrap();
    let err = client.login("admin1", "wrong").await.unwrap_err();
    assert_eq!(err.code(), Some(Code::NotFound));
    assert!(client.token().await.is_none());
}

#[tokio::test]
async fn guarded_call_without_login_is_unauthenticated() {
    let server = spawn_server().await;
    let client = VitrineClient::new(&server.base_url).unwrap();
    let err = client
        .create_record(&laptop("", 1000.0, 4, 2.0, Memory::gigabytes(8)))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(Code::Unauthenticated));
}

#[tokio::test]
async fn user_cannot_create_records() {
    let server = spawn_server().await;
    let client = VitrineClient::new(&server.base_url).unwrap();
    client.login("user1", "secret").await.unwrap();
    let err = client
        .create_record(&laptop("", 1000.0, 4, 2.0, Memory::gigabytes(8)))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(Code::PermissionDenied));
}

#[tokio::test]
async fn open_search_works_with_a_stale_token() {
    let server = spawn_server().await;
    let admin = admin_client(&server).await;
    admin
        .create_record(&laptop("", 1000.0, 4, 2.0, Memory::gigabytes(8)))
        .await
        .unwrap();

    // Open methods never carry the token, so a bad one does not matter.
    let client = VitrineClient::builder(&server.base_url)
        .token("garbage")
        .build()
        .unwrap();
    let records = client
        .search_records(&Filter::new())
        .await
        .unwrap()
        .collect_all()
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn create_then_search_by_filter() {
    let server = spawn_server().await;
    let client = admin_client(&server).await;

    let fast = client
        .create_record(&laptop("", 2500.0, 8, 3.2, Memory::gigabytes(32)))
        .await
        .unwrap();
    client
        .create_record(&laptop("", 800.0, 2, 1.8, Memory::gigabytes(4)))
        .await
        .unwrap();
    client
        .create_record(&laptop("", 5000.0, 16, 3.5, Memory::gigabytes(64)))
        .await
        .unwrap();

    let filter = Filter::new()
        .max_price_usd(3000.0)
        .min_cpu_cores(4)
        .min_cpu_ghz(2.5)
        .min_ram(Memory::gigabytes(8));
    let mut stream = client.search_records(&filter).await.unwrap();

    let mut ids = Vec::new();
    while let Some(record) = stream.next().await {
        ids.push(record.unwrap().id);
    }
    assert_eq!(ids, vec![fast]);
}

#[tokio::test]
async fn duplicate_record_is_already_exists() {
    let server = spawn_server().await;
    let client = admin_client(&server).await;
    let id = client
        .create_record(&laptop("", 1000.0, 4, 2.0, Memory::gigabytes(8)))
        .await
        .unwrap();

    let err = client
        .create_record(&laptop(&id, 1000.0, 4, 2.0, Memory::gigabytes(8)))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(Code::AlreadyExists));
}

#[tokio::test]
async fn upload_file_in_chunks() {
    let server = spawn_server().await;
    let client = admin_client(&server).await;
    let record_id = client
        .create_record(&laptop("", 1000.0, 4, 2.0, Memory::gigabytes(8)))
        .await
        .unwrap();

    let image = server.dir.path().join("laptop.jpg");
    let data: Vec<u8> = (0..5000u32).map(|i| (i % 251) as u8).collect();
    std::fs::write(&image, &data).unwrap();

    let resp = client.upload_file(&record_id, &image).await.unwrap();
    assert_eq!(resp.size, 5000);

    let stored = std::fs::read(
        server
            .dir
            .path()
            .join("img")
            .join(format!("{}.jpg", resp.id)),
    )
    .unwrap();
    assert_eq!(stored, data);
}

#[tokio::test]
async fn oversized_upload_is_invalid_argument() {
    let server = spawn_server().await;
    let client = admin_client(&server).await;
    let record_id = client
        .create_record(&laptop("", 1000.0, 4, 2.0, Memory::gigabytes(8)))
        .await
        .unwrap();

    let data = Bytes::from(vec![1u8; vitrine_core::MAX_ATTACHMENT_BYTES + 1]);
    let err = client
        .upload_attachment(&record_id, "image/png", data)
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(Code::InvalidArgument));
}

#[tokio::test]
async fn rate_records_returns_running_averages() {
    let server = spawn_server().await;
    let admin = admin_client(&server).await;
    let a = admin
        .create_record(&laptop("", 1000.0, 4, 2.0, Memory::gigabytes(8)))
        .await
        .unwrap();
    let b = admin
        .create_record(&laptop("", 1200.0, 4, 2.0, Memory::gigabytes(8)))
        .await
        .unwrap();

    let user = VitrineClient::new(&server.base_url).unwrap();
    user.login("user1", "secret").await.unwrap();

    let results = user
        .rate_records(vec![
            (a.clone(), 8.0),
            (b.clone(), 5.0),
            (a.clone(), 6.0),
        ])
        .await
        .unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].record_id, a);
    assert_eq!(results[0].rated_count, 1);
    assert_eq!(results[1].record_id, b);
    assert!((results[1].average_score - 5.0).abs() < f64::EPSILON);
    assert_eq!(results[2].rated_count, 2);
    assert!((results[2].average_score - 7.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn rating_session_streams_one_response_per_score() {
    let server = spawn_server().await;
    let admin = admin_client(&server).await;
    let id = admin
        .create_record(&laptop("", 1000.0, 4, 2.0, Memory::gigabytes(8)))
        .await
        .unwrap();

    let mut session = admin.open_rating_session().await;
    session.send(id.clone(), 10.0).await.unwrap();
    session.send(id.clone(), 4.0).await.unwrap();
    session.close_send();
    assert!(session.send(id.clone(), 1.0).await.is_err());

    let first = session.next().await.unwrap().unwrap();
    assert_eq!(first.rated_count, 1);
    let second = session.next().await.unwrap().unwrap();
    assert_eq!(second.rated_count, 2);
    assert!((second.average_score - 7.0).abs() < f64::EPSILON);
    assert!(session.next().await.is_none());
}

#[tokio::test]
async fn rating_session_accepts_more_scores_than_its_buffer_before_reading() {
    let server = spawn_server().await;
    let admin = admin_client(&server).await;
    let id = admin
        .create_record(&laptop("", 1000.0, 4, 2.0, Memory::gigabytes(8)))
        .await
        .unwrap();

    let mut session = admin.open_rating_session().await;
    tokio::time::timeout(Duration::from_secs(5), async {
        for _ in 0..20 {
            session.send(id.clone(), 5.0).await.unwrap();
        }
    })
    .await
    .expect("sending should not wait for a reader");
    session.close_send();

    let mut count = 0;
    while let Some(item) = session.next().await {
        count = item.unwrap().rated_count;
    }
    assert_eq!(count, 20);
}

#[tokio::test]
async fn rating_unknown_record_fails_the_session() {
    let server = spawn_server().await;
    let admin = admin_client(&server).await;

    let err = admin
        .rate_records(vec![(uuid_like(), 5.0)])
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(Code::InvalidArgument));
}

#[tokio::test]
async fn refresher_restores_the_token() {
    let server = spawn_server().await;
    let client = VitrineClient::new(&server.base_url).unwrap();

    let handle = TokenRefresher::new(client.clone(), "user1", SecretString::new("secret".into()))
        .with_interval(Duration::from_millis(50))
        .start()
        .await
        .unwrap();
    assert!(client.token().await.is_some());

    client.clear_token().await;
    let mut restored = false;
    for _ in 0..100 {
        tokio::time::sleep(Duration::from_millis(20)).await;
        if client.token().await.is_some() {
            restored = true;
            break;
        }
    }
    assert!(restored, "refresher did not log in again");

    handle.stop().await;
}

/// Login endpoint that fails its second call and succeeds otherwise,
/// recording when each call arrived.
#[derive(Clone, Default)]
struct FlakyLogin {
    calls: Arc<Mutex<Vec<Instant>>>,
}

async fn flaky_login(State(state): State<FlakyLogin>) -> Response {
    let call = {
        let mut calls = state.calls.lock().unwrap();
        calls.push(Instant::now());
        calls.len()
    };
    if call == 2 {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(Status::internal("identity store unavailable")),
        )
            .into_response();
    }
    Json(LoginResponse {
        access_token: format!("token-{call}"),
        expires_in: 900,
    })
    .into_response()
}

#[tokio::test]
async fn refresher_retries_quickly_after_a_failure() {
    let login = FlakyLogin::default();
    let app = Router::new()
        .route("/v1/auth/login", post(flaky_login))
        .with_state(login.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    let client = VitrineClient::new(&format!("http://{addr}")).unwrap();
    let handle = TokenRefresher::new(client.clone(), "user1", SecretString::new("secret".into()))
        .with_interval(Duration::from_millis(400))
        .with_retry_interval(Duration::from_millis(20))
        .start()
        .await
        .unwrap();

    for _ in 0..100 {
        tokio::time::sleep(Duration::from_millis(20)).await;
        if login.calls.lock().unwrap().len() >= 4 {
            break;
        }
    }
    handle.stop().await;

    let calls = login.calls.lock().unwrap().clone();
    assert!(calls.len() >= 4, "expected four logins, saw {}", calls.len());
    let retry_gap = calls[2] - calls[1];
    let next_gap = calls[3] - calls[2];
    assert!(retry_gap < Duration::from_millis(250), "retry took {retry_gap:?}");
    assert!(next_gap >= Duration::from_millis(390), "interval was {next_gap:?}");
    assert_eq!(client.token().await.as_deref(), Some("token-4"));
}

#[tokio::test]
async fn refresher_fails_fast_on_bad_credentials() {
    let server = spawn_server().await;
    let client = VitrineClient::new(&server.base_url).unwrap();

    let result = TokenRefresher::new(client, "user1", SecretString::new("nope".into()))
        .start()
        .await;
    assert!(matches!(result, Err(ref e) if e.code() == Some(Code::NotFound)));
}

fn uuid_like() -> String {
    "6f1c2d3e-4a5b-4c6d-8e7f-901234567890".to_owned()
}
