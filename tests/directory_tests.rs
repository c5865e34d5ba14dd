use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use whispernet::api;
use whispernet::directory::{DirectoryClient, DirectoryStore, LivenessProber, TcpProbe};
use whispernet::WhisperError;

async fn start_directory(store: DirectoryStore) -> String {
    let server = axum::Server::try_bind(&"127.0.0.1:0".parse().unwrap())
        .unwrap()
        .serve(api::api(store).into_make_service());
    let addr = server.local_addr();
    tokio::spawn(server);
    addr.to_string()
}

fn client(directory: &str) -> DirectoryClient {
    DirectoryClient::new(directory, Duration::from_secs(2)).unwrap()
}

#[tokio::test]
async fn test_register_then_list_in_order() {
    let directory = start_directory(DirectoryStore::new()).await;
    let client = client(&directory);

    client.register("10.0.0.1:9000").await.unwrap();
    client.register("10.0.0.2:9000").await.unwrap();

    assert_eq!(
        client.list_peers().await.unwrap(),
        vec!["10.0.0.1:9000".to_string(), "10.0.0.2:9000".to_string()]
    );
}

#[tokio::test]
async fn test_empty_directory_lists_nothing() {
    let directory = start_directory(DirectoryStore::new()).await;

    assert!(client(&directory).list_peers().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_hello_without_addr_is_rejected() {
    let store = DirectoryStore::new();
    let directory = start_directory(store.clone()).await;

    let response = reqwest::Client::new()
        .post(format!("http://{}/hello", directory))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"]["type"], "api_error");
    assert!(store.is_empty().unwrap());
}

#[tokio::test]
async fn test_status_page_and_probes() {
    let store = DirectoryStore::new();
    store.register("10.0.0.1:9000").unwrap();
    let directory = start_directory(store).await;
    let http = reqwest::Client::new();

    let page = http
        .get(format!("http://{}/", directory))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("<li>10.0.0.1:9000</li>"));

    let health = http
        .get(format!("http://{}/health", directory))
        .send()
        .await
        .unwrap();
    assert_eq!(health.text().await.unwrap(), "OK");

    let about: serde_json::Value = http
        .get(format!("http://{}/about", directory))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(about["name"], "whispernet");

    let missing = http
        .get(format!("http://{}/nope", directory))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_prober_drops_unreachable_peer() {
    let live = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let live_addr = live.local_addr().unwrap().to_string();
    let dead_addr = {
        let l = TcpListener::bind("127.0.0.1:0").await.unwrap();
        l.local_addr().unwrap().to_string()
    };

    let store = DirectoryStore::new();
    let directory = start_directory(store.clone()).await;
    let client = client(&directory);
    client.register(&live_addr).await.unwrap();
    client.register(&dead_addr).await.unwrap();

    let prober = LivenessProber::new(
        store,
        Arc::new(TcpProbe::new(Duration::from_secs(1))),
        Duration::from_secs(5),
    );
    let report = prober.probe_once().await.unwrap();

    assert_eq!(report.probed, 2);
    assert_eq!(report.removed, vec![dead_addr]);
    assert_eq!(client.list_peers().await.unwrap(), vec![live_addr]);
}

#[tokio::test]
async fn test_unreachable_directory_reports_error() {
    let closed = {
        let l = TcpListener::bind("127.0.0.1:0").await.unwrap();
        l.local_addr().unwrap().to_string()
    };

    let result = client(&closed).list_peers().await;
    assert!(matches!(result, Err(WhisperError::Directory(_))));
}
