use serde_json::json;

use crate::*;

#[tokio::test]
async fn test_health_ok_at_both_paths() {
    let node = spawn_node().await.unwrap();
    for path in ["/health", "/api/health"] {
        let (status, body) = node.get(path, None).await.unwrap();
        assert_eq!(status, 200);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["storeStatus"], "connected");
        assert!(body["timestamp"].as_u64().unwrap() > 0);
    }
}

#[tokio::test]
async fn test_store_outage_degrades_service() {
    let node = spawn_node().await.unwrap();
    node.store.simulate_outage(true);

    let (status, body) = node.get("/health", None).await.unwrap();
    assert_eq!(status, 503);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["storeStatus"], "disconnected");

    let (status, body) = node
        .post(
            "/announce",
            json!({ "clientId": "A", "manifestId": "M", "chunkBitfield": "01" }),
            None,
        )
        .await
        .unwrap();
    assert_eq!(status, 503);
    assert_eq!(body["error"], "service temporarily unavailable");

    node.store.simulate_outage(false);
    let (status, _) = node.get("/health", None).await.unwrap();
    assert_eq!(status, 200);
}

#[tokio::test]
async fn test_metrics_counts_peers() {
    let node = spawn_node().await.unwrap();
    node.announce("A", "M1", "01").await.unwrap();
    node.announce("B", "M1", "01").await.unwrap();
    node.announce("C", "M2", "01").await.unwrap();

    let (status, text) = node.get_text("/metrics", None).await.unwrap();
    assert_eq!(status, 200);
    assert!(text.contains("beacon_active_manifests 2\n"), "{text}");
    assert!(text.contains("beacon_active_peers 3\n"), "{text}");
    assert!(text.contains("# TYPE beacon_uptime_seconds gauge"), "{text}");
}

#[tokio::test]
async fn test_turn_credentials_unconfigured_is_503() {
    let node = spawn_node().await.unwrap();
    let (status, body) = node
        .get("/api/turn-credentials", Some("alice"))
        .await
        .unwrap();
    assert_eq!(status, 503);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_turn_credentials_issued() {
    let mut config = BeaconConfig::default();
    config.turn.secret = Some("turn-secret".into());
    config.turn.uris = vec!["turn:turn.example:3478".into()];
    let node = spawn_node_with(config).await.unwrap();

    let (status, body) = node
        .get("/api/turn-credentials", Some("alice"))
        .await
        .unwrap();
    assert_eq!(status, 200, "{body}");
    assert!(body["username"].as_str().unwrap().ends_with(":alice"));
    assert!(!body["password"].as_str().unwrap().is_empty());
    assert_eq!(body["ttl"], 86_400);
    assert_eq!(body["uris"], json!(["turn:turn.example:3478"]));

    let (status, _) = node.get("/api/turn-credentials", None).await.unwrap();
    assert_eq!(status, 400);
}
