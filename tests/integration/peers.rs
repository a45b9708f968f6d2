use serde_json::json;

use crate::*;

#[tokio::test]
async fn test_announce_then_get_peers() {
    let node = spawn_node().await.unwrap();

    // chunk 3 lives in byte 0, bit 3
    let body = node.announce("A", "M", "08").await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["peerId"], "A");
    assert_eq!(body["ttl"], 300);

    let (status, body) = node
        .post("/peers", json!({ "manifestId": "M", "neededChunks": [3] }), None)
        .await
        .unwrap();
    assert_eq!(status, 200);
    assert_eq!(body["count"], 1);
    let peer = &body["peers"][0];
    assert_eq!(peer["peerId"], "A");
    assert_eq!(peer["chunkBitfield"], "08");
    assert_eq!(peer["hasNeeded"], true);
    assert!(peer["score"].as_f64().unwrap() >= 100.0, "score too low: {peer}");
}

#[tokio::test]
async fn test_empty_manifest_returns_no_peers() {
    let node = spawn_node().await.unwrap();
    let (status, body) = node
        .post("/peers", json!({ "manifestId": "nobody", "neededChunks": [0] }), None)
        .await
        .unwrap();
    assert_eq!(status, 200);
    assert_eq!(body, json!({ "peers": [], "count": 0 }));
}

#[tokio::test]
async fn test_peers_ranked_and_excluded() {
    let node = spawn_node().await.unwrap();
    node.announce("useful", "M", "02").await.unwrap();
    node.announce("useless", "M", "04").await.unwrap();
    node.announce("me", "M", "02").await.unwrap();

    let (_, body) = node
        .post(
            "/peers",
            json!({ "manifestId": "M", "neededChunks": [1], "excludePeers": ["me"] }),
            None,
        )
        .await
        .unwrap();
    let ids: Vec<&str> = body["peers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["peerId"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["useful", "useless"]);
    assert_eq!(body["peers"][1]["hasNeeded"], false);
}

#[tokio::test]
async fn test_base64_bitfield_accepted() {
    let node = spawn_node().await.unwrap();
    // "CA==" is the single byte 0x08
    node.announce("A", "M", "CA==").await.unwrap();
    let (_, body) = node
        .post("/peers", json!({ "manifestId": "M", "neededChunks": [3] }), None)
        .await
        .unwrap();
    assert_eq!(body["peers"][0]["chunkBitfield"], "08");
}

#[tokio::test]
async fn test_reannounce_does_not_duplicate() {
    let node = spawn_node().await.unwrap();
    node.announce("A", "M", "01").await.unwrap();
    node.announce("A", "M", "03").await.unwrap();

    let (_, body) = node
        .post("/peers", json!({ "manifestId": "M", "neededChunks": [1] }), None)
        .await
        .unwrap();
    assert_eq!(body["count"], 1);
    assert_eq!(body["peers"][0]["chunkBitfield"], "03");
}

#[tokio::test]
async fn test_announce_validation() {
    let node = spawn_node().await.unwrap();
    let cases = [
        json!({ "manifestId": "M", "chunkBitfield": "01" }),
        json!({ "clientId": "A", "chunkBitfield": "01" }),
        json!({ "clientId": "A", "manifestId": "M" }),
        json!({ "clientId": "A", "manifestId": "M", "chunkBitfield": "not a bitfield!" }),
        json!({ "clientId": "", "manifestId": "M", "chunkBitfield": "01" }),
    ];
    for case in cases {
        let (status, body) = node.post("/announce", case.clone(), None).await.unwrap();
        assert_eq!(status, 400, "expected 400 for {case}");
        assert!(body["error"].is_string(), "missing error for {case}: {body}");
    }

    let (status, _) = node
        .post("/peers", json!({ "manifestId": "M" }), None)
        .await
        .unwrap();
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let node = spawn_node().await.unwrap();
    let resp = reqwest::Client::new()
        .post(format!("{}/api/announce", node.base))
        .header("Content-Type", "application/json")
        .body("{ not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
}

#[tokio::test]
async fn test_complete_marks_peer() {
    let node = spawn_node().await.unwrap();
    node.announce("A", "M", "01").await.unwrap();

    let (_, peers) = node
        .post("/peers", json!({ "manifestId": "M", "neededChunks": [0] }), None)
        .await
        .unwrap();
    let before = peers["peers"][0]["score"].as_f64().unwrap();

    let (status, body) = node
        .post("/complete", json!({ "clientId": "A", "manifestId": "M" }), None)
        .await
        .unwrap();
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);

    // completion adds 20 points to the peer's score
    let (_, after) = node
        .post("/peers", json!({ "manifestId": "M", "neededChunks": [0] }), None)
        .await
        .unwrap();
    let peer = &after["peers"][0];
    assert_eq!(peer["peerId"], "A");
    let score = peer["score"].as_f64().unwrap();
    assert!((score - (before + 20.0)).abs() < 1e-9, "before {before}, after {score}");
}

#[tokio::test]
async fn test_complete_unknown_peer_is_404() {
    let node = spawn_node().await.unwrap();
    let (status, body) = node
        .post("/complete", json!({ "clientId": "ghost", "manifestId": "M" }), None)
        .await
        .unwrap();
    assert_eq!(status, 404);
    assert!(body["error"].is_string());
}
