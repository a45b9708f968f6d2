use serde_json::json;

use crate::*;

#[tokio::test]
async fn test_offer_delivered_exactly_once() {
    let node = spawn_node().await.unwrap();

    let (status, body) = node
        .post(
            "/signal",
            json!({ "type": "offer", "to": "B", "payload": { "sdp": "v=0" } }),
            Some("A"),
        )
        .await
        .unwrap();
    assert_eq!(status, 200, "signal failed: {body}");
    assert_eq!(body["success"], true);

    let (status, body) = node.get("/api/signals?clientId=B", None).await.unwrap();
    assert_eq!(status, 200);
    let signals = body["signals"].as_array().unwrap();
    assert_eq!(signals.len(), 1);
    assert_eq!(signals[0]["type"], "offer");
    assert_eq!(signals[0]["from"], "A");
    assert_eq!(signals[0]["to"], "B");
    assert_eq!(signals[0]["payload"], json!({ "sdp": "v=0" }));

    let (_, body) = node.get("/api/signals?clientId=B", None).await.unwrap();
    assert_eq!(body["signals"], json!([]));
}

#[tokio::test]
async fn test_two_senders_both_delivered_in_order() {
    let node = spawn_node().await.unwrap();
    for (from, kind) in [("A", "offer"), ("B", "offer"), ("A", "ice-candidate")] {
        let (status, _) = node
            .post("/signal", json!({ "type": kind, "to": "C", "payload": from }), Some(from))
            .await
            .unwrap();
        assert_eq!(status, 200);
    }

    // identity header works as the recipient too
    let (_, body) = node.get("/api/signals", Some("C")).await.unwrap();
    let got: Vec<(&str, &str)> = body["signals"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| (s["from"].as_str().unwrap(), s["type"].as_str().unwrap()))
        .collect();
    assert_eq!(got, vec![("A", "offer"), ("B", "offer"), ("A", "ice-candidate")]);
}

#[tokio::test]
async fn test_signal_validation() {
    let node = spawn_node().await.unwrap();

    let bad = [
        (json!({ "type": "bogus", "to": "B", "payload": 1 }), Some("A")),
        (json!({ "to": "B", "payload": 1 }), Some("A")),
        (json!({ "type": "offer", "payload": 1 }), Some("A")),
        (json!({ "type": "offer", "to": "B" }), Some("A")),
        (json!({ "type": "offer", "to": "A", "payload": 1 }), Some("A")),
        (json!({ "type": "offer", "to": "B", "payload": 1 }), None),
    ];
    for (body, from) in bad {
        let (status, resp) = node.post("/signal", body.clone(), from).await.unwrap();
        assert_eq!(status, 400, "expected 400 for {body} from {from:?}");
        assert!(resp["error"].is_string());
    }

    let (_, body) = node.get("/api/signals?clientId=B", None).await.unwrap();
    assert_eq!(body["signals"], json!([]));
}

#[tokio::test]
async fn test_poll_without_identity_is_400() {
    let node = spawn_node().await.unwrap();
    let (status, _) = node.get("/api/signals", None).await.unwrap();
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_poll_cannot_drain_another_identity() {
    let node = spawn_node().await.unwrap();
    node.post("/signal", json!({ "type": "offer", "to": "B", "payload": 1 }), Some("A"))
        .await
        .unwrap();

    let (status, body) = node.get("/api/signals?clientId=B", Some("C")).await.unwrap();
    assert_eq!(status, 400);
    assert!(body["error"].is_string());

    // matching query and header is fine, and B's message was not consumed
    let (status, body) = node.get("/api/signals?clientId=B", Some("B")).await.unwrap();
    assert_eq!(status, 200);
    assert_eq!(body["signals"].as_array().unwrap().len(), 1);
}
