//! [`HttpCoordinationClient`] against a local HTTP server.

use hyper::{
    service::{make_service_fn, service_fn},
    Body, Method, Request, Response, Server, StatusCode,
};
use std::{
    convert::Infallible,
    net::SocketAddr,
    str::FromStr,
    sync::{Arc, Mutex},
};
use tss_wallet::types::{
    party::{Direction, Role},
    tx_request::{SignatureShareRecord, TxRequestId, WalletId},
};
use tss_wallet_client::{
    config::{Config, ConfigFile},
    HttpCoordinationClient, RemoteCoordinationClient, TransportError,
};

#[derive(Debug, Clone)]
struct Received {
    method: Method,
    path_and_query: String,
    authorization: Option<String>,
    body: String,
}

/// Serve `status` with `body` for every request and record what arrives.
async fn serve(status: StatusCode, body: &'static str) -> (SocketAddr, Arc<Mutex<Vec<Received>>>) {
    let received = Arc::new(Mutex::new(Vec::new()));
    let log = received.clone();

    let make_service = make_service_fn(move |_conn| {
        let log = log.clone();
        async move {
            Ok::<_, Infallible>(service_fn(move |request: Request<Body>| {
                let log = log.clone();
                async move {
                    let method = request.method().clone();
                    let path_and_query = request
                        .uri()
                        .path_and_query()
                        .map(|pq| pq.to_string())
                        .unwrap_or_default();
                    let authorization = request
                        .headers()
                        .get(hyper::header::AUTHORIZATION)
                        .map(|value| value.to_str().unwrap().to_string());
                    let bytes = hyper::body::to_bytes(request.into_body()).await.unwrap();
                    log.lock().unwrap().push(Received {
                        method,
                        path_and_query,
                        authorization,
                        body: String::from_utf8(bytes.to_vec()).unwrap(),
                    });

                    let response = Response::builder()
                        .status(status)
                        .header(hyper::header::CONTENT_TYPE, "application/json")
                        .body(Body::from(body))
                        .unwrap();
                    Ok::<_, Infallible>(response)
                }
            }))
        }
    });

    let server = Server::bind(&SocketAddr::from(([127, 0, 0, 1], 0))).serve(make_service);
    let addr = server.local_addr();
    let _ = tokio::spawn(server);
    (addr, received)
}

fn client(addr: SocketAddr) -> HttpCoordinationClient {
    let config_file = ConfigFile::from_str(&format!(
        r#"
        server_uri = "http://{addr}"
        coin = "tsol"
        wallet_id = "wallet"

        [logging]
        stdout_log_level = "info"
        "#
    ))
    .unwrap();
    let config = Config::from_config_file(config_file, Some("secret-token".to_string())).unwrap();
    HttpCoordinationClient::new(&config)
}

#[tokio::test]
async fn failure_status_carries_service_message() {
    let (addr, _) = serve(StatusCode::BAD_REQUEST, r#"{"error":"some error"}"#).await;

    let record = SignatureShareRecord::new(Direction::UserToBitgo, "00".to_string());
    let result = client(addr)
        .post_signature_share(
            &WalletId::from("wallet"),
            &TxRequestId::from("randomId"),
            &record,
        )
        .await;

    assert!(matches!(
        result,
        Err(TransportError::Status { status: 400, message }) if message == "some error"
    ));
}

#[tokio::test]
async fn failure_without_error_field_keeps_raw_body() {
    let (addr, _) = serve(StatusCode::SERVICE_UNAVAILABLE, "maintenance").await;

    let result = client(addr).get_constants().await;
    assert!(matches!(
        result,
        Err(TransportError::Status { status: 503, message }) if message == "maintenance"
    ));
}

#[tokio::test]
async fn tx_request_lookup_uses_latest_query() {
    let (addr, received) = serve(
        StatusCode::OK,
        r#"{"txRequests":[{"txRequestId":"randomId","unsignedTxs":[{"signableHex":"deadbeef","serializedTxHex":"ababfefe"}]}]}"#,
    )
    .await;

    let list = client(addr)
        .get_tx_requests(&WalletId::from("wallet"), &TxRequestId::from("randomId"), true)
        .await
        .unwrap();
    assert_eq!(list.tx_requests[0].unsigned_txs[0].signable_hex, "deadbeef");

    let received = received.lock().unwrap();
    assert_eq!(received[0].method, Method::GET);
    assert_eq!(
        received[0].path_and_query,
        "/api/v2/wallet/wallet/txrequests?txRequestIds=randomId&latest=true"
    );
    assert_eq!(
        received[0].authorization.as_deref(),
        Some("Bearer secret-token")
    );
}

#[tokio::test]
async fn reserved_characters_in_ids_are_encoded() {
    let (addr, received) = serve(StatusCode::OK, r#"{"txRequests":[]}"#).await;
    let client = client(addr);
    let wallet_id = WalletId::from("wallet/1");
    let tx_request_id = TxRequestId::from("a&latest=false #b");

    let _ = client
        .get_tx_requests(&wallet_id, &tx_request_id, true)
        .await
        .unwrap();
    let record = SignatureShareRecord::new(Direction::UserToBitgo, "abcd".to_string());
    let _ = client
        .post_signature_share(&wallet_id, &tx_request_id, &record)
        .await;

    let received = received.lock().unwrap();
    assert_eq!(
        received[0].path_and_query,
        "/api/v2/wallet/wallet%2F1/txrequests?txRequestIds=a%26latest%3Dfalse+%23b&latest=true"
    );
    assert_eq!(
        received[1].path_and_query,
        "/api/v2/wallet/wallet%2F1/txrequests/a&latest=false%20%23b/signatureshares"
    );
}

#[tokio::test]
async fn signature_share_is_posted_as_json() {
    let (addr, received) = serve(
        StatusCode::OK,
        r#"{"from":"user","to":"bitgo","share":"abcd"}"#,
    )
    .await;

    let record = SignatureShareRecord::new(Direction::UserToBitgo, "abcd".to_string());
    let stored = client(addr)
        .post_signature_share(
            &WalletId::from("wallet"),
            &TxRequestId::from("randomId"),
            &record,
        )
        .await
        .unwrap();
    assert_eq!(stored.from, Role::User);
    assert_eq!(stored, record);

    let received = received.lock().unwrap();
    assert_eq!(received[0].method, Method::POST);
    assert_eq!(
        received[0].path_and_query,
        "/api/v2/wallet/wallet/txrequests/randomId/signatureshares"
    );
    let body: serde_json::Value = serde_json::from_str(&received[0].body).unwrap();
    assert_eq!(
        body,
        serde_json::json!({"from": "user", "to": "bitgo", "share": "abcd"})
    );
}

#[tokio::test]
async fn tx_send_posts_request_id() {
    let (addr, received) = serve(StatusCode::OK, "{}").await;

    client(addr)
        .post_tx_send("tsol", &WalletId::from("wallet"), &TxRequestId::from("randomId"))
        .await
        .unwrap();

    let received = received.lock().unwrap();
    assert_eq!(
        received[0].path_and_query,
        "/api/v2/tsol/wallet/wallet/tx/send"
    );
    assert_eq!(received[0].body, r#"{"txRequestId":"randomId"}"#);
}

#[tokio::test]
async fn constants_expose_bitgo_public_key() {
    let (addr, received) = serve(
        StatusCode::OK,
        r#"{"ttl":3600,"constants":{"tss":{"bitgoPublicKey":"armored"}}}"#,
    )
    .await;

    let constants = client(addr).get_constants().await.unwrap();
    assert_eq!(constants.tss.bitgo_public_key, "armored");
    assert_eq!(
        received.lock().unwrap()[0].path_and_query,
        "/api/v1/client/constants"
    );
}
