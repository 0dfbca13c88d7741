//! Prefix routing, path rewrite and header handling through a live edge.

mod common;

use common::{echoed, rewritten, route, start_echo_backend, start_edge};

#[tokio::test]
async fn identity_rewrite_forwards_path_unchanged() {
    let backend = start_echo_backend().await;
    let edge = start_edge(vec![rewritten("/api/", backend, "^/api", "/api")]).await;

    let res = common::client()
        .get(edge.url("/api/orders/42?expand=fills&page=2"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let body = res.text().await.unwrap();
    assert_eq!(echoed(&body, "line"), "GET /api/orders/42?expand=fills&page=2 HTTP/1.1");
}

#[tokio::test]
async fn empty_replacement_strips_prefix() {
    let backend = start_echo_backend().await;
    let edge = start_edge(vec![rewritten("/api/", backend, "^/api", "")]).await;

    let body = common::client()
        .get(edge.url("/api/users?active=true"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert_eq!(echoed(&body, "line"), "GET /users?active=true HTTP/1.1");
}

#[tokio::test]
async fn change_origin_controls_host_header() {
    let backend = start_echo_backend().await;
    let mut keep_host = route("/legacy/", backend);
    keep_host.change_origin = false;
    let edge = start_edge(vec![route("/api/", backend), keep_host]).await;
    let client = common::client();

    let rewritten_host = client.get(edge.url("/api/ping")).send().await.unwrap().text().await.unwrap();
    assert_eq!(echoed(&rewritten_host, "host"), backend.to_string());

    let original_host = client.get(edge.url("/legacy/ping")).send().await.unwrap().text().await.unwrap();
    assert_eq!(echoed(&original_host, "host"), edge.addr.to_string());
}

#[tokio::test]
async fn request_body_and_method_are_forwarded() {
    let backend = start_echo_backend().await;
    let edge = start_edge(vec![route("/api/", backend)]).await;

    let res = common::client()
        .post(edge.url("/api/orders"))
        .header("content-type", "application/json")
        .body(r#"{"symbol":"BTC-USD","qty":5}"#)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let body = res.text().await.unwrap();
    assert_eq!(echoed(&body, "line"), "POST /api/orders HTTP/1.1");
    assert_eq!(echoed(&body, "body"), r#"{"symbol":"BTC-USD","qty":5}"#);
}

#[tokio::test]
async fn forwarding_headers_are_added_and_hop_headers_dropped() {
    let backend = start_echo_backend().await;
    let edge = start_edge(vec![route("/api/", backend)]).await;

    let res = common::client()
        .get(edge.url("/api/session"))
        .header("connection", "x-trace-hop")
        .header("x-trace-hop", "secret")
        .send()
        .await
        .unwrap();

    assert!(res.headers().contains_key("x-request-id"));
    assert!(!res.headers().contains_key("keep-alive"));
    let body = res.text().await.unwrap();
    assert_eq!(echoed(&body, "x-forwarded-for"), "127.0.0.1");
    assert!(!echoed(&body, "connection").contains("x-trace-hop"));
}

#[tokio::test]
async fn upstream_status_is_passed_through() {
    let backend = start_echo_backend().await;
    let edge = start_edge(vec![route("/api/", backend)]).await;

    let res = common::client().get(edge.url("/api/status/404")).send().await.unwrap();

    // An upstream 404 stays a 404; it never turns into the SPA entry document.
    assert_eq!(res.status(), 404);
    let body = res.text().await.unwrap();
    assert_eq!(echoed(&body, "line"), "GET /api/status/404 HTTP/1.1");
}

#[tokio::test]
async fn prefix_match_is_literal() {
    let backend = start_echo_backend().await;
    let edge = start_edge(vec![route("/api/", backend)]).await;

    let res = common::client().get(edge.url("/apiary")).send().await.unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), common::INDEX_HTML);
}
