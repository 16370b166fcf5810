//! Read path: synchronous round-robin proxying.

use std::time::Duration;

use axum::http::StatusCode;

mod common;

#[tokio::test]
async fn sequential_gets_alternate_starting_with_second_backend() {
    let a = common::start_mock_backend("a").await;
    let b = common::start_mock_backend("b").await;
    let balancer = common::start_balancer(vec![a.url(), b.url()], |_| {}).await;
    let client = common::client();

    let mut order = Vec::new();
    for _ in 0..3 {
        let res = client
            .get(balancer.url("/payments-summary"))
            .send()
            .await
            .expect("balancer unreachable");
        assert_eq!(res.status(), StatusCode::OK);
        order.push(res.text().await.unwrap());
    }

    assert_eq!(order, vec!["b", "a", "b"]);
    balancer.shutdown.trigger();
}

#[tokio::test]
async fn backend_response_relayed_verbatim() {
    let mut backend =
        common::start_programmable_backend("ok", || async { (200, "ok".to_string()) }).await;
    let balancer = common::start_balancer(vec![backend.url()], |_| {}).await;

    let res = common::client()
        .get(balancer.url("/payments-summary?from=2025-01-01&to=2025-01-02"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-backend"], "ok");
    assert_eq!(res.text().await.unwrap(), "ok");

    let seen = backend.next_request(Duration::from_secs(1)).await.unwrap();
    assert_eq!(seen.method, "GET");
    assert_eq!(seen.path_and_query, "/payments-summary?from=2025-01-01&to=2025-01-02");
    // The client's Host header is forwarded, not rewritten to the backend's.
    assert_eq!(seen.host.as_deref(), Some(balancer.addr.to_string().as_str()));

    balancer.shutdown.trigger();
}

#[tokio::test]
async fn error_status_relayed_verbatim() {
    let backend = common::start_programmable_backend("broken", || async {
        (500, "backend exploded".to_string())
    })
    .await;
    let balancer = common::start_balancer(vec![backend.url()], |_| {}).await;

    let res = common::client()
        .get(balancer.url("/payments-summary"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.text().await.unwrap(), "backend exploded");
    balancer.shutdown.trigger();
}

#[tokio::test]
async fn unreachable_backend_yields_bad_gateway() {
    let dead = common::unreachable_addr().await;
    let live = common::start_mock_backend("live").await;
    // Index 1 (dead) is selected first, then index 0 (live).
    let balancer =
        common::start_balancer(vec![live.url(), format!("http://{dead}")], |_| {}).await;
    let client = common::client();

    let first = client.get(balancer.url("/payments-summary")).send().await.unwrap();
    assert_eq!(first.status(), StatusCode::BAD_GATEWAY);

    let second = client.get(balancer.url("/payments-summary")).send().await.unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(second.text().await.unwrap(), "live");

    balancer.shutdown.trigger();
}

#[tokio::test]
async fn slow_backend_hits_write_timeout() {
    let backend = common::start_programmable_backend("slow", || async {
        tokio::time::sleep(Duration::from_secs(3)).await;
        (200, "late".to_string())
    })
    .await;
    let balancer = common::start_balancer(vec![backend.url()], |config| {
        config.listener.write_timeout_secs = 1;
    })
    .await;

    let res = common::client()
        .get(balancer.url("/payments-summary"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::REQUEST_TIMEOUT);
    balancer.shutdown.trigger();
}

#[tokio::test]
async fn unknown_routes_and_methods_rejected() {
    let backend = common::start_mock_backend("a").await;
    let balancer = common::start_balancer(vec![backend.url()], |_| {}).await;
    let client = common::client();

    let missing = client.get(balancer.url("/nope")).send().await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let wrong_method = client.post(balancer.url("/payments-summary")).send().await.unwrap();
    assert_eq!(wrong_method.status(), StatusCode::METHOD_NOT_ALLOWED);

    balancer.shutdown.trigger();
}
