//! Supervising real HTTP listeners.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use service_supervisor::{
    run, run_with_context, CancellationToken, HttpService, Options, Phase, Service,
};

mod common;

use common::{services, Counted, RecordingSink};

const KEY_WORD: &str = "pong";

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

fn slow_router(delay: Duration) -> Router {
    Router::new().route(
        "/",
        get(move || async move {
            tokio::time::sleep(delay).await;
            KEY_WORD
        }),
    )
}

#[tokio::test]
async fn test_serves_until_cancelled() {
    let addr: SocketAddr = "127.0.0.1:28301".parse().unwrap();
    let service = HttpService::fixed_response("ping", addr, KEY_WORD, Duration::from_secs(5));

    let parent = CancellationToken::new();
    let run = tokio::spawn(run_with_context(
        parent.clone(),
        services([Arc::new(service)]),
        Options::new().shutdown_timeout(Duration::from_secs(1)),
    ));

    tokio::time::sleep(Duration::from_millis(300)).await;

    let body = client()
        .get(format!("http://{addr}"))
        .send()
        .await
        .expect("listener unreachable")
        .text()
        .await
        .unwrap();
    assert_eq!(body, KEY_WORD);

    parent.cancel();
    assert!(run.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_address_in_use_stops_the_other_listener() {
    let addr: SocketAddr = "127.0.0.1:28302".parse().unwrap();
    let first = Arc::new(Counted::new(HttpService::fixed_response(
        "first",
        addr,
        KEY_WORD,
        Duration::from_secs(5),
    )));
    let second = Arc::new(Counted::new(HttpService::fixed_response(
        "second",
        addr,
        KEY_WORD,
        Duration::from_secs(5),
    )));
    let sink = Arc::new(RecordingSink::default());

    let err = run(
        services([first.clone(), second.clone()]),
        Options::new()
            .shutdown_timeout(Duration::from_secs(1))
            .sink(sink.clone()),
    )
    .await
    .unwrap_err();

    assert_eq!(err.phase(), Phase::Serve);
    let io = err.downcast_ref::<std::io::Error>().expect("bind error");
    assert_eq!(io.kind(), std::io::ErrorKind::AddrInUse);

    // Whichever listener bound first is shut down exactly once; the loser never is.
    let (winner, loser) = if err.service() == "second" {
        (&first, &second)
    } else {
        (&second, &first)
    };
    assert_eq!(winner.shutdown_calls(), 1);
    assert_eq!(loser.shutdown_calls(), 0);
    assert!(winner.inner().local_addr().is_some());
    assert!(!sink.events_for(err.service()).is_empty());
}

#[tokio::test]
async fn test_graceful_shutdown_drains_in_flight_request() {
    let addr: SocketAddr = "127.0.0.1:28303".parse().unwrap();
    let service = HttpService::new("drain", addr, slow_router(Duration::from_secs(2)));

    let parent = CancellationToken::new();
    let run = tokio::spawn(run_with_context(
        parent.clone(),
        services([Arc::new(service)]),
        Options::new().shutdown_timeout(Duration::from_secs(8)),
    ));

    tokio::time::sleep(Duration::from_millis(300)).await;

    let in_flight = tokio::spawn(async move {
        client()
            .get(format!("http://{addr}"))
            .send()
            .await?
            .text()
            .await
    });

    tokio::time::sleep(Duration::from_millis(500)).await;
    parent.cancel();

    assert!(run.await.unwrap().is_ok());
    assert_eq!(in_flight.await.unwrap().unwrap(), KEY_WORD);

    let refused = client().get(format!("http://{addr}")).send().await;
    assert!(refused.is_err(), "listener must be closed after shutdown");
}

#[tokio::test]
async fn test_drain_past_timeout_is_deadline_exceeded() {
    let addr: SocketAddr = "127.0.0.1:28304".parse().unwrap();
    let service = HttpService::new("stuck", addr, slow_router(Duration::from_secs(3)));

    let parent = CancellationToken::new();
    let run = tokio::spawn(run_with_context(
        parent.clone(),
        services([Arc::new(service)]),
        Options::new().shutdown_timeout(Duration::from_secs(1)),
    ));

    tokio::time::sleep(Duration::from_millis(300)).await;

    let in_flight =
        tokio::spawn(async move { client().get(format!("http://{addr}")).send().await });

    tokio::time::sleep(Duration::from_millis(300)).await;
    parent.cancel();

    let err = run.await.unwrap().unwrap_err();
    assert_eq!(err.service(), "stuck");
    assert_eq!(err.phase(), Phase::Shutdown);
    assert!(err.is_deadline_exceeded());

    // The detached server still finishes the request after the run returned.
    let _ = in_flight.await;
}

#[tokio::test]
async fn test_services_listen_concurrently() {
    let addrs: Vec<SocketAddr> = (28305..28308)
        .map(|port| format!("127.0.0.1:{port}").parse().unwrap())
        .collect();
    let list: Vec<Arc<dyn Service>> = addrs
        .iter()
        .enumerate()
        .map(|(i, addr)| {
            Arc::new(HttpService::fixed_response(
                format!("svc-{i}"),
                *addr,
                KEY_WORD,
                Duration::from_secs(5),
            )) as Arc<dyn Service>
        })
        .collect();

    let parent = CancellationToken::new();
    let run = tokio::spawn(run_with_context(parent.clone(), list, Options::new()));

    tokio::time::sleep(Duration::from_millis(300)).await;
    for addr in &addrs {
        let res = client().get(format!("http://{addr}/health")).send().await.unwrap();
        assert_eq!(res.status(), 200);
    }

    parent.cancel();
    assert!(run.await.unwrap().is_ok());
}
