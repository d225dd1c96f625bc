use std::time::Duration;

use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use service_registry::config::Config;
use service_registry::server;

fn local_config(grpc_port: u16, http_port: u16) -> Config {
    let mut config = Config::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.grpc_port = grpc_port;
    config.server.http_port = http_port;
    config
}

#[tokio::test]
async fn occupied_grpc_port_fails_startup() {
    let occupied = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = occupied.local_addr().unwrap().port();

    let result = timeout(
        Duration::from_secs(3),
        server::run(local_config(port, 0), CancellationToken::new()),
    )
    .await
    .expect("run kept serving after the gRPC port failed to bind");

    assert!(result.is_err());
}

#[tokio::test]
async fn occupied_http_port_fails_startup() {
    let occupied = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = occupied.local_addr().unwrap().port();

    let result = timeout(
        Duration::from_secs(3),
        server::run(local_config(0, port), CancellationToken::new()),
    )
    .await
    .expect("run kept serving after the HTTP port failed to bind");

    assert!(result.is_err());
}

#[tokio::test]
async fn cancelled_shutdown_stops_both_servers() {
    let shutdown = CancellationToken::new();
    shutdown.cancel();

    let result = timeout(
        Duration::from_secs(3),
        server::run(local_config(0, 0), shutdown),
    )
    .await
    .expect("run did not stop after shutdown was cancelled");

    assert!(result.is_ok());
}
