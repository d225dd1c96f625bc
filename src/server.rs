use std::future::Future;

use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tonic::transport::Server;

use crate::config::Config;
use crate::services::http;
use crate::services::registry::{RegistryController, RegistryStore};

pub async fn start(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutting down service registry...");
        signal_token.cancel();
    });

    run(config, shutdown).await
}

// 启动 gRPC 与 HTTP 服务，直到 shutdown 被取消
//
// 监听端口在启动服务前绑定，任一端口绑定失败都会直接返回错误
pub async fn run(
    config: Config,
    shutdown: CancellationToken,
) -> Result<(), Box<dyn std::error::Error>> {
    let grpc_listener = TcpListener::bind(config.grpc_addr()?).await?;
    tracing::info!(address = %grpc_listener.local_addr()?, "gRPC registry listening");

    let http_listener = if config.server.enable_http {
        let listener = TcpListener::bind(config.http_addr()?).await?;
        tracing::info!(address = %listener.local_addr()?, "HTTP registry listening");
        Some(listener)
    } else {
        None
    };

    // 初始化服务注册表，整个进程只有这一个实例
    let store = RegistryStore::new(config.store_config())?;
    let controller = RegistryController::new(store.clone());

    let grpc = async {
        Server::builder()
            .add_service(controller.into_server())
            .serve_with_incoming_shutdown(
                TcpListenerStream::new(grpc_listener),
                shutdown.clone().cancelled_owned(),
            )
            .await
            .map_err(Box::<dyn std::error::Error>::from)
    };

    let http = async {
        match http_listener {
            Some(listener) => {
                serve_http(listener, store.clone(), shutdown.clone().cancelled_owned())
                    .await
                    .map_err(Box::<dyn std::error::Error>::from)
            }
            None => Ok(()),
        }
    };

    // 任一服务出错立即结束
    let result = tokio::try_join!(grpc, http);

    store.shutdown().await;
    result?;
    tracing::info!("Service registry stopped");
    Ok(())
}

pub async fn serve_http(
    listener: TcpListener,
    store: RegistryStore,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(listener, http::router(store))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
