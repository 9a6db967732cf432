//! Serving with graceful shutdown.

use axum::Router;
use std::future::Future;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{error, info, warn};

/// Serves `app` until `signal` resolves, then gives in-flight requests `grace`
/// to finish before the remaining connections are dropped.
pub async fn serve<F>(
    listener: TcpListener,
    app: Router,
    grace: Duration,
    signal: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (stopping_tx, stopping_rx) = oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                signal.await;
                stopping_tx.send(()).ok();
            })
            .await
    });

    tokio::select! {
        result = &mut server => {
            result??;
            return Ok(());
        }
        _ = stopping_rx => {}
    }

    info!(grace = ?grace, "Shutdown requested, draining in-flight requests");
    match tokio::time::timeout(grace, &mut server).await {
        Ok(result) => {
            result??;
            info!("Server stopped");
        }
        Err(_) => {
            warn!(grace = ?grace, "Grace period elapsed, dropping remaining connections");
            server.abort();
        }
    }
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
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
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C"),
        () = terminate => info!("Received SIGTERM"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use std::sync::Arc;
    use tokio::sync::Notify;

    async fn slow() -> &'static str {
        tokio::time::sleep(Duration::from_millis(300)).await;
        "done"
    }

    async fn bind() -> (TcpListener, std::net::SocketAddr) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        (listener, addr)
    }

    async fn get_raw(addr: std::net::SocketAddr, path: &str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        let request =
            format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.ok();
        response
    }

    #[tokio::test]
    async fn in_flight_request_finishes_within_grace() {
        let (listener, addr) = bind().await;
        let stop = Arc::new(Notify::new());
        let signal = {
            let stop = Arc::clone(&stop);
            async move { stop.notified().await }
        };
        let app = Router::new().route("/slow", get(slow));
        let server = tokio::spawn(serve(listener, app, Duration::from_secs(2), signal));

        let request = tokio::spawn(get_raw(addr, "/slow"));
        tokio::time::sleep(Duration::from_millis(50)).await;
        stop.notify_one();

        let response = request.await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200"), "{response}");
        assert!(response.ends_with("done"));
        server.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn grace_period_bounds_shutdown() {
        let (listener, addr) = bind().await;
        let stop = Arc::new(Notify::new());
        let signal = {
            let stop = Arc::clone(&stop);
            async move { stop.notified().await }
        };
        let app = Router::new().route("/slow", get(slow));
        let server = tokio::spawn(serve(listener, app, Duration::from_millis(50), signal));

        let _request = tokio::spawn(get_raw(addr, "/slow"));
        tokio::time::sleep(Duration::from_millis(50)).await;
        stop.notify_one();

        let started = tokio::time::Instant::now();
        server.await.unwrap().unwrap();
        assert!(started.elapsed() < Duration::from_millis(300));
    }
}
