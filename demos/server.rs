//! tsu-timing demo server: plain hyper, timed with `Timing::wrap`.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example server
//!
//! Try:
//!   curl http://localhost:3000/fast        # INFO, logged (log_all_requests)
//!   curl http://localhost:3000/slow        # WARN  (600 ms)
//!   curl http://localhost:3000/very-slow   # ERROR (2.1 s)
//!   curl http://localhost:3000/fail        # 500, error appended to the line
//!   curl http://localhost:3000/health      # skipped, never logged
//!
//! Thresholds and flags can be overridden with `TSU_TIMING_*` variables.
//!
//! # Graceful shutdown
//!
//! On SIGTERM or Ctrl-C the server stops accepting, lets every in-flight
//! connection finish, then returns.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info};
use tsu_timing::{BoxedHandler, ClientAddr, Config, RequestErrors, Timing};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let mut config = Config::from_env()?;
    config.warning_threshold = Duration::from_millis(200);
    config.error_threshold = Duration::from_secs(1);
    config.log_all_requests = true;
    config.add_skip_path("/health");

    let handler = Timing::new(config).wrap(route);
    serve("0.0.0.0:3000".parse()?, handler).await?;
    Ok(())
}

async fn route(req: Request<Incoming>) -> Response<Full<Bytes>> {
    let path = req.uri().path().to_owned();
    match path.as_str() {
        "/fast" => text(StatusCode::OK, "fast response"),
        "/slow" => {
            tokio::time::sleep(Duration::from_millis(600)).await;
            text(StatusCode::OK, "slow response")
        }
        "/very-slow" => {
            tokio::time::sleep(Duration::from_millis(2100)).await;
            text(StatusCode::OK, "very slow response")
        }
        "/fail" => {
            let mut res = text(StatusCode::INTERNAL_SERVER_ERROR, "failed");
            RequestErrors::record(&mut res, "inventory lookup failed");
            res
        }
        "/health" => text(StatusCode::OK, "OK"),
        _ => text(StatusCode::NOT_FOUND, ""),
    }
}

fn text(status: StatusCode, body: &'static str) -> Response<Full<Bytes>> {
    let mut res = Response::new(Full::new(Bytes::from_static(body.as_bytes())));
    *res.status_mut() = status;
    res
}

async fn serve(
    addr: SocketAddr,
    handler: BoxedHandler<Incoming, Full<Bytes>>,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "demo listening");

    let mut tasks = tokio::task::JoinSet::new();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;

            () = &mut shutdown => {
                info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                break;
            }

            res = listener.accept() => {
                let (stream, remote_addr) = match res {
                    Ok(v) => v,
                    Err(e) => {
                        error!("accept error: {e}");
                        continue;
                    }
                };

                let handler = handler.clone();
                let io = TokioIo::new(stream);

                tasks.spawn(async move {
                    let svc = service_fn(move |mut req: Request<Incoming>| {
                        req.extensions_mut().insert(ClientAddr(remote_addr));
                        let res = handler.call(req);
                        async move { Ok::<_, Infallible>(res.await) }
                    });

                    if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                        .serve_connection(io, svc)
                        .await
                    {
                        error!(peer = %remote_addr, "connection error: {e}");
                    }
                });
            }

            Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
        }
    }

    while tasks.join_next().await.is_some() {}

    info!("demo stopped");
    Ok(())
}

/// Resolves on SIGTERM or Ctrl-C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c  => {}
        () = sigterm => {}
    }
}
