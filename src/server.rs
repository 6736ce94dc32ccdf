use hyper::Server;
use hyper::server::conn::AddrStream;
use hyper::service::{make_service_fn, service_fn};
use log::{error, info};
use std::convert::Infallible;
use std::future::Future;
use std::net::TcpListener;
use std::sync::Arc;
use tokio::signal;

use crate::address::ListenAddr;
use crate::error::{Error, Result};
use crate::handler::Handler;

/// Binds the listen address, trying each resolved socket address in turn.
pub fn bind(listen: &ListenAddr, raw: &str) -> Result<TcpListener> {
    let addrs = listen.socket_addrs().map_err(|source| Error::Lookup {
        addr: raw.to_string(),
        source,
    })?;
    let listener = TcpListener::bind(&addrs[..]).map_err(|source| Error::Bind {
        addr: raw.to_string(),
        source,
    })?;
    listener.set_nonblocking(true).map_err(|source| Error::Bind {
        addr: raw.to_string(),
        source,
    })?;
    Ok(listener)
}

/// Serves every path through `handler` until `shutdown` resolves.
pub async fn serve<H, F>(listener: TcpListener, handler: H, shutdown: F) -> Result<()>
where
    H: Handler,
    F: Future<Output = ()>,
{
    let local_addr = listener.local_addr().map_err(|source| Error::Bind {
        addr: "listener".to_string(),
        source,
    })?;
    let handler = Arc::new(handler);
    let make_svc = make_service_fn(move |conn: &AddrStream| {
        let remote_addr = conn.remote_addr();
        let handler = Arc::clone(&handler);
        async move {
            Ok::<_, Infallible>(service_fn(move |req| {
                let handler = Arc::clone(&handler);
                async move { Ok::<_, Infallible>(handler.handle(req, remote_addr).await) }
            }))
        }
    });

    let server = Server::from_tcp(listener)
        .map_err(|source| Error::Serve {
            addr: local_addr,
            source,
        })?
        .serve(make_svc);
    info!("Server started on {}", local_addr);

    server
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|source| Error::Serve {
            addr: local_addr,
            source,
        })?;
    info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
