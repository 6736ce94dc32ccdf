use log::info;

use crate::address::ListenAddr;
use crate::auth::BasicAuth;
use crate::config::Config;
use crate::error::Result;
use crate::handler::FileServer;
use crate::interfaces::{self, SystemInterfaces};
use crate::server;

/// Announces where the folder is reachable, binds, and serves until a
/// shutdown signal arrives.
pub async fn run(config: Config) -> Result<()> {
    info!("Serving folder: {}", config.root.display());

    let listen: ListenAddr = config.addr.parse()?;
    for url in interfaces::listening_urls(&listen, &config.addr, &SystemInterfaces)? {
        info!("Listening on {}", url);
    }

    let listener = server::bind(&listen, &config.addr)?;
    let files = FileServer::new(config.root);
    match config.password {
        Some(password) => {
            server::serve(
                listener,
                BasicAuth::new(password, files),
                server::shutdown_signal(),
            )
            .await
        }
        None => server::serve(listener, files, server::shutdown_signal()).await,
    }
}
