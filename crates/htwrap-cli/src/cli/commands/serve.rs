//! `htwrap` with no URL – serve the configuration form until Ctrl+C.

use anyhow::{Context, Result};
use htwrap_core::server;
use htwrap_core::service::WrapperService;
use std::net::SocketAddr;
use std::sync::Arc;

pub async fn run_serve(service: Arc<WrapperService>, addr: SocketAddr) -> Result<()> {
    let (local_addr, server) = server::config::bind(service, addr)?;
    tracing::info!(addr = %local_addr, "config server listening");

    println!("HTTrack Wrapper started");
    println!();
    println!("  1. Open http://{} in your browser", local_addr);
    println!("  2. Configure download options");
    println!("  3. Enter URL and start download");
    println!("  4. Auth handler will open if login required");
    println!();
    println!("Press Ctrl+C to stop");

    tokio::select! {
        res = server => res.context("config server failed")?,
        res = tokio::signal::ctrl_c() => {
            res.context("listen for Ctrl+C")?;
            tracing::info!("interrupted, shutting down");
        }
    }
    Ok(())
}
