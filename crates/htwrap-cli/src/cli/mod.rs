//! CLI for htwrap: mirror one site directly, or serve the configuration form.

mod commands;

use anyhow::Result;
use clap::Parser;
use htwrap_core::server::auth::DEFAULT_AUTH_PORT;
use htwrap_core::server::config::DEFAULT_PORT;
use htwrap_core::service::WrapperService;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use commands::{run_mirror, run_serve};

/// HTTrack wrapper with login detection.
///
/// With both `--url` and `--output`, checks the site for a login wall and
/// runs httrack directly. Otherwise serves the configuration form.
#[derive(Debug, Parser)]
#[command(name = "htwrap")]
#[command(about = "HTTrack wrapper with auth detection", long_about = None)]
pub struct Cli {
    /// URL to download.
    #[arg(long)]
    pub url: Option<String>,

    /// Output directory.
    #[arg(long)]
    pub output: Option<String>,

    /// Address the form server and the auth listener bind to.
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub host: IpAddr,

    /// Port of the configuration form.
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Port of the auth capture listener.
    #[arg(long, default_value_t = DEFAULT_AUTH_PORT)]
    pub auth_port: u16,
}

impl Cli {
    pub async fn run_from_args() -> Result<()> {
        Cli::parse().run().await
    }

    pub async fn run(self) -> Result<()> {
        let auth_addr = SocketAddr::new(self.host, self.auth_port);
        let service = Arc::new(WrapperService::open_default(auth_addr)?);

        match (self.url, self.output) {
            (Some(url), Some(output)) => run_mirror(&service, &url, &output).await?,
            (url, output) => {
                if url.is_some() || output.is_some() {
                    tracing::warn!("--url and --output must be given together; starting the form server");
                }
                run_serve(service, SocketAddr::new(self.host, self.port)).await?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
