//! `htwrap --url <url> --output <dir>` – probe, maybe capture auth, run httrack.

use anyhow::Result;
use htwrap_core::command::MIRROR_PROGRAM;
use htwrap_core::service::WrapperService;
use std::io::{self, Write};

pub async fn run_mirror(service: &WrapperService, url: &str, output: &str) -> Result<()> {
    let verdict = service.check_login(url).await?;
    if verdict.requires_login() {
        println!("Login required. Starting auth handler...");
        service.auth_listener().ensure_started()?;
        println!("  Login page: {}", verdict.url);
        println!("  Auth handler: {}", service.auth_listener().url());
        wait_for_enter().await?;
    }

    let command = service.command_for(url, output)?;
    println!("Executing: {}", command);
    let status = tokio::task::spawn_blocking(move || command.execute()).await??;
    if !status.success() {
        anyhow::bail!("{} exited with {}", MIRROR_PROGRAM, status);
    }
    Ok(())
}

/// Block (off the runtime) until the user presses Enter, so the auth
/// listener keeps serving meanwhile.
async fn wait_for_enter() -> Result<()> {
    tokio::task::spawn_blocking(|| {
        print!("Press Enter after completing authentication...");
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin().read_line(&mut line)?;
        Ok::<_, io::Error>(())
    })
    .await??;
    Ok(())
}
