//! The wrapper service: one owned instance holding the config store, the
//! auth store, the login analyzer and the auth listener. HTTP handlers and
//! the CLI both go through it.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::analyzer::{LoginVerdict, SiteAnalyzer};
use crate::auth::AuthStore;
use crate::command::MirrorCommand;
use crate::config::{ConfigStore, MirrorConfig};
use crate::server::auth::AuthListener;

/// Body of `POST /download`.
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadRequest {
    pub url: String,
    pub output: String,
    #[serde(default)]
    pub options: Map<String, Value>,
}

/// Reply to `POST /download`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadResponse {
    pub message: String,
    pub needs_auth: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_url: Option<String>,
}

impl DownloadResponse {
    fn login_required(login_url: String) -> Self {
        Self {
            message: "Login required for this site".to_string(),
            needs_auth: true,
            login_url: Some(login_url),
        }
    }

    fn starting(command: &MirrorCommand) -> Self {
        Self {
            message: format!("Starting download: {}", command),
            needs_auth: false,
            login_url: None,
        }
    }
}

pub struct WrapperService {
    config: Mutex<ConfigStore>,
    auth: AuthStore,
    analyzer: Arc<SiteAnalyzer>,
    auth_listener: AuthListener,
}

impl WrapperService {
    pub fn new(
        config: ConfigStore,
        auth: AuthStore,
        analyzer: SiteAnalyzer,
        auth_addr: SocketAddr,
    ) -> Self {
        let auth_listener = AuthListener::new(auth.clone(), auth_addr);
        Self {
            config: Mutex::new(config),
            auth,
            analyzer: Arc::new(analyzer),
            auth_listener,
        }
    }

    /// Service backed by the XDG config files and the curl analyzer.
    pub fn open_default(auth_addr: SocketAddr) -> Result<Self> {
        let config = ConfigStore::open_default()?;
        tracing::debug!(path = %config.path().display(), "loaded config: {:?}", config.config());
        let auth = AuthStore::open_default()?;
        tracing::debug!(path = %auth.path().display(), "auth data file");
        Ok(Self::new(config, auth, SiteAnalyzer::default(), auth_addr))
    }

    fn lock_config(&self) -> Result<MutexGuard<'_, ConfigStore>> {
        self.config.lock().map_err(|_| anyhow!("config lock poisoned"))
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> Result<MirrorConfig> {
        Ok(self.lock_config()?.config().clone())
    }

    /// Merge `overrides` into the config and persist it.
    pub fn update_config(&self, overrides: &Map<String, Value>) -> Result<()> {
        let mut store = self.lock_config()?;
        store.merge_and_persist(overrides)?;
        tracing::debug!("config updated: {:?}", store.config());
        Ok(())
    }

    /// Run the login probe off the async executor.
    pub async fn check_login(&self, url: &str) -> Result<LoginVerdict> {
        let analyzer = Arc::clone(&self.analyzer);
        let url = url.to_string();
        tokio::task::spawn_blocking(move || analyzer.check_login_required(&url))
            .await
            .context("login probe task failed")
    }

    /// The httrack invocation for `url` into `output`, using the current
    /// config and whatever auth data is on disk.
    pub fn command_for(&self, url: &str, output: &str) -> Result<MirrorCommand> {
        let auth = self.auth.load()?;
        let store = self.lock_config()?;
        Ok(MirrorCommand::build(store.config(), auth.as_ref(), url, output))
    }

    pub fn auth_listener(&self) -> &AuthListener {
        &self.auth_listener
    }

    /// Form path: merge options, probe for a login wall, then either start the
    /// auth listener or report the command that would run. Nothing is executed.
    pub async fn start_download(&self, req: DownloadRequest) -> Result<DownloadResponse> {
        self.update_config(&req.options)?;

        let verdict = self.check_login(&req.url).await?;
        if verdict.requires_login() {
            self.auth_listener.ensure_started()?;
            return Ok(DownloadResponse::login_required(verdict.url));
        }

        let command = self.command_for(&req.url, &req.output)?;
        tracing::info!(url = %req.url, "download requested: {}", command);
        Ok(DownloadResponse::starting(&command))
    }
}

impl std::fmt::Debug for WrapperService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WrapperService")
            .field("auth", &self.auth)
            .field("auth_listener", &self.auth_listener)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{FetchedPage, PageFetcher};
    use serde_json::json;
    use tempfile::TempDir;

    struct StaticPage(&'static str, &'static str);

    impl PageFetcher for StaticPage {
        fn fetch(&self, _url: &str) -> Result<FetchedPage> {
            Ok(FetchedPage {
                final_url: self.0.to_string(),
                body: self.1.to_string(),
            })
        }
    }

    fn service(dir: &TempDir, fetcher: StaticPage) -> WrapperService {
        let config = ConfigStore::open_at(dir.path().join("config.json")).unwrap();
        let auth = AuthStore::at(dir.path().join("auth_data.json"));
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        WrapperService::new(config, auth, SiteAnalyzer::new(fetcher), addr)
    }

    fn download(url: &str, options: Value) -> DownloadRequest {
        serde_json::from_value(json!({"url": url, "output": "OUT", "options": options})).unwrap()
    }

    #[tokio::test]
    async fn open_site_reports_command_and_persists_options() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(&dir, StaticPage("https://site.test/", "<p>hi</p>"));

        let resp = svc
            .start_download(download("https://site.test/", json!({"max_depth": "2", "robots": false})))
            .await
            .unwrap();

        assert!(!resp.needs_auth);
        assert!(resp.login_url.is_none());
        assert!(resp.message.starts_with("Starting download: httrack https://site.test/ -O \"OUT\""));
        assert!(resp.message.contains(" -r2 "));
        assert!(resp.message.contains(" -s0"));
        assert!(!svc.auth_listener().is_started());

        let reopened = ConfigStore::open_at(dir.path().join("config.json")).unwrap();
        assert_eq!(reopened.config().max_depth, "2".into());
        assert!(!reopened.config().robots);
    }

    #[tokio::test]
    async fn login_wall_starts_listener_once() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(&dir, StaticPage("https://site.test/signin", ""));

        let resp = svc.start_download(download("https://site.test/", json!({}))).await.unwrap();
        assert_eq!(
            resp,
            DownloadResponse {
                message: "Login required for this site".to_string(),
                needs_auth: true,
                login_url: Some("https://site.test/signin".to_string()),
            }
        );
        assert!(svc.auth_listener().is_started());
        assert_ne!(svc.auth_listener().local_addr().port(), 0);

        svc.start_download(download("https://site.test/", json!({}))).await.unwrap();
        assert!(!svc.auth_listener().ensure_started().unwrap());
    }

    #[tokio::test]
    async fn bad_switch_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(&dir, StaticPage("https://site.test/", ""));
        let err = svc
            .start_download(download(
                "https://site.test/",
                json!({"max_depth": 2, "cookies": "sure"}),
            ))
            .await;
        assert!(err.is_err());
        let cfg = svc.config().unwrap();
        assert_eq!(cfg.max_depth, 5.into());
        assert!(cfg.cookies);
    }

    #[tokio::test]
    async fn cleared_depth_renders_bare_flag() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(&dir, StaticPage("https://site.test/", ""));
        let resp = svc
            .start_download(download(
                "https://site.test/",
                json!({"max_depth": "", "max_external_depth": "-1"}),
            ))
            .await
            .unwrap();
        assert!(resp.message.contains(" -r -m-1 -M10M"));

        let on_disk: Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("config.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(on_disk["max_depth"], json!(""));
        assert_eq!(on_disk["max_external_depth"], json!("-1"));
    }

    #[test]
    fn command_picks_up_saved_cookies() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(&dir, StaticPage("https://site.test/", ""));
        std::fs::write(
            dir.path().join("auth_data.json"),
            r#"{"username":"u","cookies":{"a":"1","b":"2"}}"#,
        )
        .unwrap();
        let cmd = svc.command_for("U", "OUT").unwrap();
        assert!(cmd.render().ends_with(r#"--cookies "a=1; b=2""#));
    }
}
