//! Credential capture listener.
//!
//! Serves one form; `POST /auth` writes the submitted JSON to the auth-data
//! file, replacing whatever was there. No login is attempted, and
//! `POST /check-2fa` always answers "not required".

use anyhow::{Context, Result};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::convert::Infallible;
use std::future::Future;
use std::net::{SocketAddr, TcpListener};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use super::{finish, html, json, pages, read_json, HttpError};
use crate::auth::{AuthData, AuthStore};

pub const DEFAULT_AUTH_PORT: u16 = 10070;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthSaved {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct TfaCheck {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TfaStatus {
    pub requires_2fa: bool,
}

/// Bind the auth listener on `addr`. Returns the bound address and the
/// server future; must be called inside a tokio runtime.
pub fn bind(
    store: AuthStore,
    addr: SocketAddr,
) -> Result<(SocketAddr, impl Future<Output = hyper::Result<()>>)> {
    let listener =
        TcpListener::bind(addr).with_context(|| format!("bind auth listener on {}", addr))?;
    listener.set_nonblocking(true)?;
    let local_addr = listener.local_addr()?;
    let store = Arc::new(store);

    let make_svc = make_service_fn(move |_conn| {
        let store = Arc::clone(&store);
        async move {
            Ok::<_, Infallible>(service_fn(move |req| {
                let store = Arc::clone(&store);
                async move { Ok::<_, Infallible>(finish(route(&store, req).await)) }
            }))
        }
    });
    let server = Server::from_tcp(listener)?.serve(make_svc);
    Ok((local_addr, server))
}

async fn route(store: &AuthStore, req: Request<Body>) -> Result<Response<Body>, HttpError> {
    match (req.method(), req.uri().path()) {
        (&Method::GET, "/") => Ok(html(pages::auth_form())),
        (&Method::POST, "/auth") => {
            let fields: Map<String, Value> = read_json(req).await?;
            store.save(&AuthData::new(fields))?;
            json(&AuthSaved {
                success: true,
                message: "Auth data saved, you can close this window".to_string(),
            })
        }
        (&Method::POST, "/check-2fa") => {
            let check: TfaCheck = read_json(req).await?;
            tracing::debug!(url = ?check.url, "2fa check");
            json(&TfaStatus {
                requires_2fa: false,
            })
        }
        (_, "/") | (_, "/auth") | (_, "/check-2fa") => Err(HttpError::MethodNotAllowed),
        _ => Err(HttpError::NotFound),
    }
}

/// Lazily started auth listener: not started → listening, never stopped.
#[derive(Debug)]
pub struct AuthListener {
    store: AuthStore,
    addr: SocketAddr,
    started: AtomicBool,
    bound: OnceLock<SocketAddr>,
}

impl AuthListener {
    pub fn new(store: AuthStore, addr: SocketAddr) -> Self {
        Self {
            store,
            addr,
            started: AtomicBool::new(false),
            bound: OnceLock::new(),
        }
    }

    /// Start listening in a background task if not already started.
    /// Returns true when this call started it. A failed bind clears the
    /// started flag so a later call can retry.
    pub fn ensure_started(&self) -> Result<bool> {
        if self
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(false);
        }
        let (local_addr, server) = match bind(self.store.clone(), self.addr) {
            Ok(bound) => bound,
            Err(e) => {
                self.started.store(false, Ordering::Release);
                return Err(e);
            }
        };
        let _ = self.bound.set(local_addr);
        tokio::spawn(async move {
            if let Err(e) = server.await {
                tracing::error!("auth listener stopped: {}", e);
            }
        });
        tracing::info!(addr = %local_addr, "auth listener started");
        Ok(true)
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Bound address once started, else the configured one.
    pub fn local_addr(&self) -> SocketAddr {
        self.bound.get().copied().unwrap_or(self.addr)
    }

    /// Browser URL of the credential form.
    pub fn url(&self) -> String {
        format!("http://{}", self.local_addr())
    }
}
