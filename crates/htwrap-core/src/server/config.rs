//! Primary server: the configuration form and `POST /download`.

use anyhow::{Context, Result};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server};
use std::convert::Infallible;
use std::future::Future;
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;

use super::{finish, html, json, pages, read_json, HttpError};
use crate::service::{DownloadRequest, WrapperService};

pub const DEFAULT_PORT: u16 = 10069;

/// Bind the configuration server on `addr`. Returns the bound address and
/// the server future; must be called inside a tokio runtime.
pub fn bind(
    service: Arc<WrapperService>,
    addr: SocketAddr,
) -> Result<(SocketAddr, impl Future<Output = hyper::Result<()>>)> {
    let listener = TcpListener::bind(addr).with_context(|| format!("bind server on {}", addr))?;
    listener.set_nonblocking(true)?;
    let local_addr = listener.local_addr()?;

    let make_svc = make_service_fn(move |_conn| {
        let service = Arc::clone(&service);
        async move {
            Ok::<_, Infallible>(service_fn(move |req| {
                let service = Arc::clone(&service);
                async move { Ok::<_, Infallible>(finish(route(&service, req).await)) }
            }))
        }
    });
    let server = Server::from_tcp(listener)?.serve(make_svc);
    Ok((local_addr, server))
}

async fn route(service: &WrapperService, req: Request<Body>) -> Result<Response<Body>, HttpError> {
    match (req.method(), req.uri().path()) {
        (&Method::GET, "/") => {
            let config = service.config()?;
            Ok(html(pages::config_form(&config, &service.auth_listener().url())))
        }
        (&Method::POST, "/download") => {
            let request: DownloadRequest = read_json(req).await?;
            let response = service.start_download(request).await?;
            json(&response)
        }
        (_, "/") | (_, "/download") => Err(HttpError::MethodNotAllowed),
        _ => Err(HttpError::NotFound),
    }
}
