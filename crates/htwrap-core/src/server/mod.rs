//! HTTP surfaces: the configuration form (`config`) and the credential
//! capture listener (`auth`). Both are plain hyper services on tokio.

pub mod auth;
pub mod config;
mod pages;

use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Body, Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Failures surfaced by the HTTP handlers, mapped onto status codes.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("not found")]
    NotFound,
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("read request body: {0}")]
    Body(#[from] hyper::Error),
    /// Missing or malformed JSON. Reported as a server error, not a 400.
    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl HttpError {
    pub fn status(&self) -> StatusCode {
        match self {
            HttpError::NotFound => StatusCode::NOT_FOUND,
            HttpError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            HttpError::Body(_) | HttpError::Json(_) | HttpError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn into_response(self) -> Response<Body> {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {:#}", self);
        } else {
            tracing::debug!("request rejected: {}", self);
        }
        let mut resp = Response::new(Body::from(format!("{:#}", self)));
        *resp.status_mut() = status;
        resp.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
        resp
    }
}

/// Turn a handler result into a response.
fn finish(result: Result<Response<Body>, HttpError>) -> Response<Body> {
    result.unwrap_or_else(HttpError::into_response)
}

fn html(page: String) -> Response<Body> {
    let mut resp = Response::new(Body::from(page));
    resp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"));
    resp
}

fn json<T: Serialize>(value: &T) -> Result<Response<Body>, HttpError> {
    let body = serde_json::to_vec(value)?;
    let mut resp = Response::new(Body::from(body));
    resp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(resp)
}

async fn read_json<T: DeserializeOwned>(req: Request<Body>) -> Result<T, HttpError> {
    let bytes = hyper::body::to_bytes(req.into_body()).await?;
    Ok(serde_json::from_slice(&bytes)?)
}
