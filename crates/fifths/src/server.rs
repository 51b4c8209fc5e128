//! Stateless HTTP export endpoint.
//!
//! `POST /export` takes the ring angles, the output format and optionally the
//! label and layer markup, as JSON or as a url-encoded form, and answers with
//! the encoded wheel. Form fields may also use the `svg1`/`svg2`/`svg3` and
//! `tonality` names of the browser client.
//! `GET /key?angles=A,B` resolves a label without rendering anything.
//! Nothing is kept between requests.

use crate::angle::{AngleModel, Angles, AnglesParseError};
use crate::config::ServerConfig;
use crate::export::{ExportError, ExportFormat, ExportJob, Exporter};
use crate::key::{KeyLabel, resolve_key};
use crate::layer::{LayerSources, LayerStack, RenderError, SvgMarkup};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::sync::Arc;
use std::thread;
use thiserror::Error;
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

#[derive(Debug, Clone, Deserialize)]
pub struct ExportForm {
    /// Outer and inner angle, comma-joined.
    pub angles: String,
    pub format: String,
    #[serde(default, alias = "tonality")]
    pub label: Option<String>,
    #[serde(default, alias = "svg1")]
    pub keys: Option<String>,
    #[serde(default, alias = "svg2")]
    pub modes: Option<String>,
    #[serde(default, alias = "svg3")]
    pub frame: Option<String>,
}

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Malformed request body: {0}")]
    Body(#[from] serde_json::Error),
    #[error("Malformed angles: {0}")]
    Angles(#[from] AnglesParseError),
    #[error("Failed to read request: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Export(#[from] ExportError),
}

impl RequestError {
    pub fn status(&self) -> u16 {
        match self {
            Self::Body(_) | Self::Angles(_) | Self::Io(_) => 400,
            Self::Export(ExportError::UnsupportedFormat(_)) => 400,
            Self::Export(ExportError::Render(RenderError::Load(_))) => 422,
            Self::Export(_) => 500,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Export(ExportError::UnsupportedFormat(_)) => "Unsupported format".to_string(),
            other => other.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {reason}")]
    Bind { addr: String, reason: String },
}

/// Clamps and snaps wire angles to positions the interactive rings can reach.
pub fn coerce_angles(raw: Angles) -> Angles {
    AngleModel::coerce_detached(raw)
}

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

impl ExportForm {
    /// Decodes a JSON body, or a url-encoded one when `content_type` says so.
    pub fn from_body(body: &[u8], content_type: Option<&str>) -> Result<Self, RequestError> {
        let is_form = content_type
            .and_then(|ct| ct.split(';').next())
            .is_some_and(|ct| ct.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE));
        if !is_form {
            return Ok(serde_json::from_slice(body)?);
        }

        let fields: serde_json::Map<String, serde_json::Value> = form_urlencoded::parse(body)
            .map(|(k, v)| (k.into_owned(), serde_json::Value::String(v.into_owned())))
            .collect();
        Ok(serde_json::from_value(serde_json::Value::Object(fields))?)
    }

    pub fn into_job(self) -> Result<ExportJob, RequestError> {
        // reject the format before any rendering work
        let format = ExportFormat::from_name(&self.format)?;
        let angles = coerce_angles(self.angles.parse()?);

        let label = self
            .label
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .map(KeyLabel::new)
            .unwrap_or_else(|| resolve_key(angles.outer, angles.inner));

        let builtin = LayerSources::builtin();
        let pick = |markup: Option<String>, fallback: SvgMarkup| {
            markup.map(SvgMarkup::from).unwrap_or(fallback)
        };
        let sources = LayerStack::new(
            pick(self.keys, builtin.keys),
            pick(self.modes, builtin.modes),
            pick(self.frame, builtin.frame),
        );

        Ok(ExportJob {
            sources,
            angles,
            label,
            format,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub file_name: Option<String>,
    pub body: Vec<u8>,
}

impl Reply {
    fn text(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            content_type: "text/plain; charset=utf-8",
            file_name: None,
            body: message.into().into_bytes(),
        }
    }

    fn error(e: &RequestError) -> Self {
        log::error!("Request failed: {}", e);
        Self::text(e.status(), e.message())
    }
}

#[derive(Debug, Serialize)]
struct KeyReply<'a> {
    angles: String,
    label: &'a str,
}

pub fn handle_export(body: &[u8], content_type: Option<&str>, exporter: &Exporter) -> Reply {
    let result = ExportForm::from_body(body, content_type)
        .and_then(ExportForm::into_job)
        .and_then(|job| {
            let bytes = job.run(exporter)?;
            Ok((job, bytes))
        });

    match result {
        Ok((job, bytes)) => Reply {
            status: 200,
            content_type: job.format.content_type(),
            file_name: Some(job.file_name()),
            body: bytes,
        },
        Err(e) => Reply::error(&e),
    }
}

pub fn handle_key(query: &str) -> Reply {
    let raw = form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == "angles")
        .map(|(_, v)| v.into_owned())
        .unwrap_or_default();

    match raw.parse::<Angles>() {
        Ok(raw) => {
            let angles = coerce_angles(raw);
            let label = resolve_key(angles.outer, angles.inner);
            let reply = KeyReply {
                angles: angles.to_string(),
                label: &label,
            };
            match serde_json::to_vec(&reply) {
                Ok(body) => Reply {
                    status: 200,
                    content_type: "application/json",
                    file_name: None,
                    body,
                },
                Err(e) => Reply::error(&RequestError::from(e)),
            }
        }
        Err(e) => Reply::error(&RequestError::from(e)),
    }
}

pub fn route(
    method: &Method,
    url: &str,
    content_type: Option<&str>,
    body: &[u8],
    exporter: &Exporter,
) -> Reply {
    let (path, query) = url.split_once('?').unwrap_or((url, ""));
    match (method, path) {
        (Method::Post, "/export") => handle_export(body, content_type, exporter),
        (Method::Get, "/key") => handle_key(query),
        _ => Reply::text(404, "Not found"),
    }
}

fn respond(mut request: Request, exporter: &Exporter) {
    let mut body = Vec::new();
    let read = request.as_reader().read_to_end(&mut body);
    let content_type = request
        .headers()
        .iter()
        .find(|h| h.field.equiv("Content-Type"))
        .map(|h| h.value.as_str().to_string());
    let reply = match read {
        Ok(_) => route(
            request.method(),
            request.url(),
            content_type.as_deref(),
            &body,
            exporter,
        ),
        Err(e) => Reply::error(&RequestError::from(e)),
    };
    log::debug!(
        "{} {} -> {} ({} bytes)",
        request.method(),
        request.url(),
        reply.status,
        reply.body.len()
    );

    let mut response =
        Response::from_data(reply.body).with_status_code(StatusCode(reply.status));
    if let Ok(h) = Header::from_bytes(&b"Content-Type"[..], reply.content_type.as_bytes()) {
        response = response.with_header(h);
    }
    if let Some(name) = reply.file_name {
        let disposition = format!("attachment; filename=\"{}\"", name);
        if let Ok(h) = Header::from_bytes(&b"Content-Disposition"[..], disposition.as_bytes()) {
            response = response.with_header(h);
        }
    }

    if let Err(e) = request.respond(response) {
        log::error!("Failed to send response: {}", e);
    }
}

/// Serves until the listener fails. Each worker thread takes requests off the shared listener.
pub fn serve(config: &ServerConfig, exporter: Exporter) -> Result<(), ServerError> {
    let server = Server::http(&config.bind).map_err(|e| ServerError::Bind {
        addr: config.bind.clone(),
        reason: e.to_string(),
    })?;
    let server = Arc::new(server);
    log::info!("Listening on http://{}", config.bind);

    let workers: Vec<_> = (0..config.workers.max(1))
        .map(|_| {
            let server = server.clone();
            thread::spawn(move || {
                loop {
                    match server.recv() {
                        Ok(request) => respond(request, &exporter),
                        Err(e) => {
                            log::error!("Failed to accept request: {}", e);
                            break;
                        }
                    }
                }
            })
        })
        .collect();

    for worker in workers {
        if worker.join().is_err() {
            log::error!("Server worker panicked");
        }
    }
    Ok(())
}
