//! HTTP surface: one multipart route, two response representations.
//!
//! `POST /{profile_id}` accepts a multipart form with optional `sha1Hex`,
//! `url` and `file` fields. The `Accept` header selects the operation:
//! `text/html` takes the report path, `application/xml` returns the
//! structured result as XML, anything else returns JSON. The route and field
//! names are a compatibility surface — do not rename them.
//!
//! Error mapping is centralised in [`status_for`]; the not-a-PDF case keeps
//! its legacy plain-text body so existing clients can keep matching on it.

use crate::error::ValidateError;
use crate::report::result_to_xml;
use crate::validate::{self, ServiceContext, ValidationRequest};
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

/// Upload cap. Conformance checking is routinely run on print-ready
/// documents in the tens of megabytes.
const MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

/// Legacy 415 body; clients match on this string.
const NOT_A_PDF_BODY: &str = "File does not appear to be a PDF.";

/// Build the service router.
pub fn router(ctx: Arc<ServiceContext>) -> Router {
    Router::new()
        .route("/{profile_id}", post(handle_validate))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(ctx)
}

/// Bind and serve until the process exits.
pub async fn serve(addr: SocketAddr, ctx: Arc<ServiceContext>) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "validation HTTP server listening");
    axum::serve(listener, router(ctx)).await
}

/// HTTP status for each error variant.
pub fn status_for(err: &ValidateError) -> StatusCode {
    match err {
        ValidateError::AmbiguousInput
        | ValidateError::MissingInput
        | ValidateError::UnknownProfile { .. }
        | ValidateError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
        ValidateError::NotAPdf => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        ValidateError::RemoteFetch { .. } | ValidateError::RemoteFetchTimeout { .. } => {
            StatusCode::BAD_GATEWAY
        }
        ValidateError::Parse { .. }
        | ValidateError::ValidationIncomplete { .. }
        | ValidateError::Engine { .. }
        | ValidateError::DigestIncomplete { .. }
        | ValidateError::StagingIo { .. }
        | ValidateError::PipelineIo { .. }
        | ValidateError::RenderTransform { .. }
        | ValidateError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

struct ApiError(ValidateError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let body = match &self.0 {
            // Legacy contract: exact text, text/plain.
            ValidateError::NotAPdf => NOT_A_PDF_BODY.to_string(),
            // Server-side failures get logged, not leaked.
            e if status == StatusCode::INTERNAL_SERVER_ERROR => {
                error!(error = %e, "request failed");
                "internal validation error".to_string()
            }
            e => e.to_string(),
        };
        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            body,
        )
            .into_response()
    }
}

/// Which representation the client asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Representation {
    Json,
    Xml,
    Html,
}

fn negotiate(headers: &HeaderMap) -> Representation {
    let accept = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if accept.contains("text/html") {
        Representation::Html
    } else if accept.contains("application/xml") || accept.contains("text/xml") {
        Representation::Xml
    } else {
        Representation::Json
    }
}

async fn handle_validate(
    State(ctx): State<Arc<ServiceContext>>,
    Path(profile_id): Path<String>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    let request = match read_form(profile_id, multipart).await {
        Ok(r) => r,
        Err(resp) => return resp,
    };

    match negotiate(&headers) {
        Representation::Html => match validate::validate_report(&ctx, request).await {
            Ok(html) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                html,
            )
                .into_response(),
            Err(e) => ApiError(e).into_response(),
        },
        Representation::Xml => match validate::validate(&ctx, request).await {
            Ok(result) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/xml; charset=utf-8")],
                result_to_xml(&result),
            )
                .into_response(),
            Err(e) => ApiError(e).into_response(),
        },
        Representation::Json => match validate::validate(&ctx, request).await {
            Ok(result) => Json(result).into_response(),
            Err(e) => ApiError(e).into_response(),
        },
    }
}

/// Pull the three known fields out of the multipart body.
///
/// Empty `sha1Hex`/`url` text fields are treated as absent: HTML forms post
/// every field whether or not the user filled it in.
async fn read_form(profile_id: String, mut multipart: Multipart) -> Result<ValidationRequest, Response> {
    let mut request = ValidationRequest {
        profile_id,
        ..Default::default()
    };

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(f)) => f,
            Ok(None) => break,
            Err(e) => {
                return Err((
                    StatusCode::BAD_REQUEST,
                    format!("malformed multipart body: {e}"),
                )
                    .into_response())
            }
        };
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "sha1Hex" => {
                let text = read_text(field).await?;
                if !text.is_empty() {
                    request.sha1_hex = Some(text);
                }
            }
            "url" => {
                let text = read_text(field).await?;
                if !text.is_empty() {
                    request.url = Some(text);
                }
            }
            "file" => {
                let bytes = field.bytes().await.map_err(|e| {
                    (
                        StatusCode::BAD_REQUEST,
                        format!("could not read uploaded file: {e}"),
                    )
                        .into_response()
                })?;
                request.upload = Some(bytes.to_vec());
            }
            // Unknown fields are ignored for forward compatibility.
            _ => {}
        }
    }
    Ok(request)
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, Response> {
    field.text().await.map(|t| t.trim().to_string()).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            format!("could not read form field: {e}"),
        )
            .into_response()
    })
}
