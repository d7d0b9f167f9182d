//! # API REST
//!
//! REST API implementation for pdfshare.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (identity headers, multipart uploads, status codes, CORS)
//!
//! Uses `api-shared` for wire types and header parsing, and `pdfshare-core` for everything
//! else.

#![warn(rust_2018_idioms)]

pub mod startup;

use api_shared::auth::auth_state_from_headers;
use api_shared::{
    CommentsRes, CreateCommentReq, DispatchRes, DocumentRes, ErrorRes, HealthRes, HealthService,
    InviteReq, ListDocumentsRes, SendShareEmailReq, ShareLinkRes, SharedDocumentInfoRes,
    SharedDocumentRes,
};
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use pdfshare_core::constants::{LOGIN_PATH, PDF_MIME_TYPE};
use pdfshare_core::{
    AuthState, FailureKind, ListingStatus, OwnerListing, ShareError, ShareRoute, ShareServices,
};
use pdfshare_notify::{NotificationDispatcher, ShareInvite};
use pdfshare_types::OwnerId;
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::{IntoParams, OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

/// Multipart headers and boundaries on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Application state for the REST API server
///
/// Holds the core services plus the dispatcher used directly by the `sendShareEmail`
/// callable.
#[derive(Clone)]
pub struct AppState {
    services: ShareServices,
    dispatcher: Arc<dyn NotificationDispatcher>,
    max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        services: ShareServices,
        dispatcher: Arc<dyn NotificationDispatcher>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            services,
            dispatcher,
            max_upload_bytes,
        }
    }
}

pub type ApiError = (StatusCode, Json<ErrorRes>);

/// Schema for the multipart upload body.
#[derive(ToSchema)]
#[allow(dead_code)]
struct UploadDocumentForm {
    /// The PDF, sent with its file name and `application/pdf` content type
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
struct SearchQuery {
    /// Case-insensitive substring of the display name
    search: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
struct LinkQuery {
    /// `shared` (default) or `pdf`
    route: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        upload_document,
        list_documents,
        open_shared,
        open_pdf,
        list_comments,
        post_comment,
        share_link,
        invite,
        send_share_email,
        shared_content,
    ),
    components(schemas(
        HealthRes,
        DocumentRes,
        ListDocumentsRes,
        api_shared::CommentRes,
        CommentsRes,
        SharedDocumentInfoRes,
        SharedDocumentRes,
        CreateCommentReq,
        ShareLinkRes,
        InviteReq,
        SendShareEmailReq,
        DispatchRes,
        ErrorRes,
        UploadDocumentForm,
    ))
)]
pub struct ApiDoc;

/// Builds the REST router with Swagger UI, permissive CORS and the upload body limit.
pub fn router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route("/health", get(health))
        .route("/documents", post(upload_document).get(list_documents))
        .route("/shared/:share_id", get(open_shared))
        .route("/pdf/:share_id", get(open_pdf))
        .route("/shared/:share_id/content", get(shared_content))
        .route(
            "/shared/:share_id/comments",
            get(list_comments).post(post_comment),
        )
        .route("/shared/:share_id/link", get(share_link))
        .route("/shared/:share_id/invite", post(invite))
        .route("/functions/sendShareEmail", post(send_share_email))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn error_body(error: impl Into<String>, login: Option<&str>) -> Json<ErrorRes> {
    Json(ErrorRes {
        error: error.into(),
        login: login.map(str::to_owned),
    })
}

/// Maps a core failure to its status code. Write failures are logged and never described
/// to the caller.
fn reject(context: &str, e: ShareError) -> ApiError {
    match e.kind() {
        FailureKind::InvalidInput => {
            tracing::warn!("{} rejected: {}", context, e);
            let message = match e {
                ShareError::InvalidInput(message) => message,
                other => other.to_string(),
            };
            (StatusCode::BAD_REQUEST, error_body(message, None))
        }
        FailureKind::Unauthorized => {
            tracing::warn!("{} unauthorized: {}", context, e);
            let message = match e {
                ShareError::Unauthorized(message) => message,
                other => other.to_string(),
            };
            (StatusCode::UNAUTHORIZED, error_body(message, Some(LOGIN_PATH)))
        }
        FailureKind::NotFound => (StatusCode::NOT_FOUND, error_body("Not found", None)),
        FailureKind::WriteFailure => {
            tracing::error!("{} error: {:?}", context, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_body("Internal error", None),
            )
        }
    }
}

fn internal(context: &str, e: impl std::fmt::Debug) -> ApiError {
    tracing::error!("{} error: {:?}", context, e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        error_body("Internal error", None),
    )
}

fn auth_state(headers: &HeaderMap) -> Result<AuthState, ApiError> {
    auth_state_from_headers(|name| headers.get(name).and_then(|v| v.to_str().ok())).map_err(|e| {
        tracing::warn!("identity headers rejected: {}", e);
        (StatusCode::BAD_REQUEST, error_body(e.to_string(), None))
    })
}

fn sign_in_required() -> ApiError {
    (
        StatusCode::UNAUTHORIZED,
        error_body("Please sign in.", Some(LOGIN_PATH)),
    )
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/documents",
    request_body(content = UploadDocumentForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Document uploaded", body = DocumentRes),
        (status = 400, description = "Not a PDF, missing file, or too large", body = ErrorRes),
        (status = 401, description = "No owner identity", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Upload a PDF
///
/// Reads the `file` part of a multipart body and hands it to the upload orchestrator. The
/// part's content type must be exactly `application/pdf`.
///
/// # Errors
/// Returns `400 Bad Request` if the body has no `file` part or the file is rejected,
/// `401 Unauthorized` without an owner identity, and `500 Internal Server Error` if either
/// write fails.
#[axum::debug_handler]
async fn upload_document(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<DocumentRes>), ApiError> {
    let auth = auth_state(&headers)?;

    let mut file = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::warn!("multipart read failed: {}", e);
        (StatusCode::BAD_REQUEST, error_body("Malformed upload", None))
    })? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_owned();
        let mime_type = field.content_type().unwrap_or_default().to_owned();
        let bytes = field.bytes().await.map_err(|e| {
            tracing::warn!("multipart read failed: {}", e);
            (StatusCode::BAD_REQUEST, error_body("Malformed upload", None))
        })?;
        file = Some((file_name, mime_type, bytes));
        break;
    }

    let Some((file_name, mime_type, bytes)) = file else {
        return Err((
            StatusCode::BAD_REQUEST,
            error_body("Please select a file.", None),
        ));
    };

    let (owner, email) = match auth.identity() {
        Some(identity) => (identity.owner_id.as_str(), identity.email.as_ref()),
        None => ("", None),
    };

    let document = state
        .services
        .uploads
        .upload(owner, email, &bytes, &file_name, &mime_type)
        .map_err(|e| reject("Upload", e))?;

    Ok((StatusCode::CREATED, Json(document.into())))
}

#[utoipa::path(
    get,
    path = "/documents",
    params(SearchQuery),
    responses(
        (status = 200, description = "The caller's documents", body = ListDocumentsRes),
        (status = 401, description = "No owner identity", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// List the caller's documents, optionally filtered by display name
#[axum::debug_handler]
async fn list_documents(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ListDocumentsRes>, ApiError> {
    let auth = auth_state(&headers)?;

    let mut listing = OwnerListing::new(state.services.registry.clone());
    listing
        .on_auth_state(auth)
        .map_err(|e| reject("List documents", e))?;

    if listing.status() != &ListingStatus::Ready {
        return Err(sign_in_required());
    }

    listing.set_search(query.search.unwrap_or_default());
    let documents = listing
        .visible()
        .into_iter()
        .cloned()
        .map(DocumentRes::from)
        .collect();

    Ok(Json(ListDocumentsRes { documents }))
}

fn shared_view(state: &AppState, share_id: &str) -> Result<SharedDocumentRes, ApiError> {
    state
        .services
        .sharing
        .open_thread(share_id)
        .map(SharedDocumentRes::from)
        .map_err(|e| reject("Open shared document", e))
}

#[utoipa::path(
    get,
    path = "/shared/{share_id}",
    params(("share_id" = String, Path, description = "Opaque share id")),
    responses(
        (status = 200, description = "Document and comment thread", body = SharedDocumentRes),
        (status = 404, description = "No document for this share id", body = ErrorRes)
    )
)]
/// Open a shared document with its comment thread; no sign-in required
#[axum::debug_handler]
async fn open_shared(
    State(state): State<AppState>,
    Path(share_id): Path<String>,
) -> Result<Json<SharedDocumentRes>, ApiError> {
    shared_view(&state, &share_id).map(Json)
}

#[utoipa::path(
    get,
    path = "/pdf/{share_id}",
    params(("share_id" = String, Path, description = "Opaque share id")),
    responses(
        (status = 200, description = "Document and comment thread", body = SharedDocumentRes),
        (status = 404, description = "No document for this share id", body = ErrorRes)
    )
)]
/// Open a shared document through the `/pdf/` route
#[axum::debug_handler]
async fn open_pdf(
    State(state): State<AppState>,
    Path(share_id): Path<String>,
) -> Result<Json<SharedDocumentRes>, ApiError> {
    shared_view(&state, &share_id).map(Json)
}

#[utoipa::path(
    get,
    path = "/shared/{share_id}/comments",
    params(("share_id" = String, Path, description = "Opaque share id")),
    responses(
        (status = 200, description = "Thread in ascending order", body = CommentsRes),
        (status = 404, description = "No document for this share id", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn list_comments(
    State(state): State<AppState>,
    Path(share_id): Path<String>,
) -> Result<Json<CommentsRes>, ApiError> {
    let comments = state
        .services
        .sharing
        .comments(&share_id)
        .map_err(|e| reject("List comments", e))?;
    Ok(Json(comments.into()))
}

#[utoipa::path(
    post,
    path = "/shared/{share_id}/comments",
    params(("share_id" = String, Path, description = "Opaque share id")),
    request_body = CreateCommentReq,
    responses(
        (status = 200, description = "Thread after the append", body = CommentsRes),
        (status = 400, description = "Empty comment", body = ErrorRes),
        (status = 404, description = "No document for this share id", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Post a comment on a shared document
///
/// Signed-in callers are labelled with their email; everyone else is `Anonymous`. The
/// response is the re-queried thread.
#[axum::debug_handler]
async fn post_comment(
    State(state): State<AppState>,
    Path(share_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<CreateCommentReq>,
) -> Result<Json<CommentsRes>, ApiError> {
    let auth = auth_state(&headers)?;
    let author = auth.identity().map(|identity| identity.author_label());

    let comments = state
        .services
        .sharing
        .comment(&share_id, author, &req.text)
        .map_err(|e| reject("Post comment", e))?;
    Ok(Json(comments.into()))
}

#[utoipa::path(
    get,
    path = "/shared/{share_id}/link",
    params(
        ("share_id" = String, Path, description = "Opaque share id"),
        LinkQuery
    ),
    responses(
        (status = 200, description = "Share link", body = ShareLinkRes),
        (status = 400, description = "Unknown route", body = ErrorRes),
        (status = 404, description = "No document for this share id", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn share_link(
    State(state): State<AppState>,
    Path(share_id): Path<String>,
    Query(query): Query<LinkQuery>,
) -> Result<Json<ShareLinkRes>, ApiError> {
    let route_name = query.route.unwrap_or_else(|| "shared".into());
    let route = route_name
        .parse::<ShareRoute>()
        .map_err(|e| reject("Share link", e))?;

    let link = state
        .services
        .sharing
        .link_for(&share_id, route)
        .map_err(|e| reject("Share link", e))?;

    Ok(Json(ShareLinkRes {
        route: route_name,
        link,
    }))
}

#[utoipa::path(
    post,
    path = "/shared/{share_id}/invite",
    params(("share_id" = String, Path, description = "Opaque share id")),
    request_body = InviteReq,
    responses(
        (status = 200, description = "Dispatcher outcome; success may be false", body = DispatchRes),
        (status = 400, description = "Missing or malformed email", body = ErrorRes),
        (status = 401, description = "Caller does not own the document", body = ErrorRes),
        (status = 404, description = "No document for this share id", body = ErrorRes)
    )
)]
/// Email a share link for one of the caller's documents
#[axum::debug_handler]
async fn invite(
    State(state): State<AppState>,
    Path(share_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<InviteReq>,
) -> Result<Json<DispatchRes>, ApiError> {
    let auth = auth_state(&headers)?;
    let owner: OwnerId = auth.owner_id().cloned().ok_or_else(sign_in_required)?;

    let sharing = state.services.sharing.clone();
    let outcome = tokio::task::spawn_blocking(move || sharing.invite(&owner, &share_id, &req.email))
        .await
        .map_err(|e| internal("Invite", e))?
        .map_err(|e| reject("Invite", e))?;

    Ok(Json(outcome.into()))
}

#[utoipa::path(
    post,
    path = "/functions/sendShareEmail",
    request_body = SendShareEmailReq,
    responses(
        (status = 200, description = "`{success}` or `{success: false, error}`", body = DispatchRes)
    )
)]
/// Callable email boundary
///
/// Sends the invitation exactly as given; delivery failures are reported in the body.
#[axum::debug_handler]
async fn send_share_email(
    State(state): State<AppState>,
    Json(req): Json<SendShareEmailReq>,
) -> Result<Json<DispatchRes>, ApiError> {
    let dispatcher = state.dispatcher.clone();
    let invite: ShareInvite = req.into();
    let outcome = tokio::task::spawn_blocking(move || dispatcher.send_share_invite(&invite))
        .await
        .map_err(|e| internal("Send share email", e))?;
    Ok(Json(outcome.into()))
}

#[utoipa::path(
    get,
    path = "/shared/{share_id}/content",
    params(("share_id" = String, Path, description = "Opaque share id")),
    responses(
        (status = 200, description = "PDF bytes, served as application/pdf"),
        (status = 404, description = "No document for this share id", body = ErrorRes)
    )
)]
/// Serve a shared document's PDF bytes; this is the document's `contentUrl`
#[axum::debug_handler]
async fn shared_content(
    State(state): State<AppState>,
    Path(share_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let bytes = state
        .services
        .sharing
        .read_content(&share_id)
        .map_err(|e| reject("Read shared content", e))?;

    Ok(([(header::CONTENT_TYPE, PDF_MIME_TYPE)], bytes))
}
