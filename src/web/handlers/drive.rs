//! Drive API handlers.

use std::io;
use std::sync::{Arc, OnceLock};

use axum::{
    body::Body,
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use futures::TryStreamExt;
use tokio_util::io::{ReaderStream, StreamReader};
use uuid::Uuid;

use super::AppState;
use crate::catalog::ItemKind;
use crate::drive::{Disposition, StagedUpload, View};
use crate::web::dto::{
    ApiResponse, BrowseQuery, CreateFolderRequest, DownloadQuery, FileResponse, FolderResponse,
    ItemResponse, ListingResponse, RenameRequest, StatusResponse, StorageResponse, TrashQuery,
    ValidatedJson,
};
use crate::web::error::ApiError;

/// Parse an item ID from the path.
fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::validation(format!("Invalid id: {raw}")))
}

/// Parse an optional parent ID. Absent, empty and "null" all mean root.
fn parse_parent(raw: Option<&str>) -> Result<Option<Uuid>, ApiError> {
    match raw.map(str::trim) {
        None | Some("") | Some("null") => Ok(None),
        Some(raw) => parse_id(raw).map(Some),
    }
}

fn parse_kind(raw: &str) -> Result<ItemKind, ApiError> {
    raw.parse::<ItemKind>().map_err(ApiError::from)
}

fn multipart_error(status: StatusCode, text: &str) -> ApiError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large("Upload exceeds the size limit")
    } else {
        tracing::warn!("Rejected multipart body: {}", text);
        ApiError::bad_request("Invalid multipart data")
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        multipart_error(e.status(), &e.body_text())
    }
}

/// Build the Content-Disposition header for a download.
///
/// Attachments get an ASCII `filename` fallback plus an RFC 5987
/// `filename*` parameter when the name is not plain ASCII.
pub(crate) fn content_disposition_header(filename: &str, disposition: Disposition) -> String {
    if disposition == Disposition::Inline {
        return "inline".to_string();
    }

    let plain = filename
        .chars()
        .all(|c| c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\');
    if plain {
        return format!("attachment; filename=\"{}\"", filename);
    }

    let fallback: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' | '\\' => '_',
            c if !c.is_ascii() => '_',
            c => c,
        })
        .collect();
    let encoded = urlencoding::encode(filename);

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback, encoded
    )
}

/// GET /api/browse - List a view.
///
/// Query: `view` (recent, starred, trash; anything else browses by parent)
/// and `parent_id`.
pub async fn browse(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BrowseQuery>,
) -> Result<Json<ApiResponse<ListingResponse>>, ApiError> {
    let view = query
        .view
        .as_deref()
        .unwrap_or_default()
        .parse::<View>()
        .unwrap_or_default();
    let parent_id = parse_parent(query.parent_id.as_deref())?;

    let listing = state.drive.browse(view, parent_id).await?;

    Ok(Json(ApiResponse::new(listing.into())))
}

/// POST /api/upload - Upload a file.
///
/// Request body: multipart/form-data with a `file` field and an optional
/// `parent_id` field, in either order. The file content is streamed straight
/// into the blob store and recorded once the whole form has been read.
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    let mut form = UploadForm::default();

    let read = form.read(&state, &mut multipart).await;
    if let Err(e) = read {
        if let Some(staged) = form.staged {
            state.drive.discard_upload(staged).await;
        }
        return Err(e);
    }

    let staged = form
        .staged
        .ok_or_else(|| ApiError::bad_request("No file provided"))?;
    let file = state.drive.commit_upload(staged, form.parent_id).await?;

    Ok(Json(ApiResponse::new(file.into())))
}

/// Fields collected from an upload form.
#[derive(Default)]
struct UploadForm {
    parent_id: Option<Uuid>,
    staged: Option<StagedUpload>,
}

impl UploadForm {
    /// Read every field. Content already staged stays in `self.staged` on error.
    async fn read(&mut self, state: &AppState, multipart: &mut Multipart) -> Result<(), ApiError> {
        while let Some(field) = multipart.next_field().await? {
            match field.name() {
                Some("parent_id") => {
                    let raw = field.text().await?;
                    self.parent_id = parse_parent(Some(&raw))?;
                }
                Some("file") => {
                    if self.staged.is_some() {
                        return Err(ApiError::bad_request("Only one file per upload"));
                    }
                    let filename = field
                        .file_name()
                        .map(str::to_string)
                        .ok_or_else(|| ApiError::bad_request("File field has no filename"))?;

                    // Remember why the body stream broke; the blob store only sees an I/O error.
                    let rejection: Arc<OnceLock<(StatusCode, String)>> = Arc::default();
                    let seen = rejection.clone();
                    let stream = field.map_err(move |e| {
                        let _ = seen.set((e.status(), e.body_text()));
                        io::Error::new(io::ErrorKind::Other, e)
                    });
                    let mut reader = StreamReader::new(stream);

                    match state.drive.stage_upload(&mut reader, &filename).await {
                        Ok(staged) => self.staged = Some(staged),
                        Err(e) => {
                            return Err(match rejection.get() {
                                Some((status, text)) => multipart_error(*status, text),
                                None => e.into(),
                            })
                        }
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }
}

/// POST /api/folder - Create a folder.
pub async fn create_folder(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreateFolderRequest>,
) -> Result<Json<ApiResponse<FolderResponse>>, ApiError> {
    let parent_id = parse_parent(req.parent_id.as_deref())?;
    let folder = state.drive.create_folder(&req.name, parent_id).await?;

    Ok(Json(ApiResponse::new(folder.into())))
}

/// PUT /api/rename/:kind/:id - Rename a file or folder.
pub async fn rename_item(
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, String)>,
    ValidatedJson(req): ValidatedJson<RenameRequest>,
) -> Result<Json<ApiResponse<ItemResponse>>, ApiError> {
    let kind = parse_kind(&kind)?;
    let id = parse_id(&id)?;

    let item = state.drive.rename(kind, id, &req.name).await?;

    Ok(Json(ApiResponse::new(item.into())))
}

/// POST /api/star/:kind/:id - Toggle the star flag.
pub async fn toggle_star(
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<ItemResponse>>, ApiError> {
    let kind = parse_kind(&kind)?;
    let id = parse_id(&id)?;

    let item = state.drive.toggle_star(kind, id).await?;

    Ok(Json(ApiResponse::new(item.into())))
}

/// DELETE /api/trash/:kind/:id - Move to trash, or restore with `?restore=true`.
pub async fn toggle_trash(
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, String)>,
    Query(query): Query<TrashQuery>,
) -> Result<Json<ApiResponse<StatusResponse>>, ApiError> {
    let kind = parse_kind(&kind)?;
    let id = parse_id(&id)?;

    state.drive.set_trashed(kind, id, query.is_restore()).await?;

    Ok(Json(ApiResponse::new(StatusResponse::ok())))
}

/// GET /api/file/:id/content - Stream file content.
///
/// `?download=true` asks for an attachment; otherwise the content is served inline.
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response<Body>, ApiError> {
    let id = parse_id(&id)?;
    let disposition = if query.is_attachment() {
        Disposition::Attachment
    } else {
        Disposition::Inline
    };

    let download = state.drive.download(id, disposition).await?;

    let content_type = mime_guess::from_path(&download.file.name)
        .first_or_octet_stream()
        .to_string();

    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(&download.file.name, download.disposition),
        )
        .header(header::CONTENT_LENGTH, download.file.size)
        .body(Body::from_stream(ReaderStream::new(download.content)))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Failed to build response")
        })
}

/// GET /api/storage - Quota usage.
pub async fn storage_usage(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<StorageResponse>>, ApiError> {
    let usage = state.drive.quota().await?;

    Ok(Json(ApiResponse::new(usage.into())))
}
