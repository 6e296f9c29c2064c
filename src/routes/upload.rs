use axum::{
    extract::{Multipart, State},
    Json,
};
use blob_store::PutResult;
use futures::StreamExt;
use nanoid::nanoid;
use state_store::requests::{CreateTrackRequest, RequestPayload, StateMachineUpdateRequest};
use tracing::{error, info};
use utoipa::ToSchema;

use super::RouteState;
use crate::http_objects::{ApiError, UploadTrackResponse};

#[allow(dead_code)]
#[derive(ToSchema)]
pub(super) struct TrackUploadType {
    title: String,
    #[schema(format = "binary")]
    file: String,
}

/// Upload a track
#[utoipa::path(
    post,
    path = "/track",
    tag = "tracks",
    request_body(content_type = "multipart/form-data", content = inline(TrackUploadType)),
    responses(
        (status = 200, description = "Track uploaded", body = UploadTrackResponse),
        (status = BAD_REQUEST, description = "Missing title or file field"),
        (status = INTERNAL_SERVER_ERROR, description = "Unable to upload track")
    ),
)]
pub(super) async fn upload_track(
    State(state): State<RouteState>,
    mut form: Multipart,
) -> Result<Json<UploadTrackResponse>, ApiError> {
    let mut title: Option<String> = None;
    let mut filename: Option<String> = None;
    let mut original_filename: Option<String> = None;
    let mut put_result: Option<PutResult> = None;

    while let Some(field) = form
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(&e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let extension = std::path::Path::new(&file_name)
                .extension()
                .map(|ext| format!(".{}", ext.to_string_lossy()))
                .unwrap_or_default();
            let stored_name = format!("{}{}", nanoid!(), extension);
            let stream = field.map(|res| res.map_err(|err| anyhow::anyhow!(err)));
            let result = state
                .blob_storage
                .put(&stored_name, stream)
                .await
                .map_err(|e| ApiError::internal_error(e.into()))?;
            info!(
                "stored track blob {} ({} bytes)",
                result.url, result.size_bytes
            );
            put_result = Some(result);
            filename = Some(stored_name);
            original_filename = Some(file_name);
        } else if name == "title" {
            let text = field
                .text()
                .await
                .map_err(|e| ApiError::bad_request(&e.to_string()))?;
            title = Some(text);
        }
    }

    if title.is_none() {
        if let Some(put_result) = &put_result {
            rollback_stored_blob(&state, &put_result.url).await;
        }
        return Err(ApiError::bad_request("title field is required"));
    }
    if put_result.is_none() {
        return Err(ApiError::bad_request("file field is required"));
    }
    let put_result = put_result.unwrap();
    let sha256_hash = put_result.sha256_hash;
    let track = data_model::Track::new(
        title.unwrap(),
        filename.unwrap(),
        original_filename.unwrap(),
        data_model::TrackBlob {
            path: put_result.url,
            size_bytes: put_result.size_bytes,
            sha256_hash: sha256_hash.clone(),
        },
    );
    let response = UploadTrackResponse {
        track_id: track.id.to_string(),
        filename: track.filename.clone(),
        size_bytes: track.blob.size_bytes,
        sha256_hash,
    };
    let blob_path = track.blob.path.clone();

    state
        .track_state
        .write(StateMachineUpdateRequest {
            payload: RequestPayload::CreateTrack(CreateTrackRequest { track }),
        })
        .await
        .map_err(|e| {
            ApiError::internal_error_str(&format!(
                "blob stored but track record write failed, orphaned object at {}: {}",
                blob_path, e
            ))
        })?;
    info!("created track {}", response.track_id);
    Ok(Json(response))
}

/// Removes audio stored for an upload that was rejected before a track
/// record existed.
async fn rollback_stored_blob(state: &RouteState, path: &str) {
    match state.blob_storage.delete(path).await {
        Ok(_) => info!("rolled back stored blob {}", path),
        Err(error) => error!(
            "failed to roll back stored blob, orphaned object at {}: {}",
            path, error
        ),
    }
}
