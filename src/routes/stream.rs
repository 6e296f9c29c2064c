use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Response,
};
use trackstream_utils::GuardStreamExt;
use tracing::debug;

use super::RouteState;
use crate::{
    byte_range::{self, RangeError, ResolvedRange},
    http_objects::ApiError,
};

const AUDIO_CONTENT_TYPE: &str = "audio/mpeg";

/// Stream a track's audio
///
/// Honors a single `Range: bytes=start-[end]` request header. Without
/// one the whole object is streamed.
#[utoipa::path(
    get,
    path = "/track/{track_id}",
    tag = "tracks",
    responses(
        (status = 200, description = "Full track audio"),
        (status = 206, description = "Requested byte range of the track audio"),
        (status = BAD_REQUEST, description = "Malformed range header", body = ApiError),
        (status = NOT_FOUND, description = "Track not found", body = ApiError),
        (status = 416, description = "Range not satisfiable"),
        (status = INTERNAL_SERVER_ERROR, description = "Unable to read track audio")
    ),
)]
pub async fn stream_track(
    Path(track_id): Path<String>,
    State(state): State<RouteState>,
    headers: HeaderMap,
) -> Result<Response<Body>, ApiError> {
    let track = state
        .track_state
        .reader()
        .get_track(&track_id)
        .map_err(ApiError::internal_error)?
        .ok_or_else(|| ApiError::not_found("Track not found."))?;

    let metadata = state
        .blob_storage
        .head(&track.blob.path)
        .await
        .map_err(|e| ApiError::internal_error(e.into()))?;
    let total = metadata.size_bytes;

    let range_header = match headers.get(hyper::header::RANGE) {
        Some(value) => Some(
            value
                .to_str()
                .map_err(|_| ApiError::bad_request("malformed range header"))?,
        ),
        None => None,
    };

    match range_header {
        None => full_response(&state, &track, total).await,
        Some(header) => match byte_range::resolve(header, total) {
            Ok(range) => partial_response(&state, &track, range).await,
            Err(RangeError::Malformed { .. }) => {
                Err(ApiError::bad_request("malformed range header"))
            }
            Err(RangeError::Unsatisfiable { .. }) => unsatisfiable_response(total),
        },
    }
}

async fn full_response(
    state: &RouteState,
    track: &data_model::Track,
    total: u64,
) -> Result<Response<Body>, ApiError> {
    let storage_reader = state
        .blob_storage
        .get(&track.blob.path, None)
        .await
        .map_err(|e| ApiError::internal_error(e.into()))?;
    let track_id = track.id.clone();
    let storage_reader = storage_reader.guard(move || {
        debug!("released read cursor for track {}", track_id);
    });

    Response::builder()
        .header(hyper::header::CONTENT_TYPE, AUDIO_CONTENT_TYPE)
        .header(hyper::header::CONTENT_LENGTH, total.to_string())
        .header(hyper::header::ACCEPT_RANGES, "bytes")
        .body(Body::from_stream(storage_reader))
        .map_err(|e| ApiError::internal_error_str(&e.to_string()))
}

async fn partial_response(
    state: &RouteState,
    track: &data_model::Track,
    range: ResolvedRange,
) -> Result<Response<Body>, ApiError> {
    let storage_reader = state
        .blob_storage
        .get(&track.blob.path, Some(range.fetch_range()))
        .await
        .map_err(|e| ApiError::internal_error(e.into()))?;
    let track_id = track.id.clone();
    let storage_reader = storage_reader.guard(move || {
        debug!("released read cursor for track {}", track_id);
    });

    Response::builder()
        .status(StatusCode::PARTIAL_CONTENT)
        .header(hyper::header::CONTENT_TYPE, AUDIO_CONTENT_TYPE)
        .header(hyper::header::CONTENT_LENGTH, range.content_length().to_string())
        .header(hyper::header::CONTENT_RANGE, range.content_range())
        .header(hyper::header::ACCEPT_RANGES, "bytes")
        .body(Body::from_stream(storage_reader))
        .map_err(|e| ApiError::internal_error_str(&e.to_string()))
}

fn unsatisfiable_response(total: u64) -> Result<Response<Body>, ApiError> {
    Response::builder()
        .status(StatusCode::RANGE_NOT_SATISFIABLE)
        .header(hyper::header::CONTENT_RANGE, format!("bytes */{}", total))
        .body(Body::empty())
        .map_err(|e| ApiError::internal_error_str(&e.to_string()))
}
