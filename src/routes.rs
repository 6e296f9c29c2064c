use std::{fmt, sync::Arc};

use axum::{
    extract::{DefaultBodyLimit, MatchedPath, Path, Query, Request, State},
    http::Method,
    routing::{delete, get, post},
    Json,
    Router,
};
use blob_store::BlobStorage;
use state_store::{
    requests::{DeleteTrackRequest, RequestPayload, StateMachineUpdateRequest},
    TrackState,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::http_objects::{
    ApiError,
    DeleteTrackResponse,
    ListParams,
    Track,
    TracksList,
    UploadTrackResponse,
};

mod stream;
mod upload;

#[derive(OpenApi)]
#[openapi(
    paths(
        index,
        upload::upload_track,
        list_tracks,
        stream::stream_track,
        delete_track,
    ),
    components(schemas(
        ApiError,
        Track,
        TracksList,
        UploadTrackResponse,
        DeleteTrackResponse,
        upload::TrackUploadType,
    )),
    tags(
        (name = "tracks", description = "Track upload, streaming and deletion")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct RouteState {
    pub track_state: Arc<TrackState>,
    pub blob_storage: Arc<BlobStorage>,
}

pub fn create_routes(route_state: RouteState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .merge(SwaggerUi::new("/docs/swagger").url("/docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(index))
        .route(
            "/track",
            post(upload::upload_track).with_state(route_state.clone()),
        )
        .route(
            "/tracks",
            get(list_tracks).with_state(route_state.clone()),
        )
        .route(
            "/track/{track_id}",
            get(stream::stream_track).with_state(route_state.clone()),
        )
        .route(
            "/track/{track_id}",
            delete(delete_track).with_state(route_state.clone()),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &Request| {
                    let method = req.method();
                    let uri = req.uri();

                    let matched_path = req
                        .extensions()
                        .get::<MatchedPath>()
                        .map(|matched_path| matched_path.as_str());

                    tracing::debug_span!("request", %method, %uri, matched_path)
                })
                .on_failure(()),
        )
        .layer(cors)
        .layer(DefaultBodyLimit::max(usize::MAX))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "tracks",
    responses(
        (status = 200, description = "Trackstream server running")
    ),
)]
async fn index() -> &'static str {
    "Trackstream Server"
}

/// List tracks
#[utoipa::path(
    get,
    path = "/tracks",
    tag = "tracks",
    params(ListParams),
    responses(
        (status = 200, description = "Lists tracks", body = TracksList),
        (status = INTERNAL_SERVER_ERROR, description = "Unable to list tracks")
    ),
)]
async fn list_tracks(
    Query(params): Query<ListParams>,
    State(state): State<RouteState>,
) -> Result<Json<TracksList>, ApiError> {
    let tracks = state
        .track_state
        .reader()
        .list_tracks(params.limit)
        .map_err(ApiError::internal_error)?;
    let tracks = tracks.into_iter().map(Into::into).collect();
    Ok(Json(TracksList { tracks }))
}

/// Failure of one phase of a track deletion.
#[derive(Debug)]
pub enum DeleteTrackError {
    /// The track record could not be removed. Nothing was deleted.
    Record { source: anyhow::Error },
    /// The record was removed but the stored audio was not. The named
    /// object is orphaned in the blob store.
    Blob {
        path: String,
        source: blob_store::BlobError,
    },
}

impl fmt::Display for DeleteTrackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeleteTrackError::Record { source } => {
                write!(f, "failed to delete track record: {}", source)
            }
            DeleteTrackError::Blob { path, source } => write!(
                f,
                "track record deleted but removing stored audio at {} failed: {}",
                path, source
            ),
        }
    }
}

impl std::error::Error for DeleteTrackError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DeleteTrackError::Record { source } => Some(source.as_ref()),
            DeleteTrackError::Blob { source, .. } => Some(source),
        }
    }
}

/// Delete a track
#[utoipa::path(
    delete,
    path = "/track/{track_id}",
    tag = "tracks",
    responses(
        (status = 200, description = "Track deleted", body = DeleteTrackResponse),
        (status = NOT_FOUND, description = "Track not found", body = ApiError),
        (status = INTERNAL_SERVER_ERROR, description = "Unable to delete track", body = ApiError)
    ),
)]
async fn delete_track(
    Path(track_id): Path<String>,
    State(state): State<RouteState>,
) -> Result<Json<DeleteTrackResponse>, ApiError> {
    let track = state
        .track_state
        .reader()
        .get_track(&track_id)
        .map_err(ApiError::internal_error)?
        .ok_or_else(|| ApiError::not_found("Track not found."))?;

    remove_track(&state, &track)
        .await
        .map_err(|e| ApiError::internal_error_str(&e.to_string()))?;

    info!("deleted track {}", track_id);
    Ok(Json(DeleteTrackResponse {
        message: format!("Deleted {}", track_id),
    }))
}

/// Removes the track record, then the stored audio. Each phase reports
/// its own failure instead of folding both into one outcome.
async fn remove_track(
    state: &RouteState,
    track: &data_model::Track,
) -> Result<(), DeleteTrackError> {
    state
        .track_state
        .write(StateMachineUpdateRequest {
            payload: RequestPayload::DeleteTrack(DeleteTrackRequest {
                track_id: track.id.clone(),
            }),
        })
        .await
        .map_err(|source| DeleteTrackError::Record { source })?;

    state
        .blob_storage
        .delete(&track.blob.path)
        .await
        .map_err(|source| DeleteTrackError::Blob {
            path: track.blob.path.clone(),
            source,
        })?;

    Ok(())
}
