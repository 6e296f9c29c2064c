use data_model::{Track, TrackId};

pub struct StateMachineUpdateRequest {
    pub payload: RequestPayload,
}

#[derive(Debug, Clone, strum::Display)]
pub enum RequestPayload {
    CreateTrack(CreateTrackRequest),
    DeleteTrack(DeleteTrackRequest),
}

#[derive(Debug, Clone)]
pub struct CreateTrackRequest {
    pub track: Track,
}

#[derive(Debug, Clone)]
pub struct DeleteTrackRequest {
    pub track_id: TrackId,
}
