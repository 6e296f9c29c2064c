pub mod test_objects;

use std::fmt::{self, Display};

use nanoid::nanoid;
use serde::{Deserialize, Serialize};
use trackstream_utils::get_epoch_time_in_ms;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    pub fn new(id: String) -> Self {
        Self(id)
    }

    pub fn get(&self) -> &str {
        &self.0
    }
}

impl Default for TrackId {
    fn default() -> Self {
        Self(nanoid!())
    }
}

impl Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TrackId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Location and identity of a track's binary content in the blob store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackBlob {
    /// Object store path of the binary, as returned by the write sink.
    pub path: String,
    pub size_bytes: u64,
    pub sha256_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    /// Generated storage filename, random id plus the original extension.
    pub filename: String,
    pub original_filename: String,
    pub blob: TrackBlob,
    pub created_at: u64,
}

impl Track {
    pub fn new(
        title: String,
        filename: String,
        original_filename: String,
        blob: TrackBlob,
    ) -> Self {
        Self {
            id: TrackId::default(),
            title,
            filename,
            original_filename,
            blob,
            created_at: get_epoch_time_in_ms(),
        }
    }

    pub fn key(&self) -> String {
        Track::key_from(self.id.get())
    }

    pub fn key_from(id: &str) -> String {
        id.to_string()
    }
}
