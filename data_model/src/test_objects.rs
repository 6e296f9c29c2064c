pub mod tests {
    use crate::{Track, TrackBlob};

    pub const TEST_TITLE: &str = "test track";
    pub const TEST_FILENAME: &str = "mock_abc123.mp3";
    pub const TEST_ORIGINAL_FILENAME: &str = "song.mp3";

    pub fn mock_blob(path: &str, size_bytes: u64) -> TrackBlob {
        TrackBlob {
            path: path.to_string(),
            size_bytes,
            sha256_hash: "0".repeat(64),
        }
    }

    pub fn mock_track() -> Track {
        Track::new(
            TEST_TITLE.to_string(),
            TEST_FILENAME.to_string(),
            TEST_ORIGINAL_FILENAME.to_string(),
            mock_blob("blobs/mock_abc123.mp3", 11),
        )
    }
}
