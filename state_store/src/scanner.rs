use std::sync::Arc;

use anyhow::Result;
use data_model::Track;
use rocksdb::{IteratorMode, ReadOptions, TransactionDB};
use serde::de::DeserializeOwned;

use super::state_machine::TrackStoreColumns;
use crate::serializer::{JsonEncode, JsonEncoder};

pub struct StateReader {
    db: Arc<TransactionDB>,
}

impl StateReader {
    pub fn new(db: Arc<TransactionDB>) -> Self {
        Self { db }
    }

    /// This method fetches a key from a specific column family
    pub fn get_from_cf<T, K>(
        &self,
        column: &TrackStoreColumns,
        key: K,
    ) -> Result<Option<T>, anyhow::Error>
    where
        T: DeserializeOwned,
        K: AsRef<[u8]>,
    {
        let result_bytes = match self.db.get_cf(&column.cf_db(&self.db), key)? {
            Some(bytes) => bytes,
            None => return Ok(None),
        };
        let result = JsonEncoder::decode::<T>(&result_bytes)
            .map_err(|e| anyhow::anyhow!("Deserialization error: {}", e))?;

        Ok(Some(result))
    }

    pub fn get_track(&self, track_id: &str) -> Result<Option<Track>> {
        self.get_from_cf(&TrackStoreColumns::Tracks, Track::key_from(track_id))
    }

    /// Scans track records in key order, optionally bounded by `limit`.
    pub fn list_tracks(&self, limit: Option<usize>) -> Result<Vec<Track>> {
        let cf = TrackStoreColumns::Tracks.cf_db(&self.db);
        let mut read_options = ReadOptions::default();
        read_options.set_readahead_size(4_194_304);
        let iter = self
            .db
            .iterator_cf_opt(&cf, read_options, IteratorMode::Start);

        let limit = limit.unwrap_or(usize::MAX);
        let mut tracks = Vec::new();
        for kv in iter {
            let (_, value) = kv?;
            if tracks.len() >= limit {
                break;
            }
            tracks.push(JsonEncoder::decode::<Track>(&value)?);
        }
        Ok(tracks)
    }
}
