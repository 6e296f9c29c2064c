use std::sync::Arc;

use anyhow::Result;
use data_model::Track;
use rocksdb::{BoundColumnFamily, Transaction, TransactionDB};
use strum::AsRefStr;
use trackstream_utils::OptionInspectNone;

use super::serializer::{JsonEncode, JsonEncoder};
use crate::requests::{CreateTrackRequest, DeleteTrackRequest};

#[derive(AsRefStr, strum::Display, strum::EnumIter)]
pub enum TrackStoreColumns {
    Tracks, //  TrackId -> Track
}

impl TrackStoreColumns {
    pub fn cf_db<'a>(&'a self, db: &'a TransactionDB) -> Arc<BoundColumnFamily> {
        db.cf_handle(self.as_ref())
            .inspect_none(|| {
                tracing::error!("failed to get column family handle for {}", self.as_ref());
            })
            .unwrap()
    }
}

pub fn create_track(
    db: Arc<TransactionDB>,
    txn: &Transaction<TransactionDB>,
    req: &CreateTrackRequest,
) -> Result<()> {
    let serialized_track = JsonEncoder::encode(&req.track)?;
    txn.put_cf(
        &TrackStoreColumns::Tracks.cf_db(&db),
        req.track.key(),
        &serialized_track,
    )?;
    Ok(())
}

pub fn delete_track(
    db: Arc<TransactionDB>,
    txn: &Transaction<TransactionDB>,
    req: &DeleteTrackRequest,
) -> Result<()> {
    let key = Track::key_from(req.track_id.get());
    txn.delete_cf(&TrackStoreColumns::Tracks.cf_db(&db), &key)?;
    Ok(())
}
