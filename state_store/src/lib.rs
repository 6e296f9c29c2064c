use std::{fs, path::PathBuf, sync::Arc};

use anyhow::{anyhow, Result};
use requests::{RequestPayload, StateMachineUpdateRequest};
use rocksdb::{ColumnFamilyDescriptor, Options, TransactionDB, TransactionDBOptions};
use state_machine::TrackStoreColumns;
use strum::IntoEnumIterator;
use tracing::{debug, info};

pub mod requests;
pub mod scanner;
pub mod serializer;
pub mod state_machine;

pub struct TrackState {
    pub db: Arc<TransactionDB>,
}

impl TrackState {
    pub fn new(path: PathBuf) -> Result<Arc<Self>> {
        fs::create_dir_all(path.clone())
            .map_err(|e| anyhow!("failed to create state store dir: {}", e))?;

        let sm_column_families = TrackStoreColumns::iter()
            .map(|cf| ColumnFamilyDescriptor::new(cf.to_string(), Options::default()));
        let mut db_opts = Options::default();
        db_opts.create_missing_column_families(true);
        db_opts.create_if_missing(true);
        let db = Arc::new(
            TransactionDB::open_cf_descriptors(
                &db_opts,
                &TransactionDBOptions::default(),
                path,
                sm_column_families,
            )
            .map_err(|e| anyhow!("failed to open db: {}", e))?,
        );
        let s = Arc::new(Self { db });
        info!("initialized track state store");
        Ok(s)
    }

    pub fn reader(&self) -> scanner::StateReader {
        scanner::StateReader::new(self.db.clone())
    }

    #[tracing::instrument(
        skip(self, request),
        fields(
            request_type = request.payload.to_string(),
        )
    )]
    pub async fn write(&self, request: StateMachineUpdateRequest) -> Result<()> {
        debug!("writing state machine update request");
        let txn = self.db.transaction();
        match &request.payload {
            RequestPayload::CreateTrack(req) => {
                state_machine::create_track(self.db.clone(), &txn, req)?;
            }
            RequestPayload::DeleteTrack(req) => {
                state_machine::delete_track(self.db.clone(), &txn, req)?;
            }
        }
        txn.commit()?;
        Ok(())
    }
}
