use std::path::PathBuf;

use anyhow::Result;
use blob_store::BlobStorageConfig;
use tracing::subscriber;
use tracing_subscriber::{layer::SubscriberExt, Layer};

use crate::{
    config::ServerConfig,
    routes::{create_routes, RouteState},
    service::Service,
};

pub struct TestService {
    pub service: Service,
    // Keeps the backing directories alive for the lifetime of the service.
    temp_dir: tempfile::TempDir,
}

impl TestService {
    pub async fn new() -> Result<Self> {
        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("trace"));
        let _ = subscriber::set_global_default(
            tracing_subscriber::registry()
                .with(tracing_subscriber::fmt::layer().with_filter(env_filter)),
        );

        let temp_dir = tempfile::tempdir()?;

        let cfg = ServerConfig {
            state_store_path: temp_dir
                .path()
                .join("state_store")
                .to_str()
                .unwrap()
                .to_string(),
            blob_storage: BlobStorageConfig::new(
                temp_dir.path().join("blob_store").to_str().unwrap(),
            ),
            ..Default::default()
        };

        let service = Service::new(cfg).await?;

        Ok(Self { service, temp_dir })
    }

    pub fn app(&self) -> axum::Router {
        create_routes(RouteState {
            track_state: self.service.track_state.clone(),
            blob_storage: self.service.blob_storage.clone(),
        })
    }

    /// Filesystem root of the blob store, for tests that tamper with or
    /// inspect the store behind the service's back.
    pub fn blob_root(&self) -> PathBuf {
        self.temp_dir.path().join("blob_store")
    }

    pub fn blob_path(&self, filename: &str) -> PathBuf {
        self.blob_root().join(filename)
    }
}
