//! Refreshing camera embeddings from live stills.
//!
//! One camera at a time: fetch its current frame, embed it, store the vector
//! and stamp `last_updated`. Ranked search only sees cameras that went
//! through here at least once.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use camsight_ai::{EmbedError, ImageEmbeddingProvider};
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::{CameraImages, EmbeddingStore, ImageUrlError, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
  #[error("no cameras to index")]
  NoCameras,

  #[error(transparent)]
  ImageUrl(#[from] ImageUrlError),

  #[error("fetching camera still failed: {0}")]
  Fetch(#[from] reqwest::Error),

  #[error("camera host returned {0}")]
  Status(u16),

  #[error("embedding camera still failed: {0}")]
  Embedding(#[from] EmbedError),

  #[error("camera {0} is not in the store")]
  UnknownCamera(String),

  #[error(transparent)]
  Store(#[from] StoreError),
}

/// Where the indexer gets a camera's current frame.
#[async_trait]
pub trait StillSource: Send + Sync {
  async fn fetch(&self, camera_id: &str) -> Result<Vec<u8>, IndexError>;
}

/// Fetches stills over HTTP from the camera host.
#[derive(Clone, Debug)]
pub struct HttpStills {
  http: reqwest::Client,
  images: CameraImages,
}

impl HttpStills {
  #[must_use]
  pub const fn new(http: reqwest::Client, images: CameraImages) -> Self {
    Self { http, images }
  }
}

#[async_trait]
impl StillSource for HttpStills {
  async fn fetch(&self, camera_id: &str) -> Result<Vec<u8>, IndexError> {
    let url = self.images.url_for(camera_id, Utc::now().timestamp())?;
    let response = self.http.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
      return Err(IndexError::Status(status.as_u16()));
    }

    Ok(response.bytes().await?.to_vec())
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
  pub indexed: usize,
  pub failed: usize,
}

pub struct CameraIndexer {
  store: Arc<dyn EmbeddingStore>,
  stills: Arc<dyn StillSource>,
  embedder: Arc<dyn ImageEmbeddingProvider>,
  interval: Duration,
}

impl CameraIndexer {
  pub fn new(
    store: Arc<dyn EmbeddingStore>,
    stills: Arc<dyn StillSource>,
    embedder: Arc<dyn ImageEmbeddingProvider>,
  ) -> Self {
    Self {
      store,
      stills,
      embedder,
      interval: Duration::from_secs(2),
    }
  }

  /// Pause after each camera, keeps the load on the camera host flat.
  #[must_use]
  pub const fn with_interval(mut self, interval: Duration) -> Self {
    self.interval = interval;
    self
  }

  pub async fn index_camera(&self, camera_id: &str) -> Result<(), IndexError> {
    let still = self.stills.fetch(camera_id).await?;
    debug!(camera_id, bytes = still.len(), "still fetched");

    let embedding = self.embedder.embed_image(&still).await?;
    let touched = self.store.store_embedding(camera_id, &embedding).await?;
    if touched == 0 {
      return Err(IndexError::UnknownCamera(camera_id.to_owned()));
    }
    Ok(())
  }

  /// Index every known camera once. A failing camera is logged and skipped;
  /// only failing to list cameras aborts the pass.
  pub async fn run_pass(&self) -> Result<PassSummary, IndexError> {
    let ids = self.store.camera_ids().await?;
    if ids.is_empty() {
      return Err(IndexError::NoCameras);
    }

    let mut summary = PassSummary::default();
    for camera_id in &ids {
      match self.index_camera(camera_id).await {
        Ok(()) => summary.indexed += 1,
        Err(err) => {
          warn!(camera_id, error = %err, "indexing camera failed");
          summary.failed += 1;
        }
      }
      tokio::time::sleep(self.interval).await;
    }

    info!(
      cameras = ids.len(),
      indexed = summary.indexed,
      failed = summary.failed,
      "index pass finished"
    );
    Ok(summary)
  }

  /// Cycle through the cameras until an error that stops a whole pass.
  /// The camera list is re-read every pass so newly imported cameras join.
  pub async fn run(&self) -> Result<(), IndexError> {
    loop {
      self.run_pass().await?;
    }
  }
}
