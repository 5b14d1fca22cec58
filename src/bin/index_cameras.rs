use std::{sync::Arc, time::Duration};

use camsight_ai::{EmbedError, ImageEmbeddingProvider, RoboflowImageEmbedder};
use camsight_core::{
  CameraImages, PgCameraStore,
  index::{CameraIndexer, HttpStills},
};
use camsight_entities::camera::EMBEDDING_DIM;
use camsight_migration::{Migrator, MigratorTrait};
use camsight_shared::{APP_ENV, AppError};
use sea_orm::Database;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Usage: `index_cameras [--once]`
///
/// Cycles through every camera in the store, embedding its live still.
/// `--once` stops after a single pass.
#[tokio::main]
async fn main() -> Result<(), AppError> {
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "index_cameras=info,camsight_core=info,camsight_ai=info".into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();
  dotenvy::dotenv().ok();

  let once = std::env::args().skip(1).any(|arg| arg == "--once");

  let embedder = RoboflowImageEmbedder::from_env()?;
  if embedder.dimensions() != EMBEDDING_DIM {
    return Err(
      EmbedError::Dimension {
        expected: EMBEDDING_DIM,
        actual: embedder.dimensions(),
      }
      .into(),
    );
  }
  let images = CameraImages::new(APP_ENV.camera_image_url_template.as_str())?;

  let db = Database::connect(APP_ENV.database_url.as_str()).await?;
  Migrator::up(&db, None).await?;

  let indexer = CameraIndexer::new(
    Arc::new(PgCameraStore::new(db)),
    Arc::new(HttpStills::new(reqwest::Client::new(), images)),
    Arc::new(embedder),
  )
  .with_interval(Duration::from_secs(APP_ENV.index_interval_secs));

  if once {
    let summary = indexer.run_pass().await?;
    tracing::info!(indexed = summary.indexed, failed = summary.failed, "done");
  } else {
    tracing::info!(interval_secs = APP_ENV.index_interval_secs, "indexing cameras");
    indexer.run().await?;
  }

  Ok(())
}
