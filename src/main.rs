use std::sync::Arc;

use camsight_ai::{EmbedError, EmbeddingProvider};
use camsight_core::{
  BestMatchPolicy, CameraImages, CameraSearch, MatchEngine, PgCameraStore, SearchConfig,
};
use camsight_entities::camera::EMBEDDING_DIM;
use camsight_migration::{Migrator, MigratorTrait};
use camsight_server::{server, utils::AppState};
use camsight_shared::{APP_ENV, AppError};
use sea_orm::Database;
use tracing_error::ErrorLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), AppError> {
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
          format!(
            "{}=debug,camsight_core=debug,camsight_server=debug",
            env!("CARGO_CRATE_NAME")
          )
          .into()
        }),
    )
    .with(tracing_subscriber::fmt::layer())
    .with(ErrorLayer::default())
    .init();
  dotenvy::dotenv().ok();

  let db = Database::connect(APP_ENV.database_url.as_str()).await?;

  // Apply all pending migrations
  // https://www.sea-ql.org/SeaORM/docs/migration/running-migration/#migrating-programmatically
  Migrator::up(&db, None).await?;

  let store = Arc::new(PgCameraStore::new(db));
  let embedder = camsight_ai::embedder_from_env()?;
  if embedder.dimensions() != EMBEDDING_DIM {
    return Err(
      EmbedError::Dimension {
        expected: EMBEDDING_DIM,
        actual: embedder.dimensions(),
      }
      .into(),
    );
  }
  tracing::info!(provider = ?APP_ENV.embedding_provider, "embedding provider ready");

  let policy: BestMatchPolicy = APP_ENV.best_match_policy.parse()?;
  let search = CameraSearch::new(embedder, store.clone(), store)
    .with_engine(MatchEngine::with_policy(policy))
    .with_config(SearchConfig::from_env());
  let images = CameraImages::new(APP_ENV.camera_image_url_template.as_str())?;

  server(AppState::new(search, images), &APP_ENV.bind_addr).await
}
