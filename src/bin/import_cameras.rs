use std::path::PathBuf;

use camsight_core::import::{import_cameras, read_cameras};
use camsight_entities::camera::EMBEDDING_DIM;
use camsight_migration::{Migrator, MigratorTrait};
use camsight_shared::{APP_ENV, AppError};
use sea_orm::Database;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Usage: `import_cameras [cameras.json]`
#[tokio::main]
async fn main() -> Result<(), AppError> {
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "import_cameras=info,camsight_core=info".into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();
  dotenvy::dotenv().ok();

  let path = std::env::args_os()
    .nth(1)
    .map_or_else(|| PathBuf::from("cameras.json"), PathBuf::from);

  let seeds = read_cameras(&path)?;
  tracing::info!(path = %path.display(), cameras = seeds.len(), "camera list loaded");

  let db = Database::connect(APP_ENV.database_url.as_str()).await?;
  Migrator::up(&db, None).await?;

  let written = import_cameras(&seeds, EMBEDDING_DIM, &db).await?;
  tracing::info!(written, "cameras imported");

  Ok(())
}
