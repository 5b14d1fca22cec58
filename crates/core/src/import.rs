//! Seeding the `cameras` table from a camera list export.
//!
//! The export is a JSON array of objects carrying at least `id`, `lat` and
//! `lng` (`latitude`/`longitude` are accepted too). Imported cameras get a
//! zero embedding until the indexer fills in a real one; rows already present
//! only have their coordinates refreshed.

use std::path::Path;

use sea_orm::{
  ConnectionTrait, DatabaseConnection, DbBackend, DbErr, Statement, TransactionTrait,
  prelude::PgVector,
};
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
  #[error("reading camera list failed: {0}")]
  Io(#[from] std::io::Error),

  #[error("camera list is not a JSON array of cameras: {0}")]
  Json(#[from] serde_json::Error),

  #[error("database error: {0}")]
  Db(#[from] DbErr),
}

#[derive(Debug, Deserialize)]
struct RawCamera {
  id: Option<String>,
  #[serde(alias = "latitude")]
  lat: Option<f64>,
  #[serde(alias = "longitude")]
  lng: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CameraSeed {
  pub camera_id: String,
  pub latitude: f64,
  pub longitude: f64,
}

/// Parse a camera list, skipping entries without an id or coordinates.
pub fn parse_cameras(json: &str) -> Result<Vec<CameraSeed>, ImportError> {
  let raw: Vec<RawCamera> = serde_json::from_str(json)?;
  let total = raw.len();

  let seeds = raw
    .into_iter()
    .enumerate()
    .filter_map(|(i, cam)| {
      match (cam.id.filter(|id| !id.is_empty()), cam.lat, cam.lng) {
        (Some(camera_id), Some(latitude), Some(longitude))
          if latitude.is_finite() && longitude.is_finite() =>
        {
          Some(CameraSeed {
            camera_id,
            latitude,
            longitude,
          })
        }
        _ => {
          warn!(index = i, "skipping camera without id or coordinates");
          None
        }
      }
    })
    .collect::<Vec<_>>();

  if seeds.len() < total {
    warn!(skipped = total - seeds.len(), total, "some cameras were skipped");
  }

  Ok(seeds)
}

pub fn read_cameras(path: &Path) -> Result<Vec<CameraSeed>, ImportError> {
  let json = std::fs::read_to_string(path)?;
  parse_cameras(&json)
}

/// Upsert cameras in one transaction. Returns the number of rows written.
pub async fn import_cameras(
  seeds: &[CameraSeed],
  embedding_dim: usize,
  db: &DatabaseConnection,
) -> Result<u64, ImportError> {
  let sql = "INSERT INTO cameras (camera_id, latitude, longitude, embedding) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (camera_id) DO UPDATE \
             SET latitude = EXCLUDED.latitude, longitude = EXCLUDED.longitude";

  let zero = PgVector::from(vec![0.0_f32; embedding_dim]);
  let txn = db.begin().await?;
  let mut written = 0;

  for seed in seeds {
    let result = txn
      .execute_raw(Statement::from_sql_and_values(
        DbBackend::Postgres,
        sql,
        vec![
          seed.camera_id.clone().into(),
          seed.latitude.into(),
          seed.longitude.into(),
          zero.clone().into(),
        ],
      ))
      .await?;
    written += result.rows_affected();
  }

  txn.commit().await?;
  Ok(written)
}
