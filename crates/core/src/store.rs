use async_trait::async_trait;
use camsight_entities::camera;
use sea_orm::{
  ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait, FromQueryResult, QueryOrder,
  QuerySelect, Statement,
  prelude::{Expr, PgVector},
};

use crate::{
  CameraSource, Candidate, EmbeddingStore, SearchParams, SimilaritySearchProvider, StoreError,
};

#[derive(Debug, FromQueryResult)]
struct CandidateRow {
  camera_id: String,
  latitude: Option<f64>,
  longitude: Option<f64>,
  distance: Option<f64>,
}

impl From<CandidateRow> for Candidate {
  fn from(row: CandidateRow) -> Self {
    Self {
      camera_id: row.camera_id,
      latitude: row.latitude,
      longitude: row.longitude,
      distance: row.distance,
    }
  }
}

/// pgvector-backed camera store.
#[derive(Clone, Debug)]
pub struct PgCameraStore {
  db: DatabaseConnection,
}

impl PgCameraStore {
  #[must_use]
  pub const fn new(db: DatabaseConnection) -> Self {
    Self { db }
  }
}

/// Nearest cameras by cosine distance (`<=>`).
///
/// Rows still holding the zero placeholder from the importer are excluded
/// twice over: they were never indexed (`last_updated IS NULL`) and their
/// distance is NaN, which Postgres orders above every number and which
/// passes `1 - NaN > $2`.
fn search_statement(embedding: &[f32], params: SearchParams) -> Statement {
  let sql = r"
    SELECT
      camera_id,
      latitude,
      longitude,
      (embedding <=> $1)::float8 AS distance
    FROM cameras
    WHERE last_updated IS NOT NULL
      AND (embedding <=> $1) <> 'NaN'::float8
      AND 1 - (embedding <=> $1) > $2
    ORDER BY embedding <=> $1
    LIMIT $3;
    ";

  let limit = i64::try_from(params.match_count).unwrap_or(i64::MAX);
  Statement::from_sql_and_values(
    DbBackend::Postgres,
    sql,
    vec![
      PgVector::from(embedding.to_vec()).into(),
      params.match_threshold.into(),
      limit.into(),
    ],
  )
}

/// Store a freshly computed camera embedding and mark the camera indexed.
fn update_statement(camera_id: &str, embedding: &[f32]) -> Statement {
  Statement::from_sql_and_values(
    DbBackend::Postgres,
    "UPDATE cameras SET embedding = $2, last_updated = NOW() WHERE camera_id = $1",
    vec![
      camera_id.into(),
      PgVector::from(embedding.to_vec()).into(),
    ],
  )
}

#[async_trait]
impl SimilaritySearchProvider for PgCameraStore {
  async fn search(
    &self,
    embedding: &[f32],
    params: SearchParams,
  ) -> Result<Vec<Candidate>, StoreError> {
    let rows = CandidateRow::find_by_statement(search_statement(embedding, params))
      .all(&self.db)
      .await?;
    Ok(rows.into_iter().map(Candidate::from).collect())
  }
}

#[async_trait]
impl CameraSource for PgCameraStore {
  async fn sample(&self, limit: u64) -> Result<Vec<Candidate>, StoreError> {
    let rows = camera::Entity::find()
      .select_only()
      .columns([
        camera::Column::CameraId,
        camera::Column::Latitude,
        camera::Column::Longitude,
      ])
      .column_as(Expr::cust("NULL::float8"), "distance")
      .limit(limit)
      .into_model::<CandidateRow>()
      .all(&self.db)
      .await?;

    Ok(rows.into_iter().map(Candidate::from).collect())
  }
}

#[async_trait]
impl EmbeddingStore for PgCameraStore {
  async fn camera_ids(&self) -> Result<Vec<String>, StoreError> {
    let ids = camera::Entity::find()
      .select_only()
      .column(camera::Column::CameraId)
      .order_by_asc(camera::Column::CameraId)
      .into_tuple::<String>()
      .all(&self.db)
      .await?;
    Ok(ids)
  }

  async fn store_embedding(&self, camera_id: &str, embedding: &[f32]) -> Result<u64, StoreError> {
    let result = self
      .db
      .execute_raw(update_statement(camera_id, embedding))
      .await?;
    Ok(result.rows_affected())
  }
}
