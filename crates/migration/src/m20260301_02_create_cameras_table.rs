use sea_orm_migration::{
  prelude::*,
  schema::{custom, double, string, timestamp_with_time_zone_null},
  sea_orm::Statement,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Cameras::Table)
          .if_not_exists()
          .col(string(Cameras::CameraId).primary_key())
          .col(double(Cameras::Latitude))
          .col(double(Cameras::Longitude))
          .col(custom(Cameras::Embedding, "vector(512)").not_null())
          .col(timestamp_with_time_zone_null(Cameras::LastUpdated))
          .to_owned(),
      )
      .await?;

    // HNSW index for cosine distance search
    manager
      .get_connection()
      .execute_raw(Statement::from_string(
        manager.get_database_backend(),
        "CREATE INDEX IF NOT EXISTS idx_cameras_embedding_hnsw ON cameras USING hnsw (embedding vector_cosine_ops);",
      ))
      .await?;

    Ok(())
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(Cameras::Table).to_owned())
      .await?;

    Ok(())
  }
}

#[derive(Iden)]
pub enum Cameras {
  Table,

  // upstream camera id (nyctmc uuid)
  CameraId,
  Latitude,
  Longitude,
  // CLIP image embedding of the latest frame
  Embedding,
  // when the embedding was last refreshed, null until first indexed
  LastUpdated,
}
