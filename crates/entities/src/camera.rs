use sea_orm::entity::prelude::*;

/// Width of the `embedding` column (`vector(512)`).
pub const EMBEDDING_DIM: usize = 512;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "cameras")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub camera_id: String,
  #[sea_orm(column_type = "Double")]
  pub latitude: f64,
  #[sea_orm(column_type = "Double")]
  pub longitude: f64,
  pub embedding: PgVector,
  pub last_updated: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
