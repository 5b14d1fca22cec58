pub use sea_orm_migration::*;

mod m20260301_01_create_vector_extension;
mod m20260301_02_create_cameras_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
  fn migrations() -> Vec<Box<dyn MigrationTrait>> {
    vec![
      Box::new(m20260301_01_create_vector_extension::Migration),
      Box::new(m20260301_02_create_cameras_table::Migration),
    ]
  }
}
