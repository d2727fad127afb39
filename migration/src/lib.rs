pub use sea_orm_migration::prelude::*;

mod m20251001_000001_create_prize_tiers;
mod m20251001_000002_create_draw_entries;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251001_000001_create_prize_tiers::Migration),
            Box::new(m20251001_000002_create_draw_entries::Migration),
        ]
    }
}
