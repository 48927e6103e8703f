pub use sea_orm_migration::prelude::*;

mod iden;
mod m20240701_000001_create_affiliation_tables;
mod m20240701_000002_create_user_table;
mod m20240702_000003_unique_unpaneled_identity;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240701_000001_create_affiliation_tables::Migration),
            Box::new(m20240701_000002_create_user_table::Migration),
            Box::new(m20240702_000003_unique_unpaneled_identity::Migration),
        ]
    }
}
