use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// NULLs are distinct in `idx_affiliation_identity`, so rows without an expert
// panel ID need their own partial index. Both PostgreSQL and SQLite accept it.
const INDEX: &str = "idx_affiliation_identity_no_panel";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(&format!(
                "CREATE UNIQUE INDEX {INDEX} ON affiliation (affiliation_id) \
                 WHERE expert_panel_id IS NULL"
            ))
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name(INDEX).to_owned())
            .await?;

        Ok(())
    }
}
