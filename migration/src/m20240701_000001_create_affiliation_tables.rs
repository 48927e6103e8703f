use sea_orm_migration::{prelude::*, schema::*};

use crate::iden::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create Affiliation Table
        let table = table_auto(Affiliation::Table)
            .col(pk_auto(Affiliation::Id))
            .col(integer(Affiliation::AffiliationId))
            .col(integer_null(Affiliation::ExpertPanelId))
            .col(string(Affiliation::Type))
            .col(string(Affiliation::FullName))
            .col(string_null(Affiliation::ShortName))
            .col(string(Affiliation::Status))
            .col(string(Affiliation::ClinicalDomainWorkingGroup).default("NONE"))
            .col(text(Affiliation::Members).default(""))
            .col(boolean(Affiliation::IsDeleted).default(false))
            .check(
                Expr::col(Affiliation::AffiliationId)
                    .gte(10000)
                    .and(Expr::col(Affiliation::AffiliationId).lt(20000)),
            )
            .to_owned();
        manager.create_table(table).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_affiliation_identity")
                    .table(Affiliation::Table)
                    .col(Affiliation::AffiliationId)
                    .col(Affiliation::ExpertPanelId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create Coordinator Table
        let table = table_auto(Coordinator::Table)
            .col(pk_auto(Coordinator::Id))
            .col(integer(Coordinator::AffiliationRowId))
            .col(string(Coordinator::CoordinatorName))
            .col(string_null(Coordinator::CoordinatorEmail))
            .foreign_key(
                ForeignKey::create()
                    .name("fk_coordinator_affiliation")
                    .from(Coordinator::Table, Coordinator::AffiliationRowId)
                    .to(Affiliation::Table, Affiliation::Id)
                    .on_delete(ForeignKeyAction::Cascade),
            )
            .to_owned();
        manager.create_table(table).await?;

        // Create Approver Table
        let table = table_auto(Approver::Table)
            .col(pk_auto(Approver::Id))
            .col(integer(Approver::AffiliationRowId))
            .col(string(Approver::ApproverName))
            .foreign_key(
                ForeignKey::create()
                    .name("fk_approver_affiliation")
                    .from(Approver::Table, Approver::AffiliationRowId)
                    .to(Affiliation::Table, Affiliation::Id)
                    .on_delete(ForeignKeyAction::Cascade),
            )
            .to_owned();
        manager.create_table(table).await?;

        // Create Submitter Table
        let table = table_auto(Submitter::Table)
            .col(pk_auto(Submitter::Id))
            .col(integer(Submitter::AffiliationRowId))
            .col(string(Submitter::ClinvarSubmitterId))
            .foreign_key(
                ForeignKey::create()
                    .name("fk_submitter_affiliation")
                    .from(Submitter::Table, Submitter::AffiliationRowId)
                    .to(Affiliation::Table, Affiliation::Id)
                    .on_delete(ForeignKeyAction::Cascade),
            )
            .to_owned();
        manager.create_table(table).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Submitter::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Approver::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Coordinator::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Affiliation::Table).to_owned())
            .await?;

        Ok(())
    }
}
