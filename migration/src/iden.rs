use sea_orm_migration::prelude::*;

// Define table names
#[derive(DeriveIden)]
pub enum Affiliation {
    Table,
    Id,
    AffiliationId,
    ExpertPanelId,
    Type,
    FullName,
    ShortName,
    Status,
    ClinicalDomainWorkingGroup,
    Members,
    IsDeleted,
}

#[derive(DeriveIden)]
pub enum Coordinator {
    Table,
    Id,
    AffiliationRowId,
    CoordinatorName,
    CoordinatorEmail,
}

#[derive(DeriveIden)]
pub enum Approver {
    Table,
    Id,
    AffiliationRowId,
    ApproverName,
}

#[derive(DeriveIden)]
pub enum Submitter {
    Table,
    Id,
    AffiliationRowId,
    ClinvarSubmitterId,
}

#[derive(DeriveIden)]
pub enum User {
    Table,
    Id,
    Username,
    PasswordHash,
    LastLogin,
}
