use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A person allowed to approve curations on behalf of an affiliation row.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "approver")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub affiliation_row_id: i32,
    pub approver_name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::affiliation::Entity",
        from = "Column::AffiliationRowId",
        to = "super::affiliation::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Affiliation,
}

impl Related<super::affiliation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Affiliation.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
