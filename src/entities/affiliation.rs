use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{AffiliationStatus, AffiliationType, ClinicalDomain};

/// One panel subgroup of an affiliation. Several rows may share an
/// `affiliation_id`, one per panel type.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "affiliation")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub affiliation_id: i32,
    pub expert_panel_id: Option<i32>,
    pub r#type: AffiliationType,
    pub full_name: String,
    pub short_name: Option<String>,
    pub status: AffiliationStatus,
    pub clinical_domain_working_group: ClinicalDomain,
    #[sea_orm(column_type = "Text")]
    pub members: String,
    pub is_deleted: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::coordinator::Entity")]
    Coordinator,
    #[sea_orm(has_many = "super::approver::Entity")]
    Approver,
    #[sea_orm(has_many = "super::submitter::Entity")]
    Submitter,
}

impl Related<super::coordinator::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Coordinator.def()
    }
}

impl Related<super::approver::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Approver.def()
    }
}

impl Related<super::submitter::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submitter.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
