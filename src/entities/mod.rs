//! `SeaORM` entities for the affiliations schema.

pub mod affiliation;
pub mod approver;
pub mod coordinator;
pub mod sea_orm_active_enums;
pub mod submitter;
pub mod user;
