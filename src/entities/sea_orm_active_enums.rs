use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Panel classification of an affiliation row.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AffiliationType {
    #[sea_orm(string_value = "VCEP")]
    Vcep,
    #[sea_orm(string_value = "GCEP")]
    Gcep,
    #[sea_orm(string_value = "SC_VCEP")]
    ScVcep,
    #[sea_orm(string_value = "INDEPENDENT_CURATION")]
    IndependentCuration,
}

impl AffiliationType {
    pub fn label(&self) -> &'static str {
        match self {
            AffiliationType::Vcep => "Variant Curation Expert Panel",
            AffiliationType::Gcep => "Gene Curation Expert Panel",
            AffiliationType::ScVcep => "Somatic Cancer Variant Curation Expert Panel",
            AffiliationType::IndependentCuration => "Independent Curation Group",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AffiliationStatus {
    #[sea_orm(string_value = "APPLYING")]
    Applying,
    #[sea_orm(string_value = "ACTIVE")]
    Active,
    #[sea_orm(string_value = "INACTIVE")]
    Inactive,
    #[sea_orm(string_value = "RETIRED")]
    Retired,
    #[sea_orm(string_value = "ARCHIVED")]
    Archived,
}

impl AffiliationStatus {
    pub fn label(&self) -> &'static str {
        match self {
            AffiliationStatus::Applying => "Applying",
            AffiliationStatus::Active => "Active",
            AffiliationStatus::Inactive => "Inactive",
            AffiliationStatus::Retired => "Retired",
            AffiliationStatus::Archived => "Archived",
        }
    }
}

/// Clinical Domain Working Group an affiliation reports to.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClinicalDomain {
    #[default]
    #[serde(rename = "NONE")]
    #[sea_orm(string_value = "NONE")]
    Unassigned,
    #[sea_orm(string_value = "CARDIOVASCULAR")]
    Cardiovascular,
    #[sea_orm(string_value = "HEARING_LOSS")]
    HearingLoss,
    #[sea_orm(string_value = "HEMOSTASIS_THROMBOSIS")]
    HemostasisThrombosis,
    #[sea_orm(string_value = "HEREDITARY_CANCER")]
    HereditaryCancer,
    #[sea_orm(string_value = "IMMUNOLOGY")]
    Immunology,
    #[sea_orm(string_value = "INBORN_ERRORS_OF_METABOLISM")]
    InbornErrorsOfMetabolism,
    #[sea_orm(string_value = "KIDNEY_DISEASE")]
    KidneyDisease,
    #[sea_orm(string_value = "NEURODEVELOPMENTAL_DISORDERS")]
    NeurodevelopmentalDisorders,
    #[sea_orm(string_value = "NEUROLOGICAL_DISORDERS")]
    NeurologicalDisorders,
    #[sea_orm(string_value = "OCULAR")]
    Ocular,
    #[sea_orm(string_value = "OTHER")]
    Other,
    #[sea_orm(string_value = "PULMONARY")]
    Pulmonary,
    #[sea_orm(string_value = "RASOPATHY")]
    Rasopathy,
    #[sea_orm(string_value = "RHEUMATOLOGIC_AUTOIMMUNE_DISEASE")]
    RheumatologicAutoimmuneDisease,
    #[sea_orm(string_value = "SKELETAL_DISORDERS")]
    SkeletalDisorders,
    #[sea_orm(string_value = "SOMATIC_CANCER")]
    SomaticCancer,
}

impl ClinicalDomain {
    pub fn label(&self) -> &'static str {
        match self {
            ClinicalDomain::Unassigned => "None",
            ClinicalDomain::Cardiovascular => "Cardiovascular",
            ClinicalDomain::HearingLoss => "Hearing Loss",
            ClinicalDomain::HemostasisThrombosis => "Hemostasis/Thrombosis",
            ClinicalDomain::HereditaryCancer => "Hereditary Cancer",
            ClinicalDomain::Immunology => "Immunology",
            ClinicalDomain::InbornErrorsOfMetabolism => "Inborn Errors of Metabolism",
            ClinicalDomain::KidneyDisease => "Kidney Disease",
            ClinicalDomain::NeurodevelopmentalDisorders => "Neurodevelopmental Disorders",
            ClinicalDomain::NeurologicalDisorders => "Neurological Disorders",
            ClinicalDomain::Ocular => "Ocular",
            ClinicalDomain::Other => "Other",
            ClinicalDomain::Pulmonary => "Pulmonary",
            ClinicalDomain::Rasopathy => "RASopathy",
            ClinicalDomain::RheumatologicAutoimmuneDisease => "Rheumatologic Autoimmune Disease",
            ClinicalDomain::SkeletalDisorders => "Skeletal Disorders",
            ClinicalDomain::SomaticCancer => "Somatic Cancer",
        }
    }
}
