use serde::{Deserialize, Serialize};

use crate::entities::sea_orm_active_enums::{AffiliationStatus, AffiliationType, ClinicalDomain};
use crate::entities::{affiliation, approver, coordinator, submitter};

use super::validation::{self, ValidationErrors};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorEntry {
    pub coordinator_name: String,
    #[serde(default)]
    pub coordinator_email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproverEntry {
    pub approver_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitterEntry {
    pub clinvar_submitter_id: String,
}

impl From<coordinator::Model> for CoordinatorEntry {
    fn from(model: coordinator::Model) -> Self {
        Self {
            coordinator_name: model.coordinator_name,
            coordinator_email: model.coordinator_email,
        }
    }
}

impl From<approver::Model> for ApproverEntry {
    fn from(model: approver::Model) -> Self {
        Self {
            approver_name: model.approver_name,
        }
    }
}

impl From<submitter::Model> for SubmitterEntry {
    fn from(model: submitter::Model) -> Self {
        Self {
            clinvar_submitter_id: model.clinvar_submitter_id,
        }
    }
}

/// The child lists hanging off one affiliation row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contacts {
    #[serde(default)]
    pub coordinators: Vec<CoordinatorEntry>,
    #[serde(default)]
    pub approvers: Vec<ApproverEntry>,
    #[serde(default)]
    pub clinvar_submitter_ids: Vec<SubmitterEntry>,
}

impl Contacts {
    fn validate(&self, errors: &mut ValidationErrors) {
        for coordinator in &self.coordinators {
            if coordinator.coordinator_name.trim().is_empty() {
                errors.add_field(validation::COORDINATORS, "Coordinator name is required.");
            }
            if let Some(email) = coordinator.coordinator_email.as_deref() {
                if !looks_like_email(email.trim()) {
                    errors.add_field(
                        validation::COORDINATORS,
                        format!("Enter a valid email address: {email}"),
                    );
                }
            }
        }
        if self.approvers.iter().any(|a| a.approver_name.trim().is_empty()) {
            errors.add_field(validation::APPROVERS, "Approver name is required.");
        }
        if self
            .clinvar_submitter_ids
            .iter()
            .any(|s| s.clinvar_submitter_id.trim().is_empty())
        {
            errors.add_field(
                validation::CLINVAR_SUBMITTER_IDS,
                "ClinVar submitter ID is required.",
            );
        }
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

/// A submission creating a new affiliation row. Identity fields are
/// accepted so older clients can keep sending them, but they are derived.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewAffiliation {
    #[serde(rename = "type")]
    pub affiliation_type: AffiliationType,
    pub full_name: String,
    #[serde(default)]
    pub short_name: Option<String>,
    pub status: AffiliationStatus,
    #[serde(default)]
    pub clinical_domain_working_group: ClinicalDomain,
    #[serde(default)]
    pub members: String,
    #[serde(default)]
    pub affiliation_id: Option<i32>,
    #[serde(default)]
    pub expert_panel_id: Option<i32>,
    #[serde(flatten)]
    pub contacts: Contacts,
}

impl NewAffiliation {
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if self.full_name.trim().is_empty() {
            errors.add_field(validation::FULL_NAME, validation::REQUIRED);
        }
        self.contacts.validate(&mut errors);
        errors
    }
}

/// The editable part of an existing row.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AffiliationUpdate {
    pub full_name: String,
    #[serde(default)]
    pub short_name: Option<String>,
    pub status: AffiliationStatus,
    #[serde(flatten)]
    pub contacts: Contacts,
}

impl AffiliationUpdate {
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if self.full_name.trim().is_empty() {
            errors.add_field(validation::FULL_NAME, validation::REQUIRED);
        }
        self.contacts.validate(&mut errors);
        errors
    }
}

/// A stored row with its child lists, as served by the REST endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AffiliationRecord {
    #[serde(flatten)]
    pub affiliation: affiliation::Model,
    #[serde(flatten)]
    pub contacts: Contacts,
}

/// Trims, and maps blank to `None`.
pub(crate) fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_affiliation_accepts_the_rest_payload() {
        let input: NewAffiliation = serde_json::from_value(json!({
            "type": "GCEP",
            "full_name": "Test Success Result Affil",
            "short_name": "Successful",
            "status": "INACTIVE",
            "clinical_domain_working_group": "NEURODEVELOPMENTAL_DISORDERS",
            "members": "Bulbasaur, Charmander, Squirtle",
            "affiliation_id": 10000,
            "expert_panel_id": 40000,
            "coordinators": [
                { "coordinator_name": "Professor Oak", "coordinator_email": "ProfessorOak@email.com" }
            ],
            "approvers": [{ "approver_name": "Mew" }],
            "clinvar_submitter_ids": [{ "clinvar_submitter_id": "11" }],
        }))
        .unwrap();

        assert_eq!(input.affiliation_type, AffiliationType::Gcep);
        assert_eq!(input.expert_panel_id, Some(40_000));
        assert_eq!(input.contacts.coordinators[0].coordinator_name, "Professor Oak");
        assert_eq!(input.contacts.approvers[0].approver_name, "Mew");
        assert!(input.validate().is_empty());
    }

    #[test]
    fn clinical_domain_defaults_to_none() {
        let input: NewAffiliation = serde_json::from_value(json!({
            "type": "INDEPENDENT_CURATION",
            "full_name": "Johto Curators",
            "status": "APPLYING",
        }))
        .unwrap();

        assert_eq!(input.clinical_domain_working_group, ClinicalDomain::Unassigned);
        assert_eq!(input.contacts, Contacts::default());
    }

    #[test]
    fn validation_collects_every_blank_field() {
        let input = AffiliationUpdate {
            full_name: "  ".to_string(),
            short_name: None,
            status: AffiliationStatus::Active,
            contacts: Contacts {
                coordinators: vec![CoordinatorEntry {
                    coordinator_name: String::new(),
                    coordinator_email: Some("not-an-email".to_string()),
                }],
                approvers: vec![ApproverEntry::default()],
                clinvar_submitter_ids: vec![SubmitterEntry::default()],
            },
        };

        let errors = input.validate();

        assert_eq!(errors.field(validation::FULL_NAME), [validation::REQUIRED]);
        assert_eq!(errors.field(validation::COORDINATORS).len(), 2);
        assert_eq!(errors.field(validation::APPROVERS).len(), 1);
        assert_eq!(errors.field(validation::CLINVAR_SUBMITTER_IDS).len(), 1);
    }

    #[test]
    fn email_check_is_permissive_but_not_blind() {
        assert!(looks_like_email("ProfessorBirch@email.com"));
        assert!(looks_like_email("a.b+c@lab.example.org"));
        assert!(!looks_like_email("birch"));
        assert!(!looks_like_email("@email.com"));
        assert!(!looks_like_email("birch@localhost"));
        assert!(!looks_like_email("birch @email.com"));
    }

    #[test]
    fn record_flattens_row_and_children() {
        let record = AffiliationRecord {
            affiliation: affiliation::Model {
                id: 2,
                affiliation_id: 10_001,
                expert_panel_id: None,
                r#type: AffiliationType::IndependentCuration,
                full_name: "Hoenn Pokémon".to_string(),
                short_name: Some("Hoenn".to_string()),
                status: AffiliationStatus::Active,
                clinical_domain_working_group: ClinicalDomain::Unassigned,
                members: "Treecko, Torchic, Mudkip".to_string(),
                is_deleted: false,
            },
            contacts: Contacts {
                approvers: vec![ApproverEntry {
                    approver_name: "Groudon".to_string(),
                }],
                ..Contacts::default()
            },
        };

        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["type"], "INDEPENDENT_CURATION");
        assert_eq!(json["clinical_domain_working_group"], "NONE");
        assert_eq!(json["expert_panel_id"], serde_json::Value::Null);
        assert_eq!(json["approvers"], json!([{ "approver_name": "Groudon" }]));
        assert_eq!(json["coordinators"], json!([]));
    }

    #[test]
    fn clean_optional_drops_blank_strings() {
        assert_eq!(clean_optional(Some("  ".into())), None);
        assert_eq!(clean_optional(Some(" Hoenn ".into())), Some("Hoenn".into()));
        assert_eq!(clean_optional(None), None);
    }
}
