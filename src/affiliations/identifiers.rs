//! Affiliation and expert panel ID assignment.
//!
//! A new affiliation row gets the next free affiliation ID and, for panel
//! types, an expert panel ID at a fixed offset from it:
//!
//! | type                   | expert panel ID                    |
//! |------------------------|------------------------------------|
//! | `GCEP`                 | `affiliation_id - 10000 + 40000`   |
//! | `VCEP`, `SC_VCEP`      | `affiliation_id - 10000 + 50000`   |
//! | `INDEPENDENT_CURATION` | none                               |
//!
//! Nothing here touches the database. Callers read the current maximum
//! affiliation ID under a lock, call [`resolve`], run the uniqueness check,
//! and insert within the same transaction.

use std::ops::Range;

use crate::entities::affiliation;
use crate::entities::sea_orm_active_enums::{AffiliationType, ClinicalDomain};

use super::validation::{self, ValidationErrors};

pub const AFFILIATION_ID_RANGE: Range<i32> = 10_000..20_000;
pub const GCEP_ID_RANGE: Range<i32> = 40_000..50_000;
pub const VCEP_ID_RANGE: Range<i32> = 50_000..60_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub affiliation_id: i32,
    pub expert_panel_id: Option<i32>,
}

impl From<&affiliation::Model> for Identity {
    fn from(model: &affiliation::Model) -> Self {
        Self {
            affiliation_id: model.affiliation_id,
            expert_panel_id: model.expert_panel_id,
        }
    }
}

/// A record about to be written. `persisted` is set once the row exists.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub affiliation_type: AffiliationType,
    pub clinical_domain: ClinicalDomain,
    pub requested_expert_panel_id: Option<i32>,
    pub persisted: Option<Identity>,
}

impl Candidate {
    pub fn new(affiliation_type: AffiliationType, clinical_domain: ClinicalDomain) -> Self {
        Self {
            affiliation_type,
            clinical_domain,
            requested_expert_panel_id: None,
            persisted: None,
        }
    }

    pub fn existing(model: &affiliation::Model) -> Self {
        Self {
            affiliation_type: model.r#type,
            clinical_domain: model.clinical_domain_working_group,
            requested_expert_panel_id: model.expert_panel_id,
            persisted: Some(Identity::from(model)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    pub identity: Identity,
    pub clinical_domain: ClinicalDomain,
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub assignment: Assignment,
    pub errors: ValidationErrors,
}

/// `10000` for an empty table, otherwise one past the current maximum.
/// Soft-deleted rows count, so their IDs are never handed out again.
pub fn next_affiliation_id(current_max: Option<i32>) -> i32 {
    current_max.map_or(AFFILIATION_ID_RANGE.start, |max| max.saturating_add(1))
}

fn panel_base(affiliation_type: AffiliationType) -> Option<i32> {
    match affiliation_type {
        AffiliationType::Gcep => Some(GCEP_ID_RANGE.start),
        AffiliationType::Vcep | AffiliationType::ScVcep => Some(VCEP_ID_RANGE.start),
        AffiliationType::IndependentCuration => None,
    }
}

fn panel_range(affiliation_type: AffiliationType) -> Option<(&'static str, Range<i32>)> {
    match affiliation_type {
        AffiliationType::Gcep => Some(("GCEP", GCEP_ID_RANGE)),
        AffiliationType::Vcep | AffiliationType::ScVcep => Some(("VCEP", VCEP_ID_RANGE)),
        AffiliationType::IndependentCuration => None,
    }
}

pub fn expert_panel_id_for(affiliation_id: i32, affiliation_type: AffiliationType) -> Option<i32> {
    panel_base(affiliation_type).map(|base| affiliation_id - AFFILIATION_ID_RANGE.start + base)
}

pub fn clinical_domain_for(
    affiliation_type: AffiliationType,
    requested: ClinicalDomain,
) -> ClinicalDomain {
    match affiliation_type {
        AffiliationType::ScVcep => ClinicalDomain::SomaticCancer,
        AffiliationType::IndependentCuration => ClinicalDomain::Unassigned,
        _ => requested,
    }
}

/// Range and offset checks for an identity of the given type.
pub fn check_identity(affiliation_type: AffiliationType, identity: Identity) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    let affiliation_id = identity.affiliation_id;
    let affiliation_id_ok = AFFILIATION_ID_RANGE.contains(&affiliation_id);
    if !affiliation_id_ok {
        errors.add_field(
            validation::AFFILIATION_ID,
            format!(
                "Affiliation ID out of range. Affiliation ID must be between {} and {}.",
                AFFILIATION_ID_RANGE.start,
                AFFILIATION_ID_RANGE.end - 1
            ),
        );
    }

    match (panel_range(affiliation_type), identity.expert_panel_id) {
        (Some((kind, range)), Some(expert_panel_id)) => {
            if !range.contains(&expert_panel_id) {
                errors.add_field(
                    validation::EXPERT_PANEL_ID,
                    format!(
                        "{kind} ID out of range. {kind} ID must be between {} and {}.",
                        range.start,
                        range.end - 1
                    ),
                );
            } else if affiliation_id_ok
                && expert_panel_id - range.start != affiliation_id - AFFILIATION_ID_RANGE.start
            {
                errors.add_general(format!(
                    "Affiliation ID {affiliation_id} and {kind} ID {expert_panel_id} do not match. \
                     The last four digits of both IDs must be the same."
                ));
            }
        }
        (Some((kind, _)), None) => {
            errors.add_field(
                validation::EXPERT_PANEL_ID,
                format!("A {kind} affiliation requires an expert panel ID."),
            );
        }
        (None, Some(_)) => {
            errors.add_field(
                validation::EXPERT_PANEL_ID,
                "An Independent Curation Group cannot have an expert panel ID.",
            );
        }
        (None, None) => {}
    }

    errors
}

pub fn duplicate_identity_message(identity: Identity) -> String {
    match identity.expert_panel_id {
        Some(expert_panel_id) => format!(
            "An affiliation with affiliation ID {} and expert panel ID {expert_panel_id} already exists.",
            identity.affiliation_id
        ),
        None => format!(
            "An affiliation with affiliation ID {} and no expert panel ID already exists.",
            identity.affiliation_id
        ),
    }
}

/// Decides the identity of `candidate`.
///
/// Rows that already exist keep their identity untouched. New rows get a
/// fresh affiliation ID from `current_max` and a derived expert panel ID;
/// every applicable error is reported in the returned [`Resolution`].
pub fn resolve(candidate: &Candidate, current_max: Option<i32>) -> Resolution {
    if let Some(identity) = candidate.persisted {
        return Resolution {
            assignment: Assignment {
                identity,
                clinical_domain: candidate.clinical_domain,
            },
            errors: ValidationErrors::new(),
        };
    }

    let affiliation_type = candidate.affiliation_type;
    let mut errors = ValidationErrors::new();
    if candidate.requested_expert_panel_id.is_some() {
        match affiliation_type {
            AffiliationType::IndependentCuration => errors.add_field(
                validation::EXPERT_PANEL_ID,
                "An Independent Curation Group cannot have an expert panel ID.",
            ),
            AffiliationType::ScVcep => errors.add_field(
                validation::EXPERT_PANEL_ID,
                "SC-VCEP expert panel IDs are assigned automatically and cannot be supplied.",
            ),
            AffiliationType::Gcep | AffiliationType::Vcep => {}
        }
    }

    let affiliation_id = next_affiliation_id(current_max);
    let identity = Identity {
        affiliation_id,
        expert_panel_id: expert_panel_id_for(affiliation_id, affiliation_type),
    };
    errors.extend(check_identity(affiliation_type, identity));

    Resolution {
        assignment: Assignment {
            identity,
            clinical_domain: clinical_domain_for(affiliation_type, candidate.clinical_domain),
        },
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::sea_orm_active_enums::AffiliationStatus;

    fn identity(affiliation_id: i32, expert_panel_id: Option<i32>) -> Identity {
        Identity {
            affiliation_id,
            expert_panel_id,
        }
    }

    #[test]
    fn first_affiliation_starts_at_ten_thousand() {
        assert_eq!(next_affiliation_id(None), 10_000);
    }

    #[test]
    fn next_affiliation_id_follows_the_maximum() {
        assert_eq!(next_affiliation_id(Some(10_000)), 10_001);
        assert_eq!(next_affiliation_id(Some(10_417)), 10_418);
    }

    #[test]
    fn gcep_ids_are_offset_into_the_forty_thousands() {
        for affiliation_id in [10_000, 10_001, 12_345, 19_999] {
            let expert_panel_id = expert_panel_id_for(affiliation_id, AffiliationType::Gcep).unwrap();
            assert_eq!(expert_panel_id, affiliation_id + 30_000);
            assert!(GCEP_ID_RANGE.contains(&expert_panel_id));
        }
    }

    #[test]
    fn vcep_and_sc_vcep_ids_are_offset_into_the_fifty_thousands() {
        for affiliation_type in [AffiliationType::Vcep, AffiliationType::ScVcep] {
            for affiliation_id in [10_000, 10_050, 19_999] {
                let expert_panel_id = expert_panel_id_for(affiliation_id, affiliation_type).unwrap();
                assert_eq!(expert_panel_id, affiliation_id + 40_000);
                assert!(VCEP_ID_RANGE.contains(&expert_panel_id));
            }
        }
    }

    #[test]
    fn independent_curation_groups_have_no_expert_panel_id() {
        assert_eq!(
            expert_panel_id_for(10_000, AffiliationType::IndependentCuration),
            None
        );
    }

    #[test]
    fn resolve_assigns_ids_for_a_new_gcep() {
        let candidate = Candidate::new(AffiliationType::Gcep, ClinicalDomain::KidneyDisease);
        let resolution = resolve(&candidate, Some(10_006));

        assert!(resolution.errors.is_empty(), "{}", resolution.errors);
        assert_eq!(resolution.assignment.identity, identity(10_007, Some(40_007)));
        assert_eq!(
            resolution.assignment.clinical_domain,
            ClinicalDomain::KidneyDisease
        );
    }

    #[test]
    fn resolve_ignores_a_supplied_gcep_or_vcep_panel_id() {
        for affiliation_type in [AffiliationType::Gcep, AffiliationType::Vcep] {
            let mut candidate = Candidate::new(affiliation_type, ClinicalDomain::Unassigned);
            candidate.requested_expert_panel_id = Some(12);

            let resolution = resolve(&candidate, None);

            assert!(resolution.errors.is_empty(), "{}", resolution.errors);
            assert_eq!(
                resolution.assignment.identity.expert_panel_id,
                expert_panel_id_for(10_000, affiliation_type)
            );
        }
    }

    #[test]
    fn sc_vcep_is_always_somatic_cancer() {
        for requested in [
            ClinicalDomain::Unassigned,
            ClinicalDomain::Cardiovascular,
            ClinicalDomain::SomaticCancer,
        ] {
            let candidate = Candidate::new(AffiliationType::ScVcep, requested);
            let resolution = resolve(&candidate, Some(10_000));
            assert_eq!(
                resolution.assignment.clinical_domain,
                ClinicalDomain::SomaticCancer
            );
            assert_eq!(resolution.assignment.identity, identity(10_001, Some(50_001)));
        }
    }

    #[test]
    fn independent_curation_never_keeps_a_domain() {
        for requested in [
            ClinicalDomain::Unassigned,
            ClinicalDomain::Cardiovascular,
            ClinicalDomain::SomaticCancer,
        ] {
            let candidate = Candidate::new(AffiliationType::IndependentCuration, requested);
            let resolution = resolve(&candidate, Some(10_000));
            assert!(resolution.errors.is_empty(), "{}", resolution.errors);
            assert_eq!(
                resolution.assignment.clinical_domain,
                ClinicalDomain::Unassigned
            );
            assert_eq!(resolution.assignment.identity, identity(10_001, None));
        }
    }

    #[test]
    fn supplied_panel_id_is_rejected_for_independent_curation() {
        let mut candidate =
            Candidate::new(AffiliationType::IndependentCuration, ClinicalDomain::Other);
        candidate.requested_expert_panel_id = Some(60_000);

        let resolution = resolve(&candidate, None);

        assert_eq!(resolution.errors.field(validation::EXPERT_PANEL_ID).len(), 1);
        assert_eq!(resolution.assignment.identity, identity(10_000, None));
    }

    #[test]
    fn supplied_panel_id_is_rejected_for_sc_vcep() {
        let mut candidate = Candidate::new(AffiliationType::ScVcep, ClinicalDomain::Unassigned);
        candidate.requested_expert_panel_id = Some(50_000);

        let resolution = resolve(&candidate, None);

        assert_eq!(resolution.errors.field(validation::EXPERT_PANEL_ID).len(), 1);
    }

    #[test]
    fn exhausted_id_space_reports_every_range_error() {
        let candidate = Candidate::new(AffiliationType::Vcep, ClinicalDomain::Unassigned);
        let resolution = resolve(&candidate, Some(19_999));

        assert_eq!(resolution.assignment.identity, identity(20_000, Some(60_000)));
        assert_eq!(resolution.errors.field(validation::AFFILIATION_ID).len(), 1);
        assert_eq!(resolution.errors.field(validation::EXPERT_PANEL_ID).len(), 1);
        assert!(resolution.errors.general().is_empty());
    }

    #[test]
    fn check_identity_flags_a_low_affiliation_id() {
        let errors = check_identity(AffiliationType::Gcep, identity(2, Some(40_000)));
        assert_eq!(errors.field(validation::AFFILIATION_ID).len(), 1);
    }

    #[test]
    fn check_identity_flags_out_of_band_panel_ids() {
        let errors = check_identity(AffiliationType::Gcep, identity(10_000, Some(30_000)));
        assert_eq!(
            errors.field(validation::EXPERT_PANEL_ID),
            ["GCEP ID out of range. GCEP ID must be between 40000 and 49999."]
        );

        let errors = check_identity(AffiliationType::Vcep, identity(10_000, Some(60_000)));
        assert_eq!(
            errors.field(validation::EXPERT_PANEL_ID),
            ["VCEP ID out of range. VCEP ID must be between 50000 and 59999."]
        );
    }

    #[test]
    fn check_identity_reports_offset_mismatch_as_general_error() {
        let errors = check_identity(AffiliationType::Vcep, identity(10_001, Some(50_002)));
        assert!(errors.field(validation::AFFILIATION_ID).is_empty());
        assert!(errors.field(validation::EXPERT_PANEL_ID).is_empty());
        assert_eq!(errors.general().len(), 1);
    }

    #[test]
    fn check_identity_rejects_panel_id_on_independent_curation() {
        let errors =
            check_identity(AffiliationType::IndependentCuration, identity(10_001, Some(60_000)));
        assert_eq!(errors.field(validation::EXPERT_PANEL_ID).len(), 1);
    }

    #[test]
    fn check_identity_requires_panel_id_for_panels() {
        let errors = check_identity(AffiliationType::Gcep, identity(10_001, None));
        assert_eq!(errors.field(validation::EXPERT_PANEL_ID).len(), 1);
    }

    #[test]
    fn existing_rows_keep_their_identity() {
        let model = affiliation::Model {
            id: 4,
            affiliation_id: 10_003,
            expert_panel_id: Some(40_003),
            r#type: AffiliationType::Gcep,
            full_name: "Kanto GCEP".to_string(),
            short_name: None,
            status: AffiliationStatus::Active,
            clinical_domain_working_group: ClinicalDomain::Ocular,
            members: String::new(),
            is_deleted: false,
        };

        let resolution = resolve(&Candidate::existing(&model), Some(10_900));

        assert!(resolution.errors.is_empty());
        assert_eq!(resolution.assignment.identity, identity(10_003, Some(40_003)));
        assert_eq!(resolution.assignment.clinical_domain, ClinicalDomain::Ocular);
    }

    #[test]
    fn duplicate_message_names_both_ids() {
        let message = duplicate_identity_message(identity(10_000, Some(40_000)));
        assert!(message.contains("10000"));
        assert!(message.contains("40000"));
    }
}
