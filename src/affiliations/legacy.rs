//! The nested affiliation document format consumed by older clients.
//!
//! Storage keeps one row per panel subgroup; the legacy format has one
//! document per affiliation ID with the subgroups folded in:
//!
//! ```json
//! {
//!   "affiliation_id": "10000",
//!   "affiliation_fullname": "Foo GCEP/VCEP",
//!   "subgroups": {
//!     "gcep": { "id": "40000", "fullname": "Foo GCEP" },
//!     "vcep": { "id": "50000", "fullname": "Foo VCEP" }
//!   },
//!   "approver": ["Mew", "Celebi"]
//! }
//! ```
//!
//! The full-name merge below is order dependent and asymmetric. Clients
//! compare against it byte for byte, so it stays exactly as it is.

use std::collections::HashMap;

use sea_orm::FromQueryResult;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::entities::approver;

/// One non-deleted affiliation row. `affiliation_type` is the raw stored
/// type code so rows with codes this build does not know still fold.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct LegacyRow {
    pub id: i32,
    pub affiliation_id: i32,
    pub affiliation_type: String,
    pub full_name: String,
    pub expert_panel_id: Option<i32>,
}

/// Approver names keyed by affiliation row id, in insertion order.
pub type ApproverIndex = HashMap<i32, Vec<String>>;

pub fn index_approvers(approvers: impl IntoIterator<Item = approver::Model>) -> ApproverIndex {
    let mut index = ApproverIndex::new();
    for approver in approvers {
        index
            .entry(approver.affiliation_row_id)
            .or_default()
            .push(approver.approver_name);
    }
    index
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegacySubgroup {
    pub id: Option<String>,
    pub fullname: String,
}

impl From<&LegacyRow> for LegacySubgroup {
    fn from(row: &LegacyRow) -> Self {
        Self {
            id: row.expert_panel_id.map(|id| id.to_string()),
            fullname: row.full_name.clone(),
        }
    }
}

/// Subgroups keyed by `"vcep"`/`"gcep"`, serialized as a JSON object in
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subgroups(Vec<(&'static str, LegacySubgroup)>);

impl Subgroups {
    fn get(&self, key: &str) -> Option<&LegacySubgroup> {
        self.0.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    #[cfg(test)]
    fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|(k, _)| *k)
    }

    fn insert(&mut self, key: &'static str, subgroup: LegacySubgroup) {
        self.0.push((key, subgroup));
    }
}

impl Serialize for Subgroups {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, subgroup) in &self.0 {
            map.serialize_entry(key, subgroup)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegacyAffiliation {
    pub affiliation_id: String,
    pub affiliation_fullname: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subgroups: Option<Subgroups>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approver: Option<Vec<String>>,
}

impl LegacyAffiliation {
    fn from_first_row(row: &LegacyRow) -> Self {
        let subgroups = subgroup_key(&row.affiliation_type).map(|key| {
            let mut subgroups = Subgroups::default();
            subgroups.insert(key, LegacySubgroup::from(row));
            subgroups
        });
        Self {
            affiliation_id: row.affiliation_id.to_string(),
            affiliation_fullname: row.full_name.clone(),
            subgroups,
            approver: None,
        }
    }

    fn merge_subgroup(&mut self, key: &'static str, row: &LegacyRow) {
        let subgroups = self.subgroups.get_or_insert_with(Subgroups::default);
        if subgroups.contains(key) {
            return;
        }
        let suffix = if self.affiliation_fullname.contains("VCEP")
            || self.affiliation_fullname.contains("GCEP")
        {
            &row.affiliation_type
        } else {
            &row.full_name
        };
        self.affiliation_fullname.push('/');
        self.affiliation_fullname.push_str(suffix);
        subgroups.insert(key, LegacySubgroup::from(row));
    }

    fn add_approvers(&mut self, names: &[String]) {
        if names.is_empty() {
            return;
        }
        self.approver
            .get_or_insert_with(Vec::new)
            .extend(names.iter().cloned());
    }
}

/// Subgroup key for a stored type code. Somatic cancer VCEPs present as
/// plain VCEPs; independent groups and unknown codes have no subgroup.
pub fn subgroup_key(affiliation_type: &str) -> Option<&'static str> {
    match affiliation_type {
        "VCEP" | "SC_VCEP" => Some("vcep"),
        "GCEP" => Some("gcep"),
        _ => None,
    }
}

/// Folds rows into one document per affiliation ID, in the order each ID
/// is first seen.
pub fn to_legacy_documents(rows: &[LegacyRow], approvers: &ApproverIndex) -> Vec<LegacyAffiliation> {
    let mut documents: Vec<LegacyAffiliation> = Vec::new();
    let mut positions: HashMap<i32, usize> = HashMap::new();

    for row in rows {
        let position = match positions.get(&row.affiliation_id) {
            Some(&position) => {
                if let Some(key) = subgroup_key(&row.affiliation_type) {
                    documents[position].merge_subgroup(key, row);
                }
                position
            }
            None => {
                documents.push(LegacyAffiliation::from_first_row(row));
                positions.insert(row.affiliation_id, documents.len() - 1);
                documents.len() - 1
            }
        };

        if let Some(names) = approvers.get(&row.id) {
            documents[position].add_approvers(names);
        }
    }

    documents
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(
        id: i32,
        affiliation_id: i32,
        affiliation_type: &str,
        full_name: &str,
        expert_panel_id: Option<i32>,
    ) -> LegacyRow {
        LegacyRow {
            id,
            affiliation_id,
            affiliation_type: affiliation_type.to_string(),
            full_name: full_name.to_string(),
            expert_panel_id,
        }
    }

    fn approvers(entries: &[(i32, &[&str])]) -> ApproverIndex {
        entries
            .iter()
            .map(|(id, names)| (*id, names.iter().map(|n| n.to_string()).collect()))
            .collect()
    }

    #[test]
    fn gcep_then_vcep_appends_the_type_label() {
        let rows = [
            row(1, 10_000, "GCEP", "Foo GCEP", Some(40_000)),
            row(2, 10_000, "VCEP", "Foo VCEP", Some(50_000)),
        ];

        let documents = to_legacy_documents(&rows, &ApproverIndex::new());

        assert_eq!(documents.len(), 1);
        assert_eq!(
            serde_json::to_value(&documents[0]).unwrap(),
            json!({
                "affiliation_id": "10000",
                "affiliation_fullname": "Foo GCEP/VCEP",
                "subgroups": {
                    "gcep": { "id": "40000", "fullname": "Foo GCEP" },
                    "vcep": { "id": "50000", "fullname": "Foo VCEP" },
                },
            })
        );
    }

    #[test]
    fn merge_appends_row_name_when_accumulated_name_has_no_panel_tag() {
        let rows = [
            row(1, 10_002, "VCEP", "Hoenn Variant Panel", Some(50_002)),
            row(2, 10_002, "GCEP", "Hoenn Gene Panel", Some(40_002)),
        ];

        let documents = to_legacy_documents(&rows, &ApproverIndex::new());

        assert_eq!(
            documents[0].affiliation_fullname,
            "Hoenn Variant Panel/Hoenn Gene Panel"
        );
    }

    #[test]
    fn independent_curation_has_no_subgroups_key() {
        let rows = [row(1, 10_001, "INDEPENDENT_CURATION", "Johto Curators", None)];

        let documents = to_legacy_documents(&rows, &ApproverIndex::new());

        assert_eq!(
            serde_json::to_value(&documents).unwrap(),
            json!([{ "affiliation_id": "10001", "affiliation_fullname": "Johto Curators" }])
        );
    }

    #[test]
    fn sc_vcep_is_keyed_as_vcep() {
        let rows = [row(1, 10_003, "SC_VCEP", "Sinnoh SC-VCEP", Some(50_003))];

        let documents = to_legacy_documents(&rows, &ApproverIndex::new());
        let subgroups = documents[0].subgroups.as_ref().unwrap();

        assert_eq!(subgroups.keys().collect::<Vec<_>>(), ["vcep"]);
        assert_eq!(subgroups.get("vcep").unwrap().id.as_deref(), Some("50003"));
    }

    #[test]
    fn approvers_from_every_row_accumulate_in_encounter_order() {
        let rows = [
            row(7, 10_000, "GCEP", "Foo GCEP", Some(40_000)),
            row(9, 10_000, "VCEP", "Foo VCEP", Some(50_000)),
        ];
        let index = approvers(&[(7, &["Mew"]), (9, &["Celebi"])]);

        let documents = to_legacy_documents(&rows, &index);

        assert_eq!(
            documents[0].approver.as_deref(),
            Some(&["Mew".to_string(), "Celebi".to_string()][..])
        );
    }

    #[test]
    fn approvers_of_a_repeated_subgroup_still_count() {
        let rows = [
            row(1, 10_000, "VCEP", "Foo VCEP", Some(50_000)),
            row(2, 10_000, "SC_VCEP", "Foo SC-VCEP", Some(50_000)),
        ];
        let index = approvers(&[(2, &["Jirachi"])]);

        let documents = to_legacy_documents(&rows, &index);

        assert_eq!(documents[0].affiliation_fullname, "Foo VCEP");
        assert_eq!(documents[0].approver.as_deref(), Some(&["Jirachi".to_string()][..]));
    }

    #[test]
    fn empty_approver_lists_leave_the_key_out() {
        let rows = [row(1, 10_000, "GCEP", "Foo GCEP", Some(40_000))];
        let index = approvers(&[(1, &[])]);

        let documents = to_legacy_documents(&rows, &index);
        let json = serde_json::to_value(&documents[0]).unwrap();

        assert!(json.get("approver").is_none());
    }

    #[test]
    fn documents_follow_first_seen_order() {
        let rows = [
            row(1, 10_005, "GCEP", "Five GCEP", Some(40_005)),
            row(2, 10_001, "INDEPENDENT_CURATION", "One", None),
            row(3, 10_005, "VCEP", "Five VCEP", Some(50_005)),
        ];

        let ids: Vec<_> = to_legacy_documents(&rows, &ApproverIndex::new())
            .into_iter()
            .map(|d| d.affiliation_id)
            .collect();

        assert_eq!(ids, ["10005", "10001"]);
    }

    #[test]
    fn panel_row_after_independent_row_opens_subgroups() {
        let rows = [
            row(1, 10_004, "INDEPENDENT_CURATION", "Unova Group", None),
            row(2, 10_004, "GCEP", "Unova GCEP", Some(40_004)),
        ];

        let documents = to_legacy_documents(&rows, &ApproverIndex::new());

        assert_eq!(documents[0].affiliation_fullname, "Unova Group/Unova GCEP");
        assert!(documents[0].subgroups.as_ref().unwrap().contains("gcep"));
    }

    #[test]
    fn unknown_types_fold_like_independent_groups() {
        let rows = [row(1, 10_006, "COOL", "Kalos", Some(2003))];

        let documents = to_legacy_documents(&rows, &ApproverIndex::new());

        assert!(documents[0].subgroups.is_none());
        assert_eq!(documents[0].affiliation_fullname, "Kalos");
    }

    #[test]
    fn panel_row_without_panel_id_emits_null_id() {
        let rows = [row(1, 10_007, "GCEP", "Alola GCEP", None)];

        let json = serde_json::to_value(to_legacy_documents(&rows, &ApproverIndex::new())).unwrap();

        assert_eq!(json[0]["subgroups"]["gcep"]["id"], serde_json::Value::Null);
    }

    #[test]
    fn index_approvers_groups_by_row() {
        let models = vec![
            approver::Model { id: 1, affiliation_row_id: 3, approver_name: "Groudon".into() },
            approver::Model { id: 2, affiliation_row_id: 5, approver_name: "Rayquaza".into() },
            approver::Model { id: 3, affiliation_row_id: 3, approver_name: "Kyogre".into() },
        ];

        let index = index_approvers(models);

        assert_eq!(index[&3], ["Groudon", "Kyogre"]);
        assert_eq!(index[&5], ["Rayquaza"]);
    }
}
