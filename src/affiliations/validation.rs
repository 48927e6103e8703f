use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

pub const AFFILIATION_ID: &str = "affiliation_id";
pub const EXPERT_PANEL_ID: &str = "expert_panel_id";
pub const TYPE: &str = "type";
pub const FULL_NAME: &str = "full_name";
pub const STATUS: &str = "status";
pub const CLINICAL_DOMAIN: &str = "clinical_domain_working_group";
pub const COORDINATORS: &str = "coordinators";
pub const APPROVERS: &str = "approvers";
pub const CLINVAR_SUBMITTER_IDS: &str = "clinvar_submitter_ids";

pub const REQUIRED: &str = "This field is required.";

/// Every problem found in one submission. Errors are accumulated rather
/// than returned on first failure so an editor can fix them all at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    field_errors: BTreeMap<&'static str, Vec<String>>,
    non_field_errors: Vec<String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_field(&mut self, field: &'static str, message: impl Into<String>) {
        self.field_errors
            .entry(field)
            .or_default()
            .push(message.into());
    }

    pub fn add_general(&mut self, message: impl Into<String>) {
        self.non_field_errors.push(message.into());
    }

    pub fn extend(&mut self, other: ValidationErrors) {
        for (field, messages) in other.field_errors {
            self.field_errors.entry(field).or_default().extend(messages);
        }
        self.non_field_errors.extend(other.non_field_errors);
    }

    pub fn is_empty(&self) -> bool {
        self.field_errors.is_empty() && self.non_field_errors.is_empty()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.field_errors.values().map(Vec::len).sum::<usize>() + self.non_field_errors.len()
    }

    /// Messages attached to `field`, empty if there are none.
    pub fn field(&self, field: &str) -> &[String] {
        self.field_errors
            .get(field)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn general(&self) -> &[String] {
        &self.non_field_errors
    }

    pub fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        let fields = self
            .field_errors
            .iter()
            .flat_map(|(field, messages)| messages.iter().map(move |m| (Some(*field), m)));
        let general = self.non_field_errors.iter().map(|m| (None, m));
        for (field, message) in fields.chain(general) {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            match field {
                Some(field) => write!(f, "{field}: {message}")?,
                None => f.write_str(message)?,
            }
        }
        Ok(())
    }
}
