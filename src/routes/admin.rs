use axum::{
    Form,
    extract::{Path, Query, State},
    http::Uri,
    response::{IntoResponse, Redirect, Response},
};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use sea_orm::{ActiveEnum, Iterable};
use serde::{Deserialize, Serialize};

use crate::affiliations::records::{
    AffiliationRecord, AffiliationUpdate, ApproverEntry, Contacts, CoordinatorEntry,
    NewAffiliation, SubmitterEntry,
};
use crate::affiliations::store;
use crate::affiliations::validation::{self, ValidationErrors};
use crate::entities::affiliation;
use crate::entities::sea_orm_active_enums::{AffiliationStatus, AffiliationType, ClinicalDomain};
use crate::error::AppError;
use crate::{auth::user::AuthSession, router::AppState};

const LIST_URL: &str = "/admin/affiliations";

#[derive(Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
}

/// The admin form as posted. Everything arrives as text so a rejected
/// submission can be re-rendered exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffiliationForm {
    #[serde(default, rename = "type")]
    pub affiliation_type: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub short_name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub clinical_domain_working_group: String,
    #[serde(default)]
    pub members: String,
    /// One `name, email` per line.
    #[serde(default)]
    pub coordinators: String,
    #[serde(default)]
    pub approvers: String,
    #[serde(default)]
    pub clinvar_submitter_ids: String,
}

impl AffiliationForm {
    fn from_record(record: &AffiliationRecord) -> Self {
        let affiliation = &record.affiliation;
        Self {
            affiliation_type: affiliation.r#type.to_value(),
            full_name: affiliation.full_name.clone(),
            short_name: affiliation.short_name.clone().unwrap_or_default(),
            status: affiliation.status.to_value(),
            clinical_domain_working_group: affiliation.clinical_domain_working_group.to_value(),
            members: affiliation.members.clone(),
            coordinators: format_coordinators(&record.contacts.coordinators),
            approvers: record
                .contacts
                .approvers
                .iter()
                .map(|a| a.approver_name.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
            clinvar_submitter_ids: record
                .contacts
                .clinvar_submitter_ids
                .iter()
                .map(|s| s.clinvar_submitter_id.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    fn contacts(&self) -> Contacts {
        Contacts {
            coordinators: parse_coordinators(&self.coordinators),
            approvers: parse_lines(&self.approvers)
                .map(|approver_name| ApproverEntry { approver_name })
                .collect(),
            clinvar_submitter_ids: parse_lines(&self.clinvar_submitter_ids)
                .map(|clinvar_submitter_id| SubmitterEntry {
                    clinvar_submitter_id,
                })
                .collect(),
        }
    }

    pub fn to_new(&self) -> Result<NewAffiliation, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let affiliation_type =
            parse_choice::<AffiliationType>(&self.affiliation_type, validation::TYPE, &mut errors);
        let status = parse_choice::<AffiliationStatus>(&self.status, validation::STATUS, &mut errors);
        let clinical_domain = if self.clinical_domain_working_group.trim().is_empty() {
            Some(ClinicalDomain::default())
        } else {
            parse_choice::<ClinicalDomain>(
                &self.clinical_domain_working_group,
                validation::CLINICAL_DOMAIN,
                &mut errors,
            )
        };

        match (affiliation_type, status, clinical_domain) {
            (Some(affiliation_type), Some(status), Some(clinical_domain_working_group)) => {
                Ok(NewAffiliation {
                    affiliation_type,
                    full_name: self.full_name.clone(),
                    short_name: Some(self.short_name.clone()),
                    status,
                    clinical_domain_working_group,
                    members: self.members.trim().to_string(),
                    affiliation_id: None,
                    expert_panel_id: None,
                    contacts: self.contacts(),
                })
            }
            _ => {
                if self.full_name.trim().is_empty() {
                    errors.add_field(validation::FULL_NAME, validation::REQUIRED);
                }
                Err(errors)
            }
        }
    }

    pub fn to_update(&self) -> Result<AffiliationUpdate, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let Some(status) =
            parse_choice::<AffiliationStatus>(&self.status, validation::STATUS, &mut errors)
        else {
            if self.full_name.trim().is_empty() {
                errors.add_field(validation::FULL_NAME, validation::REQUIRED);
            }
            return Err(errors);
        };

        Ok(AffiliationUpdate {
            full_name: self.full_name.clone(),
            short_name: Some(self.short_name.clone()),
            status,
            contacts: self.contacts(),
        })
    }
}

fn parse_choice<E>(raw: &str, field: &'static str, errors: &mut ValidationErrors) -> Option<E>
where
    E: ActiveEnum<Value = String>,
{
    let raw = raw.trim();
    if raw.is_empty() {
        errors.add_field(field, validation::REQUIRED);
        return None;
    }
    match E::try_from_value(&raw.to_string()) {
        Ok(value) => Some(value),
        Err(_) => {
            errors.add_field(
                field,
                format!("Select a valid choice. {raw} is not one of the available choices."),
            );
            None
        }
    }
}

fn non_blank_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|line| !line.is_empty())
}

/// Trimmed, non-blank lines.
pub fn parse_lines(text: &str) -> impl Iterator<Item = String> + '_ {
    non_blank_lines(text).map(str::to_string)
}

/// `name, email` per line. The email is optional; anything after the first
/// comma is the email.
pub fn parse_coordinators(text: &str) -> Vec<CoordinatorEntry> {
    non_blank_lines(text)
        .map(|line| match line.split_once(',') {
            Some((name, email)) => CoordinatorEntry {
                coordinator_name: name.trim().to_string(),
                coordinator_email: Some(email.trim().to_string()).filter(|e| !e.is_empty()),
            },
            None => CoordinatorEntry {
                coordinator_name: line.to_string(),
                coordinator_email: None,
            },
        })
        .collect()
}

pub fn format_coordinators(coordinators: &[CoordinatorEntry]) -> String {
    coordinators
        .iter()
        .map(|c| match &c.coordinator_email {
            Some(email) => format!("{}, {}", c.coordinator_name, email),
            None => c.coordinator_name.clone(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Serialize)]
struct Choice {
    value: String,
    label: &'static str,
}

fn choices<E>(label: fn(&E) -> &'static str) -> Vec<Choice>
where
    E: ActiveEnum<Value = String> + Iterable,
{
    E::iter()
        .map(|value| Choice {
            value: value.to_value(),
            label: label(&value),
        })
        .collect()
}

#[derive(Serialize)]
struct ListRow {
    id: i32,
    affiliation_id: i32,
    expert_panel_id: Option<i32>,
    full_name: String,
    short_name: Option<String>,
    status: &'static str,
    type_label: &'static str,
    clinical_domain: &'static str,
}

impl From<affiliation::Model> for ListRow {
    fn from(model: affiliation::Model) -> Self {
        Self {
            id: model.id,
            affiliation_id: model.affiliation_id,
            expert_panel_id: model.expert_panel_id,
            full_name: model.full_name,
            short_name: model.short_name,
            status: model.status.label(),
            type_label: model.r#type.label(),
            clinical_domain: model.clinical_domain_working_group.label(),
        }
    }
}

/// Fields shown but never edited once a row exists.
#[derive(Serialize)]
struct FixedFields {
    id: i32,
    affiliation_id: i32,
    expert_panel_id: Option<i32>,
    type_label: &'static str,
    clinical_domain: &'static str,
    members: String,
}

impl From<&affiliation::Model> for FixedFields {
    fn from(model: &affiliation::Model) -> Self {
        Self {
            id: model.id,
            affiliation_id: model.affiliation_id,
            expert_panel_id: model.expert_panel_id,
            type_label: model.r#type.label(),
            clinical_domain: model.clinical_domain_working_group.label(),
            members: model.members.clone(),
        }
    }
}

#[derive(Serialize)]
struct FormPage<'a> {
    username: &'a str,
    title: String,
    action: String,
    form: &'a AffiliationForm,
    errors: &'a ValidationErrors,
    fixed: Option<FixedFields>,
    types: Vec<Choice>,
    statuses: Vec<Choice>,
    domains: Vec<Choice>,
    // Types whose clinical domain is derived, so the selector is hidden.
    derived_domain_types: [String; 2],
}

impl<'a> FormPage<'a> {
    fn new(
        username: &'a str,
        title: String,
        action: String,
        form: &'a AffiliationForm,
        errors: &'a ValidationErrors,
        fixed: Option<FixedFields>,
    ) -> Self {
        Self {
            username,
            title,
            action,
            form,
            errors,
            fixed,
            types: choices(AffiliationType::label),
            statuses: choices(AffiliationStatus::label),
            domains: choices(ClinicalDomain::label),
            derived_domain_types: [
                AffiliationType::ScVcep.to_value(),
                AffiliationType::IndependentCuration.to_value(),
            ],
        }
    }
}

fn login_redirect(uri: &Uri) -> Response {
    let next = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or(LIST_URL);
    Redirect::to(&format!(
        "/login?next={}",
        utf8_percent_encode(next, NON_ALPHANUMERIC)
    ))
    .into_response()
}

pub async fn list(
    State(state): State<AppState>,
    auth_session: AuthSession,
    uri: Uri,
    Query(ListQuery { q }): Query<ListQuery>,
) -> Result<Response, AppError> {
    let Some(user) = auth_session.user else {
        return Ok(login_redirect(&uri));
    };

    let rows: Vec<ListRow> = store::search_affiliations(&state.db, q.as_deref())
        .await?
        .into_iter()
        .map(ListRow::from)
        .collect();

    Ok(state
        .render(
            "affiliations/list.html",
            minijinja::context! {
                username => user.username,
                q => q.unwrap_or_default(),
                rows => rows,
            },
        )?
        .into_response())
}

fn render_new(
    state: &AppState,
    username: &str,
    form: &AffiliationForm,
    errors: &ValidationErrors,
) -> Result<Response, AppError> {
    let page = FormPage::new(
        username,
        "Add affiliation".to_string(),
        format!("{LIST_URL}/new"),
        form,
        errors,
        None,
    );
    Ok(state.render("affiliations/form.html", page)?.into_response())
}

fn render_edit(
    state: &AppState,
    username: &str,
    model: &affiliation::Model,
    form: &AffiliationForm,
    errors: &ValidationErrors,
) -> Result<Response, AppError> {
    let page = FormPage::new(
        username,
        format!("Change affiliation {}", model.full_name),
        format!("{LIST_URL}/{}", model.id),
        form,
        errors,
        Some(FixedFields::from(model)),
    );
    Ok(state.render("affiliations/form.html", page)?.into_response())
}

pub async fn new_form(
    State(state): State<AppState>,
    auth_session: AuthSession,
    uri: Uri,
) -> Result<Response, AppError> {
    let Some(user) = auth_session.user else {
        return Ok(login_redirect(&uri));
    };
    let form = AffiliationForm {
        status: AffiliationStatus::Applying.to_value(),
        ..AffiliationForm::default()
    };
    render_new(&state, &user.username, &form, &ValidationErrors::new())
}

pub async fn create(
    State(state): State<AppState>,
    auth_session: AuthSession,
    uri: Uri,
    Form(form): Form<AffiliationForm>,
) -> Result<Response, AppError> {
    let Some(user) = auth_session.user else {
        return Ok(login_redirect(&uri));
    };

    let result = match form.to_new() {
        Ok(input) => store::create_affiliation(&state.db, input).await,
        Err(errors) => Err(errors.into()),
    };
    match result {
        Ok(_) => Ok(Redirect::to(LIST_URL).into_response()),
        Err(AppError::Validation(errors)) => render_new(&state, &user.username, &form, &errors),
        Err(err) => Err(err),
    }
}

pub async fn edit_form(
    State(state): State<AppState>,
    auth_session: AuthSession,
    uri: Uri,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let Some(user) = auth_session.user else {
        return Ok(login_redirect(&uri));
    };
    let record = store::get_record(&state.db, id).await?;
    let form = AffiliationForm::from_record(&record);
    render_edit(
        &state,
        &user.username,
        &record.affiliation,
        &form,
        &ValidationErrors::new(),
    )
}

pub async fn update(
    State(state): State<AppState>,
    auth_session: AuthSession,
    uri: Uri,
    Path(id): Path<i32>,
    Form(form): Form<AffiliationForm>,
) -> Result<Response, AppError> {
    let Some(user) = auth_session.user else {
        return Ok(login_redirect(&uri));
    };

    let result = match form.to_update() {
        Ok(update) => store::update_affiliation(&state.db, id, update).await,
        Err(errors) => Err(errors.into()),
    };
    match result {
        Ok(_) => Ok(Redirect::to(LIST_URL).into_response()),
        Err(AppError::Validation(errors)) => {
            let record = store::get_record(&state.db, id).await?;
            render_edit(&state, &user.username, &record.affiliation, &form, &errors)
        }
        Err(err) => Err(err),
    }
}

pub async fn delete(
    State(state): State<AppState>,
    auth_session: AuthSession,
    uri: Uri,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    if auth_session.user.is_none() {
        return Ok(login_redirect(&uri));
    }
    store::soft_delete_affiliation(&state.db, id).await?;
    Ok(Redirect::to(LIST_URL).into_response())
}
