use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::debug;

use crate::affiliations::legacy::LegacyAffiliation;
use crate::affiliations::records::{AffiliationRecord, AffiliationUpdate, NewAffiliation};
use crate::affiliations::store;
use crate::affiliations::validation::ValidationErrors;
use crate::error::AppError;
use crate::{auth::user::AuthSession, router::AppState};

const AFFIL_ID: &str = "affil_id";

#[derive(Deserialize)]
pub struct DetailQuery {
    pub affil_id: Option<String>,
}

fn require_login(auth_session: &AuthSession) -> Result<(), AppError> {
    match auth_session.user {
        Some(_) => Ok(()),
        None => Err(AppError::Unauthorized),
    }
}

// Malformed bodies are reported in the same shape as validation failures.
fn parse_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            debug!("Rejected request body: {}", rejection.body_text());
            let mut errors = ValidationErrors::new();
            errors.add_general(rejection.body_text());
            Err(errors.into())
        }
    }
}

/// Every non-deleted affiliation in the legacy nested shape.
pub async fn affiliations_list(
    State(state): State<AppState>,
) -> Result<Json<Vec<LegacyAffiliation>>, AppError> {
    Ok(Json(store::legacy_documents(&state.db, None).await?))
}

/// The legacy documents for one affiliation ID.
pub async fn affiliation_detail(
    State(state): State<AppState>,
    Query(query): Query<DetailQuery>,
) -> Result<Json<Vec<LegacyAffiliation>>, AppError> {
    let mut errors = ValidationErrors::new();
    let affiliation_id = match query.affil_id.as_deref().map(str::trim) {
        None | Some("") => {
            errors.add_field(AFFIL_ID, "This query parameter is required.");
            None
        }
        Some(raw) => match raw.parse::<i32>() {
            Ok(id) => Some(id),
            Err(_) => {
                errors.add_field(AFFIL_ID, "A valid integer is required.");
                None
            }
        },
    };
    let affiliation_id = errors.into_result(affiliation_id)?;

    Ok(Json(
        store::legacy_documents(&state.db, affiliation_id).await?,
    ))
}

pub async fn list_affiliations(
    State(state): State<AppState>,
) -> Result<Json<Vec<AffiliationRecord>>, AppError> {
    Ok(Json(store::list_records(&state.db).await?))
}

pub async fn get_affiliation(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<AffiliationRecord>, AppError> {
    Ok(Json(store::get_record(&state.db, id).await?))
}

pub async fn create_affiliation(
    State(state): State<AppState>,
    auth_session: AuthSession,
    body: Result<Json<NewAffiliation>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    require_login(&auth_session)?;
    let input = parse_body(body)?;

    let record = store::create_affiliation(&state.db, input).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update_affiliation(
    State(state): State<AppState>,
    auth_session: AuthSession,
    Path(id): Path<i32>,
    body: Result<Json<AffiliationUpdate>, JsonRejection>,
) -> Result<Json<AffiliationRecord>, AppError> {
    require_login(&auth_session)?;
    let update = parse_body(body)?;

    Ok(Json(store::update_affiliation(&state.db, id, update).await?))
}

pub async fn delete_affiliation(
    State(state): State<AppState>,
    auth_session: AuthSession,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    require_login(&auth_session)?;
    store::soft_delete_affiliation(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
