use std::collections::HashMap;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbBackend,
    DbErr, EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    Set, TransactionTrait,
    sea_query::{Expr, Func},
};
use tracing::{debug, info};

use crate::entities::{affiliation, approver, coordinator, submitter};
use crate::error::AppError;

use super::identifiers::{self, Candidate, Identity, Resolution};
use super::legacy::{self, LegacyAffiliation, LegacyRow};
use super::records::{
    AffiliationRecord, AffiliationUpdate, Contacts, NewAffiliation, clean_optional,
};

/// Blocks concurrent creators until the current transaction ends. SQLite
/// already serializes writers, so only PostgreSQL needs the explicit lock.
async fn lock_affiliation_table<C: ConnectionTrait>(conn: &C) -> Result<(), DbErr> {
    if conn.get_database_backend() == DbBackend::Postgres {
        conn.execute_unprepared("LOCK TABLE affiliation IN SHARE ROW EXCLUSIVE MODE")
            .await?;
    }
    Ok(())
}

/// Highest affiliation ID ever stored, soft-deleted rows included.
pub async fn max_affiliation_id<C: ConnectionTrait>(conn: &C) -> Result<Option<i32>, DbErr> {
    let max = affiliation::Entity::find()
        .select_only()
        .column_as(
            Expr::col(affiliation::Column::AffiliationId).max(),
            "max_affiliation_id",
        )
        .into_tuple::<Option<i32>>()
        .one(conn)
        .await?;
    Ok(max.flatten())
}

/// Whether any row, soft-deleted or not, already holds this identity. A
/// missing expert panel ID only matches other rows without one.
pub async fn identity_taken<C: ConnectionTrait>(
    conn: &C,
    identity: Identity,
) -> Result<bool, DbErr> {
    let expert_panel = match identity.expert_panel_id {
        Some(expert_panel_id) => affiliation::Column::ExpertPanelId.eq(expert_panel_id),
        None => affiliation::Column::ExpertPanelId.is_null(),
    };
    let matches = affiliation::Entity::find()
        .filter(affiliation::Column::AffiliationId.eq(identity.affiliation_id))
        .filter(expert_panel)
        .count(conn)
        .await?;
    Ok(matches > 0)
}

async fn find_active<C: ConnectionTrait>(
    conn: &C,
    id: i32,
) -> Result<Option<affiliation::Model>, DbErr> {
    affiliation::Entity::find_by_id(id)
        .filter(affiliation::Column::IsDeleted.eq(false))
        .one(conn)
        .await
}

async fn load_contacts<C: ConnectionTrait>(
    conn: &C,
    row_ids: &[i32],
) -> Result<HashMap<i32, Contacts>, DbErr> {
    let mut contacts: HashMap<i32, Contacts> = HashMap::new();
    if row_ids.is_empty() {
        return Ok(contacts);
    }

    let coordinators = coordinator::Entity::find()
        .filter(coordinator::Column::AffiliationRowId.is_in(row_ids.iter().copied()))
        .order_by_asc(coordinator::Column::Id)
        .all(conn)
        .await?;
    for model in coordinators {
        contacts
            .entry(model.affiliation_row_id)
            .or_default()
            .coordinators
            .push(model.into());
    }

    let approvers = approver::Entity::find()
        .filter(approver::Column::AffiliationRowId.is_in(row_ids.iter().copied()))
        .order_by_asc(approver::Column::Id)
        .all(conn)
        .await?;
    for model in approvers {
        contacts
            .entry(model.affiliation_row_id)
            .or_default()
            .approvers
            .push(model.into());
    }

    let submitters = submitter::Entity::find()
        .filter(submitter::Column::AffiliationRowId.is_in(row_ids.iter().copied()))
        .order_by_asc(submitter::Column::Id)
        .all(conn)
        .await?;
    for model in submitters {
        contacts
            .entry(model.affiliation_row_id)
            .or_default()
            .clinvar_submitter_ids
            .push(model.into());
    }

    Ok(contacts)
}

async fn load_record<C: ConnectionTrait>(
    conn: &C,
    affiliation: affiliation::Model,
) -> Result<AffiliationRecord, DbErr> {
    let contacts = load_contacts(conn, &[affiliation.id])
        .await?
        .remove(&affiliation.id)
        .unwrap_or_default();
    Ok(AffiliationRecord {
        affiliation,
        contacts,
    })
}

async fn insert_contacts<C: ConnectionTrait>(
    conn: &C,
    row_id: i32,
    contacts: &Contacts,
) -> Result<(), DbErr> {
    for entry in &contacts.coordinators {
        coordinator::ActiveModel {
            affiliation_row_id: Set(row_id),
            coordinator_name: Set(entry.coordinator_name.trim().to_string()),
            coordinator_email: Set(clean_optional(entry.coordinator_email.clone())),
            ..Default::default()
        }
        .insert(conn)
        .await?;
    }
    for entry in &contacts.approvers {
        approver::ActiveModel {
            affiliation_row_id: Set(row_id),
            approver_name: Set(entry.approver_name.trim().to_string()),
            ..Default::default()
        }
        .insert(conn)
        .await?;
    }
    for entry in &contacts.clinvar_submitter_ids {
        submitter::ActiveModel {
            affiliation_row_id: Set(row_id),
            clinvar_submitter_id: Set(entry.clinvar_submitter_id.trim().to_string()),
            ..Default::default()
        }
        .insert(conn)
        .await?;
    }
    Ok(())
}

async fn replace_contacts<C: ConnectionTrait>(
    conn: &C,
    row_id: i32,
    contacts: &Contacts,
) -> Result<(), DbErr> {
    coordinator::Entity::delete_many()
        .filter(coordinator::Column::AffiliationRowId.eq(row_id))
        .exec(conn)
        .await?;
    approver::Entity::delete_many()
        .filter(approver::Column::AffiliationRowId.eq(row_id))
        .exec(conn)
        .await?;
    submitter::Entity::delete_many()
        .filter(submitter::Column::AffiliationRowId.eq(row_id))
        .exec(conn)
        .await?;
    insert_contacts(conn, row_id, contacts).await
}

/// Creates one affiliation row with derived identifiers.
///
/// The maximum-ID read, the uniqueness check and the insert all happen in
/// one transaction holding the table lock, so two concurrent creations
/// cannot be handed the same affiliation ID.
pub async fn create_affiliation(
    db: &DatabaseConnection,
    input: NewAffiliation,
) -> Result<AffiliationRecord, AppError> {
    let mut errors = input.validate();
    if let Some(requested) = input.affiliation_id {
        debug!(requested, "Ignoring supplied affiliation_id on create");
    }

    let txn = db.begin().await?;
    lock_affiliation_table(&txn).await?;

    let current_max = max_affiliation_id(&txn).await?;
    let mut candidate = Candidate::new(input.affiliation_type, input.clinical_domain_working_group);
    candidate.requested_expert_panel_id = input.expert_panel_id;
    let Resolution {
        assignment,
        errors: identity_errors,
    } = identifiers::resolve(&candidate, current_max);
    errors.extend(identity_errors);

    if identity_taken(&txn, assignment.identity).await? {
        errors.add_general(identifiers::duplicate_identity_message(assignment.identity));
    }

    if !errors.is_empty() {
        txn.rollback().await?;
        debug!(%errors, "Rejected new affiliation");
        return Err(AppError::Validation(errors));
    }

    let model = affiliation::ActiveModel {
        affiliation_id: Set(assignment.identity.affiliation_id),
        expert_panel_id: Set(assignment.identity.expert_panel_id),
        r#type: Set(input.affiliation_type),
        full_name: Set(input.full_name.trim().to_string()),
        short_name: Set(clean_optional(input.short_name)),
        status: Set(input.status),
        clinical_domain_working_group: Set(assignment.clinical_domain),
        members: Set(input.members),
        is_deleted: Set(false),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    insert_contacts(&txn, model.id, &input.contacts).await?;
    let record = load_record(&txn, model).await?;
    txn.commit().await?;

    info!(
        id = record.affiliation.id,
        affiliation_id = record.affiliation.affiliation_id,
        expert_panel_id = ?record.affiliation.expert_panel_id,
        kind = ?record.affiliation.r#type,
        "Created affiliation"
    );
    Ok(record)
}

/// Updates the editable fields of a row and replaces its child lists.
/// Identifiers, type, clinical domain and members are never rewritten.
pub async fn update_affiliation(
    db: &DatabaseConnection,
    id: i32,
    update: AffiliationUpdate,
) -> Result<AffiliationRecord, AppError> {
    let txn = db.begin().await?;
    let existing = find_active(&txn, id).await?.ok_or(AppError::NotFound)?;

    let Resolution {
        assignment,
        mut errors,
    } = identifiers::resolve(&Candidate::existing(&existing), None);
    errors.extend(update.validate());
    if !errors.is_empty() {
        txn.rollback().await?;
        debug!(id, %errors, "Rejected affiliation update");
        return Err(AppError::Validation(errors));
    }

    let mut active = existing.into_active_model();
    active.full_name = Set(update.full_name.trim().to_string());
    active.short_name = Set(clean_optional(update.short_name));
    active.status = Set(update.status);
    let model = active.update(&txn).await?;
    replace_contacts(&txn, model.id, &update.contacts).await?;
    let record = load_record(&txn, model).await?;
    txn.commit().await?;

    info!(
        id,
        affiliation_id = assignment.identity.affiliation_id,
        expert_panel_id = ?assignment.identity.expert_panel_id,
        "Updated affiliation"
    );
    Ok(record)
}

/// Marks a row deleted. The row and its children stay in storage.
pub async fn soft_delete_affiliation(db: &DatabaseConnection, id: i32) -> Result<(), AppError> {
    let existing = find_active(db, id).await?.ok_or(AppError::NotFound)?;
    let mut active = existing.into_active_model();
    active.is_deleted = Set(true);
    let model = active.update(db).await?;

    info!(
        id,
        affiliation_id = model.affiliation_id,
        expert_panel_id = ?model.expert_panel_id,
        "Deleted affiliation"
    );
    Ok(())
}

pub async fn get_record<C: ConnectionTrait>(conn: &C, id: i32) -> Result<AffiliationRecord, AppError> {
    let model = find_active(conn, id).await?.ok_or(AppError::NotFound)?;
    Ok(load_record(conn, model).await?)
}

pub async fn list_records<C: ConnectionTrait>(conn: &C) -> Result<Vec<AffiliationRecord>, DbErr> {
    let models = affiliation::Entity::find()
        .filter(affiliation::Column::IsDeleted.eq(false))
        .order_by_asc(affiliation::Column::Id)
        .all(conn)
        .await?;
    let ids: Vec<i32> = models.iter().map(|m| m.id).collect();
    let mut contacts = load_contacts(conn, &ids).await?;

    Ok(models
        .into_iter()
        .map(|affiliation| AffiliationRecord {
            contacts: contacts.remove(&affiliation.id).unwrap_or_default(),
            affiliation,
        })
        .collect())
}

/// Non-deleted rows matching `term` on either ID, or case-insensitively on
/// the full name or the short name. A blank term matches everything.
pub async fn search_affiliations<C: ConnectionTrait>(
    conn: &C,
    term: Option<&str>,
) -> Result<Vec<affiliation::Model>, DbErr> {
    let mut select = affiliation::Entity::find().filter(affiliation::Column::IsDeleted.eq(false));

    if let Some(term) = term.map(str::trim).filter(|t| !t.is_empty()) {
        let pattern = format!("%{}%", term.to_lowercase());
        let lower = |column: affiliation::Column| Expr::expr(Func::lower(Expr::col(column)));
        let mut condition = Condition::any()
            .add(lower(affiliation::Column::FullName).like(&pattern))
            .add(lower(affiliation::Column::ShortName).like(&pattern));
        if let Ok(number) = term.parse::<i32>() {
            condition = condition
                .add(affiliation::Column::AffiliationId.eq(number))
                .add(affiliation::Column::ExpertPanelId.eq(number));
        }
        select = select.filter(condition);
    }

    select
        .order_by_asc(affiliation::Column::AffiliationId)
        .order_by_asc(affiliation::Column::Id)
        .all(conn)
        .await
}

/// Legacy documents for every non-deleted row, or only for one
/// affiliation ID.
pub async fn legacy_documents<C: ConnectionTrait>(
    conn: &C,
    affiliation_id: Option<i32>,
) -> Result<Vec<LegacyAffiliation>, DbErr> {
    let mut select = affiliation::Entity::find()
        .select_only()
        .column(affiliation::Column::Id)
        .column(affiliation::Column::AffiliationId)
        .column_as(affiliation::Column::Type, "affiliation_type")
        .column(affiliation::Column::FullName)
        .column(affiliation::Column::ExpertPanelId)
        .filter(affiliation::Column::IsDeleted.eq(false));
    if let Some(affiliation_id) = affiliation_id {
        select = select.filter(affiliation::Column::AffiliationId.eq(affiliation_id));
    }
    let rows: Vec<LegacyRow> = select
        .order_by_asc(affiliation::Column::Id)
        .into_model::<LegacyRow>()
        .all(conn)
        .await?;

    let approvers = if rows.is_empty() {
        Vec::new()
    } else {
        approver::Entity::find()
            .filter(approver::Column::AffiliationRowId.is_in(rows.iter().map(|r| r.id)))
            .order_by_asc(approver::Column::Id)
            .all(conn)
            .await?
    };

    Ok(legacy::to_legacy_documents(
        &rows,
        &legacy::index_approvers(approvers),
    ))
}
