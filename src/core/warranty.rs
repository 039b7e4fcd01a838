//! Warranty business logic - customer claims and administrator decisions.
//!
//! A request can only be filed for a laptop in one of the caller's own
//! delivered orders. Decisions move a request from PENDING to APPROVED or
//! REJECTED exactly once.

use crate::{
    core::{account::Session, order},
    entities::{
        OrderStatus, WarrantyRequest, WarrantyRequestColumn, WarrantyStatus, warranty_request,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait, sea_query::Expr,
};
use tracing::{info, instrument};

/// Files a warranty request for one laptop of a delivered order.
///
/// # Errors
/// * Validation error for an empty reason, an order that has not been
///   delivered, or a laptop not in the order
/// * [`Error::NotFound`] for an unknown order
/// * [`Error::PermissionDenied`] if the order belongs to someone else
/// * [`Error::DuplicateWarrantyRequest`] if a pending request already covers
///   this order and laptop
#[instrument(skip(db, session, reason), fields(account_id = session.account_id))]
pub async fn create_request(
    db: &DatabaseConnection,
    session: &Session,
    order_id: i64,
    laptop_id: i64,
    reason: &str,
) -> Result<warranty_request::Model> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(Error::validation("reason cannot be empty"));
    }

    let txn = db.begin().await?;
    let placed = order::get_order_by_id(&txn, order_id)
        .await?
        .ok_or_else(|| Error::not_found("order", order_id))?;
    if placed.order.user_id != session.account_id {
        return Err(Error::PermissionDenied {
            message: format!("order {order_id} belongs to another account"),
        });
    }
    if placed.order.status != OrderStatus::Delivered {
        return Err(Error::validation(format!(
            "order {order_id} is {} and must be DELIVERED before a warranty claim",
            placed.order.status
        )));
    }
    if !placed.lines.iter().any(|line| line.laptop_id == laptop_id) {
        return Err(Error::validation(format!(
            "laptop {laptop_id} is not part of order {order_id}"
        )));
    }

    let pending = WarrantyRequest::find()
        .filter(WarrantyRequestColumn::OrderId.eq(order_id))
        .filter(WarrantyRequestColumn::LaptopId.eq(laptop_id))
        .filter(WarrantyRequestColumn::Status.eq(WarrantyStatus::Pending))
        .count(&txn)
        .await?;
    if pending > 0 {
        return Err(Error::DuplicateWarrantyRequest {
            order_id,
            laptop_id,
        });
    }

    let request = warranty_request::ActiveModel {
        order_id: Set(order_id),
        laptop_id: Set(laptop_id),
        user_id: Set(session.account_id),
        request_date: Set(Utc::now()),
        status: Set(WarrantyStatus::Pending),
        reason: Set(reason.to_string()),
        admin_notes: Set(None),
        processed_date: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    info!(request_id = request.id, order_id, laptop_id, "Warranty request filed");
    Ok(request)
}

/// Retrieves a warranty request by ID.
pub async fn get_request_by_id(
    db: &DatabaseConnection,
    request_id: i64,
) -> Result<Option<warranty_request::Model>> {
    WarrantyRequest::find_by_id(request_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Every warranty request, newest first.
pub async fn get_all_requests(db: &DatabaseConnection) -> Result<Vec<warranty_request::Model>> {
    WarrantyRequest::find()
        .order_by_desc(WarrantyRequestColumn::RequestDate)
        .order_by_desc(WarrantyRequestColumn::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Requests filed by one account, newest first.
pub async fn get_requests_by_account(
    db: &DatabaseConnection,
    account_id: i64,
) -> Result<Vec<warranty_request::Model>> {
    WarrantyRequest::find()
        .filter(WarrantyRequestColumn::UserId.eq(account_id))
        .order_by_desc(WarrantyRequestColumn::RequestDate)
        .order_by_desc(WarrantyRequestColumn::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Requests in `status`, oldest first so the queue is worked in order.
pub async fn get_requests_by_status(
    db: &DatabaseConnection,
    status: WarrantyStatus,
) -> Result<Vec<warranty_request::Model>> {
    WarrantyRequest::find()
        .filter(WarrantyRequestColumn::Status.eq(status))
        .order_by_asc(WarrantyRequestColumn::RequestDate)
        .order_by_asc(WarrantyRequestColumn::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Requests still waiting for a decision.
pub async fn get_pending_requests(db: &DatabaseConnection) -> Result<Vec<warranty_request::Model>> {
    get_requests_by_status(db, WarrantyStatus::Pending).await
}

/// Approves or rejects a pending request (admin only).
///
/// The decision, notes and processing time are written with a conditional
/// update that only matches a PENDING row, so a request is decided once.
///
/// # Errors
/// * [`Error::PermissionDenied`] for non-admin sessions
/// * Validation error if `decision` is PENDING
/// * [`Error::NotFound`] for an unknown request
/// * [`Error::InvalidTransition`] if the request was already decided
#[instrument(skip(db, session, notes), fields(admin_id = session.account_id))]
pub async fn decide_request(
    db: &DatabaseConnection,
    session: &Session,
    request_id: i64,
    decision: WarrantyStatus,
    notes: &str,
) -> Result<warranty_request::Model> {
    session.require_admin()?;
    if decision == WarrantyStatus::Pending {
        return Err(Error::validation("decision must be APPROVED or REJECTED"));
    }

    let existing = get_request_by_id(db, request_id)
        .await?
        .ok_or_else(|| Error::not_found("warranty request", request_id))?;

    let notes = notes.trim();
    let result = WarrantyRequest::update_many()
        .col_expr(WarrantyRequestColumn::Status, Expr::value(decision))
        .col_expr(
            WarrantyRequestColumn::AdminNotes,
            Expr::value((!notes.is_empty()).then(|| notes.to_string())),
        )
        .col_expr(WarrantyRequestColumn::ProcessedDate, Expr::value(Utc::now()))
        .filter(WarrantyRequestColumn::Id.eq(request_id))
        .filter(WarrantyRequestColumn::Status.eq(WarrantyStatus::Pending))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(Error::InvalidTransition {
            entity: "warranty request",
            from: existing.status.to_string(),
            to: decision.to_string(),
        });
    }

    info!(request_id, %decision, "Warranty request decided");
    get_request_by_id(db, request_id)
        .await?
        .ok_or_else(|| Error::not_found("warranty request", request_id))
}
