//! Per-line supplier decisions

use std::time::Duration;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::*;

use crate::domain::commande::ProductTypeSummary;
use crate::domain::{Actor, CommandItem, DomainError, LineStatus};
use crate::infrastructure::db::{settle, with_deadline};
use crate::models::{command_item, commande, product_type};
use crate::services::stock_ledger;

/// Validates or cancels one `Soumis` line. Validation credits stock for this
/// line unless an entry already exists for it.
pub async fn update_status(
    db: &DatabaseConnection,
    tx_timeout: Duration,
    actor: &Actor,
    item_id: i32,
    requested: &str,
) -> Result<CommandItem, DomainError> {
    let target = LineStatus::parse_decision(requested)?;

    let item = command_item::Entity::find_by_id(item_id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("CommandItem {} not found", item_id)))?;

    let parent = commande::Entity::find_by_id(item.commande_id)
        .one(db)
        .await?
        .ok_or_else(|| {
            DomainError::Integrity(format!(
                "CommandItem {} references missing Commande {}",
                item.id, item.commande_id
            ))
        })?;

    if !(actor.is_admin() || actor.is_supplier(parent.fournisseur_id)) {
        return Err(DomainError::Forbidden(
            "Only an Admin or the assigned supplier can change this line".to_string(),
        ));
    }

    let current = LineStatus::parse_stored(item.id, &item.statut_ligne)?;
    if !current.can_transition_to(target) {
        return Err(DomainError::state_conflict(
            "CommandItem",
            item.id,
            current,
            LineStatus::Soumis,
        ));
    }

    let updated = with_deadline(tx_timeout, async move {
        let txn = db.begin().await?;
        let result = apply_in(&txn, item, target).await;
        settle(txn, result).await
    })
    .await?;

    tracing::info!(
        "CommandItem {} set to {} by user {}",
        item_id,
        target,
        actor.id
    );
    Ok(updated)
}

async fn apply_in(
    txn: &DatabaseTransaction,
    item: command_item::Model,
    target: LineStatus,
) -> Result<CommandItem, DomainError> {
    let now = Utc::now().to_rfc3339();

    let flipped = command_item::Entity::update_many()
        .col_expr(command_item::Column::StatutLigne, Expr::value(target.as_str()))
        .col_expr(command_item::Column::UpdatedAt, Expr::value(now.clone()))
        .filter(command_item::Column::Id.eq(item.id))
        .filter(command_item::Column::StatutLigne.eq(LineStatus::Soumis.as_str()))
        .exec(txn)
        .await?;

    if flipped.rows_affected == 0 {
        let current = command_item::Entity::find_by_id(item.id)
            .one(txn)
            .await?
            .map(|m| m.statut_ligne)
            .unwrap_or_default();
        return Err(DomainError::state_conflict(
            "CommandItem",
            item.id,
            current,
            LineStatus::Soumis,
        ));
    }

    if target == LineStatus::ValideFournisseur {
        if stock_ledger::stock_exists(txn, item.id).await? {
            tracing::warn!(
                "CommandItem {} already has a stock entry; not crediting again",
                item.id
            );
        } else {
            stock_ledger::credit_line(txn, &item, &now).await?;
        }
    }

    let (model, pt) = command_item::Entity::find_by_id(item.id)
        .find_also_related(product_type::Entity)
        .one(txn)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("CommandItem {} not found", item.id)))?;

    CommandItem::from_model(model, pt.map(ProductTypeSummary::from))
}
