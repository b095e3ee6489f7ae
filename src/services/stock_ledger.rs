//! Stock ledger. Every function takes a connection so callers can run it
//! inside their own transaction.

use sea_orm::*;

use crate::domain::{CommandeScope, DomainError, StockEntry};
use crate::models::{command_item, commande, project, stock_entry};

fn entry_for(item: &command_item::Model, now: &str) -> stock_entry::ActiveModel {
    stock_entry::ActiveModel {
        product_type_id: Set(item.product_type_id),
        command_item_id: Set(item.id),
        quantite_disponible: Set(f64::from(item.quantite_commandee)),
        date_entree_stock: Set(now.to_owned()),
        ..Default::default()
    }
}

pub async fn stock_exists<C: ConnectionTrait>(
    conn: &C,
    command_item_id: i32,
) -> Result<bool, DomainError> {
    let count = stock_entry::Entity::find()
        .filter(stock_entry::Column::CommandItemId.eq(command_item_id))
        .count(conn)
        .await?;
    Ok(count > 0)
}

/// Credits stock for one validated line. A second entry for the same line is
/// rejected by the unique index and reported as a conflict.
pub async fn credit_line<C: ConnectionTrait>(
    conn: &C,
    item: &command_item::Model,
    now: &str,
) -> Result<StockEntry, DomainError> {
    let entry = entry_for(item, now)
        .insert(conn)
        .await
        .map_err(|e| match DomainError::from(e) {
            DomainError::Conflict(_) => DomainError::Conflict(format!(
                "CommandItem {} already has a stock entry",
                item.id
            )),
            other => other,
        })?;

    tracing::info!(
        "Stock credited: {} x product type {} from line {}",
        entry.quantite_disponible,
        entry.product_type_id,
        item.id
    );
    Ok(entry.into())
}

/// Credits stock for every line in one statement. Returns the number of
/// entries written.
pub async fn credit_lines<C: ConnectionTrait>(
    conn: &C,
    commande_id: i32,
    items: &[command_item::Model],
    now: &str,
) -> Result<u64, DomainError> {
    if items.is_empty() {
        return Ok(0);
    }

    let written = stock_entry::Entity::insert_many(items.iter().map(|item| entry_for(item, now)))
        .exec_without_returning(conn)
        .await
        .map_err(|e| match DomainError::from(e) {
            DomainError::Conflict(_) => DomainError::Conflict(format!(
                "A line of Commande {} already has a stock entry",
                commande_id
            )),
            other => other,
        })?;

    Ok(written)
}

/// Ledger rows whose originating commande falls under `scope`, newest first
pub async fn list_entries<C: ConnectionTrait>(
    conn: &C,
    scope: CommandeScope,
    product_type_id: Option<i32>,
) -> Result<Vec<StockEntry>, DomainError> {
    let query = stock_entry::Entity::find()
        .join(JoinType::InnerJoin, stock_entry::Relation::CommandItem.def())
        .join(JoinType::InnerJoin, command_item::Relation::Commande.def());
    let query = match scope {
        CommandeScope::All => query,
        CommandeScope::ManagedBy(chef_id) => query
            .join(JoinType::InnerJoin, commande::Relation::Project.def())
            .filter(project::Column::ChefProjetId.eq(chef_id)),
        CommandeScope::AssignedTo(supplier_id) => {
            query.filter(commande::Column::FournisseurId.eq(supplier_id))
        }
        CommandeScope::Project(project_id) => {
            query.filter(commande::Column::ProjetId.eq(project_id))
        }
    };
    let query = match product_type_id {
        Some(id) => query.filter(stock_entry::Column::ProductTypeId.eq(id)),
        None => query,
    };

    let entries = query
        .order_by_desc(stock_entry::Column::DateEntreeStock)
        .order_by_desc(stock_entry::Column::Id)
        .all(conn)
        .await?;
    Ok(entries.into_iter().map(StockEntry::from).collect())
}

/// One ledger row with the commande it was credited from
pub async fn find_entry<C: ConnectionTrait>(
    conn: &C,
    entry_id: i32,
) -> Result<Option<(StockEntry, commande::Model)>, DomainError> {
    let Some(entry) = stock_entry::Entity::find_by_id(entry_id).one(conn).await? else {
        return Ok(None);
    };

    let origin = command_item::Entity::find_by_id(entry.command_item_id)
        .find_also_related(commande::Entity)
        .one(conn)
        .await?
        .and_then(|(_, header)| header)
        .ok_or_else(|| {
            DomainError::Integrity(format!(
                "Stock entry {} references missing line {}",
                entry.id, entry.command_item_id
            ))
        })?;

    Ok(Some((entry.into(), origin)))
}
