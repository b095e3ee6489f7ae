//! Commande lifecycle engine
//!
//! Creation, supplier assignment and supplier confirmation, plus the
//! role-scoped read side. Every multi-row write runs in one transaction
//! bounded by the configured deadline; status changes are guarded
//! `UPDATE ... WHERE statut_cmd = <required>` statements so that of two
//! racing callers only the first succeeds.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::*;

use crate::domain::commande::check_integrity;
use crate::domain::{
    Actor, Commande, CommandeRepository, CommandeScope, CommandeStatus, CommandeWithItems,
    CreateCommandeInput, DomainError, FieldError, LineStatus, ProjectRepository, Role,
    StockEntry, UserRepository,
};
use crate::infrastructure::commande_repository::list_items_for_order;
use crate::infrastructure::db::{settle, with_deadline};
use crate::infrastructure::product_type_repository::first_missing_product_type;
use crate::models::{command_item, commande, project, project_commande};
use crate::services::stock_ledger;

pub struct CommandeService {
    db: DatabaseConnection,
    tx_timeout: Duration,
    commandes: Arc<dyn CommandeRepository>,
    projects: Arc<dyn ProjectRepository>,
    users: Arc<dyn UserRepository>,
}

impl CommandeService {
    pub fn new(
        db: DatabaseConnection,
        tx_timeout: Duration,
        commandes: Arc<dyn CommandeRepository>,
        projects: Arc<dyn ProjectRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            db,
            tx_timeout,
            commandes,
            projects,
            users,
        }
    }

    /// Creates a commande with all its lines and appends it to the project's
    /// order list, atomically.
    pub async fn create(
        &self,
        actor: &Actor,
        input: CreateCommandeInput,
    ) -> Result<CommandeWithItems, DomainError> {
        if actor.role != Role::ChefProjet {
            return Err(DomainError::Forbidden(
                "Only a ChefProjet can create a commande".to_string(),
            ));
        }
        input.check()?;

        let created = with_deadline(self.tx_timeout, async {
            let txn = self.db.begin().await?;
            let result = create_in(&txn, &input).await;
            settle(txn, result).await
        })
        .await?;

        tracing::info!(
            "Commande {} created on project {} with {} line(s) by user {}",
            created.commande.id,
            created.commande.projet_id,
            created.items.len(),
            actor.id
        );
        Ok(created)
    }

    pub async fn assign_supplier(
        &self,
        actor: &Actor,
        commande_id: i32,
        supplier_id: i32,
    ) -> Result<Commande, DomainError> {
        let model = load_commande(&self.db, commande_id).await?;

        let project = self.projects.find_by_id(model.projet_id).await?.ok_or_else(|| {
            DomainError::Integrity(format!(
                "Commande {} references missing project {}",
                model.id, model.projet_id
            ))
        })?;
        if !(actor.is_admin() || actor.is_chef_of(project.chef_projet_id)) {
            return Err(DomainError::Forbidden(
                "Only an Admin or the project's ChefProjet can assign a supplier".to_string(),
            ));
        }

        let target = CommandeStatus::EnAttenteValidationFournisseur;
        let required = transition_from(&model, target)?;

        let supplier = self
            .users
            .find_by_id(supplier_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Supplier {} not found", supplier_id)))?;
        if supplier.role() != Role::Supplier {
            return Err(DomainError::Validation {
                message: format!("User {} is not a Supplier", supplier_id),
                details: vec![FieldError {
                    field: "supplierId".to_string(),
                    message: "must reference a Supplier".to_string(),
                }],
            });
        }

        check_integrity(&model)?;

        let updated = with_deadline(self.tx_timeout, async {
            let result = commande::Entity::update_many()
                .col_expr(commande::Column::FournisseurId, Expr::value(supplier_id))
                .col_expr(commande::Column::StatutCmd, Expr::value(target.as_str()))
                .col_expr(commande::Column::UpdatedAt, Expr::value(Utc::now().to_rfc3339()))
                .filter(commande::Column::Id.eq(commande_id))
                .filter(commande::Column::StatutCmd.eq(required.as_str()))
                .exec(&self.db)
                .await?;

            if result.rows_affected == 0 {
                return Err(lost_race(&self.db, commande_id, required).await);
            }
            load_commande(&self.db, commande_id).await
        })
        .await?;

        tracing::info!(
            "Commande {} assigned to supplier {} by user {}",
            commande_id,
            supplier_id,
            actor.id
        );
        Commande::try_from(updated)
    }

    /// Supplier confirmation: flips the header and every pending line, and
    /// credits stock for each line flipped here, in one transaction.
    pub async fn confirm(
        &self,
        actor: &Actor,
        commande_id: i32,
    ) -> Result<CommandeWithItems, DomainError> {
        let model = load_commande(&self.db, commande_id).await?;

        if !(actor.is_admin() || actor.is_supplier(model.fournisseur_id)) {
            return Err(DomainError::Forbidden(
                "Only an Admin or the assigned supplier can confirm this commande".to_string(),
            ));
        }

        let target = CommandeStatus::ValideeFournisseur;
        let required = transition_from(&model, target)?;

        let confirmed = with_deadline(self.tx_timeout, async {
            let txn = self.db.begin().await?;
            let result = confirm_in(&txn, commande_id, required, target).await;
            settle(txn, result).await
        })
        .await?;

        tracing::info!("Commande {} confirmed by user {}", commande_id, actor.id);
        Ok(confirmed)
    }

    /// Commandes visible to the actor, newest first
    pub async fn list_visible(&self, actor: &Actor) -> Result<Vec<Commande>, DomainError> {
        self.commandes.list(visible_scope(actor)).await
    }

    pub async fn get(&self, actor: &Actor, commande_id: i32) -> Result<CommandeWithItems, DomainError> {
        let commande = self
            .commandes
            .find_by_id(commande_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Commande {} not found", commande_id)))?;

        if !self
            .can_view(actor, commande.projet_id, commande.fournisseur_id)
            .await?
        {
            return Err(DomainError::Forbidden(
                "You do not have access to this commande".to_string(),
            ));
        }

        let items = self.commandes.list_items_for_order(commande_id).await?;
        Ok(CommandeWithItems { commande, items })
    }

    async fn can_view(
        &self,
        actor: &Actor,
        projet_id: i32,
        fournisseur_id: Option<i32>,
    ) -> Result<bool, DomainError> {
        Ok(match actor.role {
            Role::Admin => true,
            Role::Supplier => actor.is_supplier(fournisseur_id),
            Role::ChefProjet => self
                .projects
                .find_by_id(projet_id)
                .await?
                .map(|p| actor.is_chef_of(p.chef_projet_id))
                .unwrap_or(false),
        })
    }

    /// Stock credited from the commandes the actor can see
    pub async fn list_stock(
        &self,
        actor: &Actor,
        product_type_id: Option<i32>,
    ) -> Result<Vec<StockEntry>, DomainError> {
        stock_ledger::list_entries(&self.db, visible_scope(actor), product_type_id).await
    }

    pub async fn get_stock_entry(
        &self,
        actor: &Actor,
        entry_id: i32,
    ) -> Result<StockEntry, DomainError> {
        let (entry, origin) = stock_ledger::find_entry(&self.db, entry_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Stock entry {} not found", entry_id)))?;

        if !self
            .can_view(actor, origin.projet_id, origin.fournisseur_id)
            .await?
        {
            return Err(DomainError::Forbidden(
                "You do not have access to this stock entry".to_string(),
            ));
        }
        Ok(entry)
    }

    pub async fn list_by_project(
        &self,
        actor: &Actor,
        project_id: i32,
    ) -> Result<Vec<Commande>, DomainError> {
        let project = self
            .projects
            .find_by_id(project_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Project {} not found", project_id)))?;

        if !(actor.is_admin() || actor.is_chef_of(project.chef_projet_id)) {
            return Err(DomainError::Forbidden(
                "Only an Admin or the project's ChefProjet can list its commandes".to_string(),
            ));
        }

        self.commandes.list(CommandeScope::Project(project_id)).await
    }

    pub async fn list_mine(&self, actor: &Actor) -> Result<Vec<Commande>, DomainError> {
        if actor.role != Role::Supplier {
            return Err(DomainError::Forbidden(
                "Only a Supplier has assigned commandes".to_string(),
            ));
        }
        self.commandes.list(CommandeScope::AssignedTo(actor.id)).await
    }
}

fn visible_scope(actor: &Actor) -> CommandeScope {
    match actor.role {
        Role::Admin => CommandeScope::All,
        Role::ChefProjet => CommandeScope::ManagedBy(actor.id),
        Role::Supplier => CommandeScope::AssignedTo(actor.id),
    }
}

async fn load_commande<C: ConnectionTrait>(
    conn: &C,
    commande_id: i32,
) -> Result<commande::Model, DomainError> {
    commande::Entity::find_by_id(commande_id)
        .one(conn)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("Commande {} not found", commande_id)))
}

/// Checks that the stored commande may move to `target` and returns the
/// state its guarded update must match.
fn transition_from(
    model: &commande::Model,
    target: CommandeStatus,
) -> Result<CommandeStatus, DomainError> {
    let current = CommandeStatus::parse_stored(model.id, &model.statut_cmd)?;
    if current.can_transition_to(target) {
        return Ok(current);
    }
    let required = target.previous().map_or("none", |s| s.as_str());
    Err(DomainError::state_conflict(
        "Commande", model.id, current, required,
    ))
}

/// Conflict for a guarded update that matched no row because another
/// caller moved the commande first.
async fn lost_race<C: ConnectionTrait>(
    conn: &C,
    commande_id: i32,
    required: CommandeStatus,
) -> DomainError {
    match load_commande(conn, commande_id).await {
        Ok(model) => {
            tracing::warn!(
                "Commande {} changed state concurrently (now '{}')",
                commande_id,
                model.statut_cmd
            );
            DomainError::state_conflict("Commande", commande_id, model.statut_cmd, required)
        }
        Err(e) => e,
    }
}

async fn create_in(
    txn: &DatabaseTransaction,
    input: &CreateCommandeInput,
) -> Result<CommandeWithItems, DomainError> {
    if project::Entity::find_by_id(input.projet_id)
        .one(txn)
        .await?
        .is_none()
    {
        return Err(DomainError::NotFound(format!(
            "Project {} not found",
            input.projet_id
        )));
    }

    if let Some(missing) = first_missing_product_type(txn, &input.product_type_ids()).await? {
        return Err(DomainError::NotFound(format!(
            "ProductType {} not found",
            missing
        )));
    }

    let now = Utc::now().to_rfc3339();
    let date_cmd = input
        .date_cmd
        .map(|d| d.to_rfc3339())
        .unwrap_or_else(|| now.clone());

    let header = commande::ActiveModel {
        name: Set(input.name.trim().to_owned()),
        r#type: Set(input.kind.clone()),
        statut_cmd: Set(CommandeStatus::EnAttenteAssignation.as_str().to_owned()),
        date_cmd: Set(date_cmd),
        montant_total: Set(input.montant_total),
        fournisseur_id: Set(None),
        projet_id: Set(input.projet_id),
        created_at: Set(now.clone()),
        updated_at: Set(now.clone()),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    let lines = input.items.iter().map(|item| command_item::ActiveModel {
        commande_id: Set(header.id),
        product_type_id: Set(item.product_type_id),
        quantite_commandee: Set(item.quantite_commandee),
        prix_unitaire: Set(item.prix_unitaire),
        statut_ligne: Set(LineStatus::Soumis.as_str().to_owned()),
        created_at: Set(now.clone()),
        updated_at: Set(now.clone()),
        ..Default::default()
    });
    command_item::Entity::insert_many(lines)
        .exec_without_returning(txn)
        .await?;

    project_commande::Entity::insert(project_commande::ActiveModel {
        project_id: Set(input.projet_id),
        commande_id: Set(header.id),
    })
    .exec_without_returning(txn)
    .await?;

    let items = list_items_for_order(txn, header.id).await?;
    Ok(CommandeWithItems {
        commande: Commande::try_from(header)?,
        items,
    })
}

async fn confirm_in(
    txn: &DatabaseTransaction,
    commande_id: i32,
    required: CommandeStatus,
    target: CommandeStatus,
) -> Result<CommandeWithItems, DomainError> {
    let now = Utc::now().to_rfc3339();

    let flipped = commande::Entity::update_many()
        .col_expr(
            commande::Column::StatutCmd,
            Expr::value(target.as_str()),
        )
        .col_expr(commande::Column::UpdatedAt, Expr::value(now.clone()))
        .filter(commande::Column::Id.eq(commande_id))
        .filter(commande::Column::StatutCmd.eq(required.as_str()))
        .exec(txn)
        .await?;
    if flipped.rows_affected == 0 {
        return Err(lost_race(txn, commande_id, required).await);
    }

    let pending = command_item::Entity::find()
        .filter(command_item::Column::CommandeId.eq(commande_id))
        .filter(command_item::Column::StatutLigne.eq(LineStatus::Soumis.as_str()))
        .order_by_asc(command_item::Column::Id)
        .all(txn)
        .await?;

    if pending.is_empty() {
        tracing::warn!(
            "Commande {} confirmed with no pending lines; no stock created",
            commande_id
        );
    } else {
        let ids: Vec<i32> = pending.iter().map(|item| item.id).collect();
        command_item::Entity::update_many()
            .col_expr(
                command_item::Column::StatutLigne,
                Expr::value(LineStatus::ValideFournisseur.as_str()),
            )
            .col_expr(command_item::Column::UpdatedAt, Expr::value(now.clone()))
            .filter(command_item::Column::Id.is_in(ids))
            .filter(command_item::Column::StatutLigne.eq(LineStatus::Soumis.as_str()))
            .exec(txn)
            .await?;

        let credited = stock_ledger::credit_lines(txn, commande_id, &pending, &now).await?;
        tracing::info!(
            "Commande {}: {} line(s) validated, {} stock entr(ies) created",
            commande_id,
            pending.len(),
            credited
        );
    }

    let header = load_commande(txn, commande_id).await?;
    let items = list_items_for_order(txn, commande_id).await?;
    Ok(CommandeWithItems {
        commande: Commande::try_from(header)?,
        items,
    })
}
