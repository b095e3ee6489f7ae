//! SeaORM implementation of CommandeRepository

use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

use crate::domain::commande::ProductTypeSummary;
use crate::domain::{CommandItem, Commande, CommandeRepository, CommandeScope, DomainError};
use crate::models::{command_item, commande, product_type, project};

/// SeaORM-based implementation of CommandeRepository
pub struct SeaOrmCommandeRepository {
    db: DatabaseConnection,
}

impl SeaOrmCommandeRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Lines of one commande with their product type resolved. Usable inside a
/// transaction so a confirmation can return what it just wrote.
pub async fn list_items_for_order<C: ConnectionTrait>(
    conn: &C,
    commande_id: i32,
) -> Result<Vec<CommandItem>, DomainError> {
    command_item::Entity::find()
        .filter(command_item::Column::CommandeId.eq(commande_id))
        .find_also_related(product_type::Entity)
        .order_by_asc(command_item::Column::Id)
        .all(conn)
        .await?
        .into_iter()
        .map(|(item, pt)| CommandItem::from_model(item, pt.map(ProductTypeSummary::from)))
        .collect()
}

#[async_trait]
impl CommandeRepository for SeaOrmCommandeRepository {
    async fn list(&self, scope: CommandeScope) -> Result<Vec<Commande>, DomainError> {
        let query = commande::Entity::find();
        let query = match scope {
            CommandeScope::All => query,
            CommandeScope::ManagedBy(chef_id) => query
                .inner_join(project::Entity)
                .filter(project::Column::ChefProjetId.eq(chef_id)),
            CommandeScope::AssignedTo(supplier_id) => {
                query.filter(commande::Column::FournisseurId.eq(supplier_id))
            }
            CommandeScope::Project(project_id) => {
                query.filter(commande::Column::ProjetId.eq(project_id))
            }
        };

        query
            .order_by_desc(commande::Column::DateCmd)
            .order_by_desc(commande::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Commande::try_from)
            .collect()
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Commande>, DomainError> {
        commande::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Commande::try_from)
            .transpose()
    }

    async fn list_items_for_order(
        &self,
        commande_id: i32,
    ) -> Result<Vec<CommandItem>, DomainError> {
        list_items_for_order(&self.db, commande_id).await
    }
}
