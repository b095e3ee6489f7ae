//! SeaORM implementation of ProductTypeRepository

use std::collections::HashSet;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

use crate::domain::{CreateProductTypeInput, DomainError, ProductType, ProductTypeRepository};
use crate::models::product_type::{self, ActiveModel, Entity as ProductTypeEntity, Model};

/// SeaORM-based implementation of ProductTypeRepository
pub struct SeaOrmProductTypeRepository {
    db: DatabaseConnection,
}

impl SeaOrmProductTypeRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn to_product_type(p: Model) -> ProductType {
    ProductType {
        id: p.id,
        name: p.name,
        unit: p.unit,
        category: p.category,
        created_at: p.created_at,
        updated_at: p.updated_at,
    }
}

/// Looks all `ids` up in one query and returns the first one, in input
/// order, that does not exist.
pub async fn first_missing_product_type<C: ConnectionTrait>(
    conn: &C,
    ids: &[i32],
) -> Result<Option<i32>, DomainError> {
    if ids.is_empty() {
        return Ok(None);
    }

    let found: HashSet<i32> = ProductTypeEntity::find()
        .select_only()
        .column(product_type::Column::Id)
        .filter(product_type::Column::Id.is_in(ids.iter().copied()))
        .into_tuple::<i32>()
        .all(conn)
        .await?
        .into_iter()
        .collect();

    Ok(ids.iter().copied().find(|id| !found.contains(id)))
}

#[async_trait]
impl ProductTypeRepository for SeaOrmProductTypeRepository {
    async fn find_all(&self) -> Result<Vec<ProductType>, DomainError> {
        let types = ProductTypeEntity::find()
            .order_by_asc(product_type::Column::Name)
            .all(&self.db)
            .await?;
        Ok(types.into_iter().map(to_product_type).collect())
    }

    async fn create(&self, input: CreateProductTypeInput) -> Result<ProductType, DomainError> {
        let now = chrono::Utc::now().to_rfc3339();
        let name = input.name.trim().to_owned();

        let model = ActiveModel {
            name: Set(name.clone()),
            unit: Set(input.unit.trim().to_owned()),
            category: Set(input.category),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model.insert(&self.db).await.map_err(|e| match DomainError::from(e) {
            DomainError::Conflict(_) => {
                DomainError::Conflict(format!("ProductType '{}' already exists", name))
            }
            other => other,
        })?;

        Ok(to_product_type(result))
    }
}
