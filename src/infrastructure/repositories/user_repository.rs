//! SeaORM implementation of UserRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::domain::user::{NewUser, SupplierDetails};
use crate::domain::{DomainError, Role, User, UserCredentials, UserProfile, UserRepository};
use crate::models::user::{self, ActiveModel, Entity as UserEntity};

/// SeaORM-based implementation of UserRepository
pub struct SeaOrmUserRepository {
    db: DatabaseConnection,
}

impl SeaOrmUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for SeaOrmUserRepository {
    async fn find_by_id(&self, id: i32) -> Result<Option<User>, DomainError> {
        UserEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_credentials(
        &self,
        username: &str,
    ) -> Result<Option<UserCredentials>, DomainError> {
        let Some(model) = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        let password_hash = model.password_hash.clone();
        Ok(Some(UserCredentials {
            user: User::try_from(model)?,
            password_hash,
        }))
    }

    async fn create(&self, new_user: NewUser) -> Result<User, DomainError> {
        let now = chrono::Utc::now().to_rfc3339();
        let role = new_user.profile.role();
        let (contact, phone, address) = match new_user.profile {
            UserProfile::Supplier(SupplierDetails {
                contact,
                phone,
                address,
            }) => (Some(contact), Some(phone), Some(address)),
            _ => (None, None, None),
        };

        let model = ActiveModel {
            username: Set(new_user.username.clone()),
            email: Set(new_user.email),
            password_hash: Set(new_user.password_hash),
            role: Set(role.as_str().to_owned()),
            contact: Set(contact),
            phone: Set(phone),
            address: Set(address),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let inserted = model.insert(&self.db).await.map_err(|e| match DomainError::from(e) {
            DomainError::Conflict(_) => {
                DomainError::Conflict(format!("Username '{}' is already taken", new_user.username))
            }
            other => other,
        })?;

        User::try_from(inserted)
    }

    async fn list_suppliers(&self) -> Result<Vec<User>, DomainError> {
        UserEntity::find()
            .filter(user::Column::Role.eq(Role::Supplier.as_str()))
            .order_by_asc(user::Column::Username)
            .all(&self.db)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }
}
