use sea_orm::sea_query::OnConflict;
use sea_orm::*;

use crate::domain::{DomainError, Role};
use crate::infrastructure::auth::hash_password;
use crate::models::user;

/// Creates the admin account unless the username is already taken.
/// Returns whether a row was inserted.
pub async fn ensure_admin(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
) -> Result<bool, DomainError> {
    let password_hash = hash_password(password).map_err(DomainError::Database)?;
    let now = chrono::Utc::now().to_rfc3339();

    let admin = user::ActiveModel {
        username: Set(username.to_owned()),
        password_hash: Set(password_hash),
        role: Set(Role::Admin.as_str().to_owned()),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };

    let inserted = user::Entity::insert(admin)
        .on_conflict(
            OnConflict::column(user::Column::Username)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    if inserted > 0 {
        tracing::info!("Seeded admin account '{}'", username);
    } else {
        tracing::debug!("Admin account '{}' already present", username);
    }

    Ok(inserted > 0)
}
