use axum::{extract::State, response::Response};
use validator::Validate;

use crate::api::response::{created, ok, ApiJson};
use crate::domain::{CreateProductTypeInput, DomainError};
use crate::infrastructure::auth::AuthUser;
use crate::infrastructure::AppState;

pub async fn list_product_types(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Response, DomainError> {
    Ok(ok(state.product_type_repo.find_all().await?))
}

pub async fn create_product_type(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<CreateProductTypeInput>,
) -> Result<Response, DomainError> {
    if !user.actor.is_admin() {
        return Err(DomainError::Forbidden(
            "Only an Admin can add product types".to_string(),
        ));
    }
    payload.validate()?;

    let product_type = state.product_type_repo.create(payload).await?;
    tracing::info!("ProductType '{}' added", product_type.name);
    Ok(created(product_type))
}
