use axum::{extract::State, response::Response};
use serde::Deserialize;

use crate::api::response::{ok, ApiPath, ApiQuery};
use crate::domain::DomainError;
use crate::infrastructure::auth::AuthUser;
use crate::infrastructure::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockFilter {
    product_type_id: Option<i32>,
}

pub async fn list_stock(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(filter): ApiQuery<StockFilter>,
) -> Result<Response, DomainError> {
    let entries = state
        .commandes
        .list_stock(&user.actor, filter.product_type_id)
        .await?;
    Ok(ok(entries))
}

pub async fn get_stock_entry(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<i32>,
) -> Result<Response, DomainError> {
    Ok(ok(state.commandes.get_stock_entry(&user.actor, id).await?))
}
