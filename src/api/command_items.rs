use axum::{extract::State, response::Response};
use serde::Deserialize;

use crate::api::response::{ok, ApiJson, ApiPath};
use crate::domain::DomainError;
use crate::infrastructure::auth::AuthUser;
use crate::infrastructure::AppState;
use crate::services::command_item_service;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLineStatusRequest {
    statut_ligne: String,
}

pub async fn update_status(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<UpdateLineStatusRequest>,
) -> Result<Response, DomainError> {
    let item = command_item_service::update_status(
        state.db(),
        state.config.transaction_timeout,
        &user.actor,
        id,
        &payload.statut_ligne,
    )
    .await?;
    Ok(ok(item))
}
