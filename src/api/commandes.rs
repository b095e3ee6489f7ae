use axum::{extract::State, response::Response};
use serde::Deserialize;

use crate::api::response::{created, ok, ApiJson, ApiPath};
use crate::domain::{CreateCommandeInput, DomainError};
use crate::infrastructure::auth::AuthUser;
use crate::infrastructure::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignSupplierRequest {
    supplier_id: i32,
}

pub async fn create_commande(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<CreateCommandeInput>,
) -> Result<Response, DomainError> {
    let commande = state.commandes.create(&user.actor, payload).await?;
    Ok(created(commande))
}

pub async fn assign_supplier(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<AssignSupplierRequest>,
) -> Result<Response, DomainError> {
    let commande = state
        .commandes
        .assign_supplier(&user.actor, id, payload.supplier_id)
        .await?;
    Ok(ok(commande))
}

pub async fn confirm_commande(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<i32>,
) -> Result<Response, DomainError> {
    let commande = state.commandes.confirm(&user.actor, id).await?;
    Ok(ok(commande))
}

pub async fn list_commandes(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Response, DomainError> {
    Ok(ok(state.commandes.list_visible(&user.actor).await?))
}

pub async fn get_commande(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<i32>,
) -> Result<Response, DomainError> {
    Ok(ok(state.commandes.get(&user.actor, id).await?))
}

pub async fn list_by_project(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(project_id): ApiPath<i32>,
) -> Result<Response, DomainError> {
    Ok(ok(state
        .commandes
        .list_by_project(&user.actor, project_id)
        .await?))
}

pub async fn list_mine(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Response, DomainError> {
    Ok(ok(state.commandes.list_mine(&user.actor).await?))
}
