use axum::{extract::State, response::Response};

use crate::api::response::ok;
use crate::domain::DomainError;
use crate::infrastructure::auth::AuthUser;
use crate::infrastructure::AppState;

/// Supplier accounts, for picking an assignee
pub async fn list_suppliers(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Response, DomainError> {
    Ok(ok(state.user_repo.list_suppliers().await?))
}
