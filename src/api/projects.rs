use axum::{extract::State, response::Response};
use validator::Validate;

use crate::api::response::{created, ok, ApiJson, ApiPath};
use crate::domain::{CreateProjectInput, DomainError, ProjectWithCommandes, Role};
use crate::infrastructure::auth::AuthUser;
use crate::infrastructure::AppState;

pub async fn create_project(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<CreateProjectInput>,
) -> Result<Response, DomainError> {
    if user.actor.role != Role::ChefProjet {
        return Err(DomainError::Forbidden(
            "Only a ChefProjet can create a project".to_string(),
        ));
    }
    payload.validate()?;
    if !payload.budget.is_finite() {
        return Err(DomainError::validation("budget must be a number"));
    }

    let project = state.project_repo.create(user.actor.id, payload).await?;
    tracing::info!("Project {} created by user {}", project.id, user.actor.id);
    Ok(created(project))
}

pub async fn get_project(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<i32>,
) -> Result<Response, DomainError> {
    let project = state
        .project_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("Project {} not found", id)))?;

    if !(user.actor.is_admin() || user.actor.is_chef_of(project.chef_projet_id)) {
        return Err(DomainError::Forbidden(
            "Only an Admin or the project's ChefProjet can view it".to_string(),
        ));
    }

    let commande_ids = state.project_repo.commande_ids(id).await?;
    Ok(ok(ProjectWithCommandes {
        project,
        commande_ids,
    }))
}
