use axum::{extract::State, http::StatusCode, response::IntoResponse, response::Response, Json};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::api::response::{created, ok, ApiJson};
use crate::domain::user::{NewUser, SupplierDetails};
use crate::domain::{DomainError, FieldError, Role, User, UserProfile};
use crate::infrastructure::auth::{create_jwt, hash_password, verify_password, AuthUser};
use crate::infrastructure::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, message = "username must be at least 3 characters"))]
    username: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    password: String,
    #[validate(email(message = "email is not valid"))]
    email: Option<String>,
    role: String,
    contact: Option<String>,
    phone: Option<String>,
    address: Option<String>,
}

fn required(field: &str, value: Option<String>, missing: &mut Vec<FieldError>) -> String {
    match value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty()) {
        Some(v) => v,
        None => {
            missing.push(FieldError {
                field: field.to_string(),
                message: format!("{} is required for a Supplier", field),
            });
            String::new()
        }
    }
}

impl RegisterRequest {
    fn profile(&mut self) -> Result<UserProfile, DomainError> {
        let role: Role = self.role.parse().map_err(|_| DomainError::Validation {
            message: format!("Unknown role '{}'", self.role),
            details: vec![FieldError {
                field: "role".to_string(),
                message: "must be ChefProjet or Supplier".to_string(),
            }],
        })?;

        match role {
            Role::Admin => Err(DomainError::Forbidden(
                "Admin accounts cannot be self-registered".to_string(),
            )),
            Role::ChefProjet => Ok(UserProfile::ChefProjet),
            Role::Supplier => {
                let mut missing = Vec::new();
                let details = SupplierDetails {
                    contact: required("contact", self.contact.take(), &mut missing),
                    phone: required("phone", self.phone.take(), &mut missing),
                    address: required("address", self.address.take(), &mut missing),
                };
                if !missing.is_empty() {
                    return Err(DomainError::Validation {
                        message: "Missing supplier details".to_string(),
                        details: missing,
                    });
                }
                Ok(UserProfile::Supplier(details))
            }
        }
    }
}

fn token_for(state: &AppState, user: &User) -> Result<String, DomainError> {
    create_jwt(
        &state.config.jwt_secret,
        state.config.jwt_ttl_hours,
        user.id,
        &user.username,
        user.role(),
    )
    .map_err(|e| DomainError::Database(format!("could not sign token: {}", e)))
}

fn invalid_credentials() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "success": false, "message": "Invalid credentials" })),
    )
        .into_response()
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(mut payload): ApiJson<RegisterRequest>,
) -> Result<Response, DomainError> {
    payload.username = payload.username.trim().to_owned();
    payload.validate()?;
    let profile = payload.profile()?;

    let password_hash = hash_password(&payload.password).map_err(DomainError::Database)?;
    let user = state
        .user_repo
        .create(NewUser {
            username: payload.username,
            email: payload.email,
            password_hash,
            profile,
        })
        .await?;

    tracing::info!("Registered {} account '{}'", user.role(), user.username);
    let token = token_for(&state, &user)?;
    Ok(created(json!({ "token": token, "user": user })))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Response, DomainError> {
    tracing::info!("Login attempt for user: {}", payload.username);

    let Some(credentials) = state.user_repo.find_credentials(&payload.username).await? else {
        tracing::warn!("User not found: {}", payload.username);
        return Ok(invalid_credentials());
    };

    match verify_password(&payload.password, &credentials.password_hash) {
        Ok(true) => {
            let token = token_for(&state, &credentials.user)?;
            Ok(ok(json!({ "token": token, "user": credentials.user })))
        }
        _ => {
            tracing::warn!("Password verification failed for user: {}", payload.username);
            Ok(invalid_credentials())
        }
    }
}

pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Response, DomainError> {
    let found = state
        .user_repo
        .find_by_id(user.actor.id)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("User {} not found", user.actor.id)))?;
    Ok(ok(found))
}
