//! Repository trait definitions
//!
//! These traits define the contract for data access.
//! Implementations live in the infrastructure layer.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::commande::{Commande, CommandItem};
use super::user::{NewUser, User};
use super::DomainError;

/// Project data for API responses
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub budget: f64,
    pub status: String,
    pub chef_projet_id: i32,
    pub created_at: String,
    pub updated_at: String,
}

/// Project with the ids of the commandes placed on it, oldest first
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectWithCommandes {
    #[serde(flatten)]
    pub project: Project,
    pub commande_ids: Vec<i32>,
}

/// Input for creating a project
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectInput {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    pub description: Option<String>,
    #[validate(range(min = 0.0, message = "budget cannot be negative"))]
    pub budget: f64,
    pub status: Option<String>,
}

/// Repository trait for Project entity
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<Project>, DomainError>;

    /// Create a project managed by `chef_projet_id`
    async fn create(
        &self,
        chef_projet_id: i32,
        input: CreateProjectInput,
    ) -> Result<Project, DomainError>;

    /// The project's order list
    async fn commande_ids(&self, project_id: i32) -> Result<Vec<i32>, DomainError>;
}

/// Product type data for API responses
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductType {
    pub id: i32,
    pub name: String,
    pub unit: String,
    pub category: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Input for creating a product type
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProductTypeInput {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "unit is required"))]
    pub unit: String,
    pub category: Option<String>,
}

/// Repository trait for ProductType entity
#[async_trait]
pub trait ProductTypeRepository: Send + Sync {
    /// All product types, sorted by name
    async fn find_all(&self) -> Result<Vec<ProductType>, DomainError>;

    async fn create(&self, input: CreateProductTypeInput) -> Result<ProductType, DomainError>;
}

/// A user together with the stored password hash, for login only
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

/// Repository trait for User entity
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<User>, DomainError>;

    async fn find_credentials(&self, username: &str)
        -> Result<Option<UserCredentials>, DomainError>;

    /// Insert a user. A taken username is a `Conflict`.
    async fn create(&self, user: NewUser) -> Result<User, DomainError>;

    /// Users with the Supplier role, sorted by username
    async fn list_suppliers(&self) -> Result<Vec<User>, DomainError>;
}

/// Which commandes a listing covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandeScope {
    All,
    /// Commandes of projects managed by this ChefProjet
    ManagedBy(i32),
    /// Commandes assigned to this supplier
    AssignedTo(i32),
    Project(i32),
}

/// Repository trait for the read side of Commande. Lifecycle writes go
/// through the services, inside a transaction.
#[async_trait]
pub trait CommandeRepository: Send + Sync {
    /// Commandes in `scope`, newest `date_cmd` first
    async fn list(&self, scope: CommandeScope) -> Result<Vec<Commande>, DomainError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<Commande>, DomainError>;

    /// Lines of one commande, in insertion order, with their product type
    async fn list_items_for_order(&self, commande_id: i32)
        -> Result<Vec<CommandItem>, DomainError>;
}
