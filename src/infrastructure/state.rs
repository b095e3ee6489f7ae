//! Application state containing repositories and shared resources

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::domain::{CommandeRepository, ProductTypeRepository, ProjectRepository, UserRepository};
use crate::infrastructure::config::Config;
use crate::infrastructure::{
    SeaOrmCommandeRepository, SeaOrmProductTypeRepository, SeaOrmProjectRepository,
    SeaOrmUserRepository,
};
use crate::services::CommandeService;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    pub config: Arc<Config>,
    pub user_repo: Arc<dyn UserRepository>,
    pub project_repo: Arc<dyn ProjectRepository>,
    pub product_type_repo: Arc<dyn ProductTypeRepository>,
    pub commande_repo: Arc<dyn CommandeRepository>,
    /// Commande lifecycle engine
    pub commandes: Arc<CommandeService>,
}

impl AppState {
    /// Create a new AppState with all repositories initialized
    pub fn new(db: DatabaseConnection, config: Config) -> Self {
        let user_repo: Arc<dyn UserRepository> = Arc::new(SeaOrmUserRepository::new(db.clone()));
        let project_repo: Arc<dyn ProjectRepository> =
            Arc::new(SeaOrmProjectRepository::new(db.clone()));
        let product_type_repo: Arc<dyn ProductTypeRepository> =
            Arc::new(SeaOrmProductTypeRepository::new(db.clone()));
        let commande_repo: Arc<dyn CommandeRepository> =
            Arc::new(SeaOrmCommandeRepository::new(db.clone()));

        let commandes = Arc::new(CommandeService::new(
            db.clone(),
            config.transaction_timeout,
            commande_repo.clone(),
            project_repo.clone(),
            user_repo.clone(),
        ));

        Self {
            db,
            config: Arc::new(config),
            user_repo,
            project_repo,
            product_type_repo,
            commande_repo,
            commandes,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl axum::extract::FromRef<AppState> for DatabaseConnection {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}
