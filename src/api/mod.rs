pub mod auth;
pub mod command_items;
pub mod commandes;
pub mod health;
pub mod product_types;
pub mod projects;
pub mod response;
pub mod stock;
pub mod suppliers;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::infrastructure::AppState;

pub fn api_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Auth
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        // Reference data
        .route("/suppliers", get(suppliers::list_suppliers))
        .route(
            "/product-types",
            get(product_types::list_product_types).post(product_types::create_product_type),
        )
        // Projects
        .route("/projects", post(projects::create_project))
        .route("/projects/:id", get(projects::get_project))
        // Commandes
        .route(
            "/commandes",
            get(commandes::list_commandes).post(commandes::create_commande),
        )
        .route("/commandes/my", get(commandes::list_mine))
        .route("/commandes/projet/:project_id", get(commandes::list_by_project))
        .route("/commandes/:id", get(commandes::get_commande))
        .route(
            "/commandes/:id/assign-supplier",
            patch(commandes::assign_supplier),
        )
        .route("/commandes/:id/validate", post(commandes::confirm_commande))
        // Command items
        .route("/command-items/:id/status", patch(command_items::update_status))
        // Stock ledger
        .route("/stock", get(stock::list_stock))
        .route("/stock/:id", get(stock::get_stock_entry))
        .with_state(state)
}
