#![allow(dead_code)]

use natec::config::Config;
use natec::db;
use natec::domain::commande::NewCommandItem;
use natec::domain::{Actor, CreateCommandeInput, Role};
use natec::infrastructure::AppState;
use natec::models::{product_type, project, user};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

pub const SECRET: &str = "test-secret";

pub async fn setup_test_state() -> AppState {
    let db = db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB");
    AppState::new(db, Config::with_secret(SECRET))
}

pub async fn create_user(db: &DatabaseConnection, username: &str, role: Role) -> Actor {
    let now = chrono::Utc::now().to_rfc3339();
    let is_supplier = role == Role::Supplier;
    let model = user::ActiveModel {
        username: Set(username.to_string()),
        password_hash: Set("hash".to_string()),
        role: Set(role.as_str().to_string()),
        contact: Set(is_supplier.then(|| "Contact".to_string())),
        phone: Set(is_supplier.then(|| "0600000000".to_string())),
        address: Set(is_supplier.then(|| "1 rue du Chantier".to_string())),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };
    let res = model.insert(db).await.expect("Failed to create user");
    Actor { id: res.id, role }
}

pub async fn create_project(db: &DatabaseConnection, chef_projet_id: i32) -> i32 {
    let now = chrono::Utc::now().to_rfc3339();
    let model = project::ActiveModel {
        name: Set("Résidence Les Pins".to_string()),
        budget: Set(250_000.0),
        status: Set("En cours".to_string()),
        chef_projet_id: Set(chef_projet_id),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };
    model.insert(db).await.expect("Failed to create project").id
}

pub async fn create_product_type(db: &DatabaseConnection, name: &str, unit: &str) -> i32 {
    let now = chrono::Utc::now().to_rfc3339();
    let model = product_type::ActiveModel {
        name: Set(name.to_string()),
        unit: Set(unit.to_string()),
        category: Set(Some("Matériaux".to_string())),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };
    model
        .insert(db)
        .await
        .expect("Failed to create product type")
        .id
}

pub fn commande_input(projet_id: i32, lines: &[(i32, i32)]) -> CreateCommandeInput {
    CreateCommandeInput {
        name: "CMD-001".to_string(),
        kind: Some("Gros oeuvre".to_string()),
        date_cmd: None,
        montant_total: 1500.0,
        projet_id,
        items: lines
            .iter()
            .map(|&(product_type_id, quantite_commandee)| NewCommandItem {
                product_type_id,
                quantite_commandee,
                prix_unitaire: Some(10.0),
            })
            .collect(),
    }
}

/// A ChefProjet, a Supplier, an Admin, one project and two product types
pub struct Fixture {
    pub state: AppState,
    pub chef: Actor,
    pub supplier: Actor,
    pub admin: Actor,
    pub project_id: i32,
    pub ciment: i32,
    pub sable: i32,
}

pub async fn fixture() -> Fixture {
    let state = setup_test_state().await;
    let db = state.db().clone();
    let chef = create_user(&db, "chef", Role::ChefProjet).await;
    let supplier = create_user(&db, "fournisseur", Role::Supplier).await;
    let admin = create_user(&db, "admin", Role::Admin).await;
    let project_id = create_project(&db, chef.id).await;
    let ciment = create_product_type(&db, "Ciment", "sac").await;
    let sable = create_product_type(&db, "Sable", "m3").await;

    Fixture {
        state,
        chef,
        supplier,
        admin,
        project_id,
        ciment,
        sable,
    }
}
