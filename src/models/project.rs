use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub budget: f64,
    pub status: String, // 'Planifié', 'En cours', 'En attente', 'Terminé', 'Annulé'
    /// The ChefProjet managing this project.
    pub chef_projet_id: i32,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ChefProjetId",
        to = "super::user::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    ChefProjet,
    #[sea_orm(has_many = "super::commande::Entity")]
    Commande,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ChefProjet.def()
    }
}

impl Related<super::commande::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Commande.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
