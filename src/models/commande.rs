use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "commandes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub r#type: Option<String>,
    /// Header status. Valid values, in lifecycle order:
    /// - `EnAttenteAssignation`: created, no supplier yet
    /// - `EnAttenteValidationFournisseur`: supplier assigned
    /// - `ValideeFournisseur`: confirmed by the supplier, stock credited
    pub statut_cmd: String,
    pub date_cmd: String,
    /// Supplied at creation, never recomputed from the lines.
    pub montant_total: f64,
    pub fournisseur_id: Option<i32>,
    pub projet_id: i32,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::project::Entity",
        from = "Column::ProjetId",
        to = "super::project::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Project,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::FournisseurId",
        to = "super::user::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Fournisseur,
    #[sea_orm(has_many = "super::command_item::Entity")]
    CommandItem,
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Fournisseur.def()
    }
}

impl Related<super::command_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CommandItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
