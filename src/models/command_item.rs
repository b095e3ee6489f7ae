use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "command_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub commande_id: i32,
    pub product_type_id: i32,
    pub quantite_commandee: i32,
    pub prix_unitaire: Option<f64>,
    pub statut_ligne: String, // 'Soumis', 'ValidéFournisseur', 'Annulé'
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::commande::Entity",
        from = "Column::CommandeId",
        to = "super::commande::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Commande,
    #[sea_orm(
        belongs_to = "super::product_type::Entity",
        from = "Column::ProductTypeId",
        to = "super::product_type::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    ProductType,
    #[sea_orm(has_one = "super::stock_entry::Entity")]
    StockEntry,
}

impl Related<super::commande::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Commande.def()
    }
}

impl Related<super::product_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductType.def()
    }
}

impl Related<super::stock_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockEntry.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
