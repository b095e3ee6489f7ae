use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Inventory ledger row. Each row is credited from exactly one validated
/// command item; `command_item_id` is UNIQUE.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub product_type_id: i32,
    #[sea_orm(unique)]
    pub command_item_id: i32,
    pub quantite_disponible: f64,
    pub date_entree_stock: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::command_item::Entity",
        from = "Column::CommandItemId",
        to = "super::command_item::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    CommandItem,
    #[sea_orm(
        belongs_to = "super::product_type::Entity",
        from = "Column::ProductTypeId",
        to = "super::product_type::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    ProductType,
}

impl Related<super::command_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CommandItem.def()
    }
}

impl Related<super::product_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductType.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
