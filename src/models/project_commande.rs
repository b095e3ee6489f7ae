use sea_orm::entity::prelude::*;

/// A project's order list.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "project_commandes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub project_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub commande_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::project::Entity",
        from = "Column::ProjectId",
        to = "super::project::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Project,
    #[sea_orm(
        belongs_to = "super::commande::Entity",
        from = "Column::CommandeId",
        to = "super::commande::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Commande,
}

impl ActiveModelBehavior for ActiveModel {}
