pub mod command_item;
pub mod commande;
pub mod product_type;
pub mod project;
pub mod project_commande;
pub mod stock_entry;
pub mod user;
