//! Services Layer
//!
//! Business operations extracted from HTTP handlers. Each lifecycle write
//! opens its own transaction.

pub mod command_item_service;
pub mod commande_service;
pub mod stock_ledger;

pub use commande_service::CommandeService;
