//! Domain layer - Business rules and abstractions
//!
//! Status machines, DTOs, input validation, repository traits and the
//! domain error type. No Axum here; SeaORM appears only in model conversions.

pub mod commande;
pub mod errors;
pub mod repositories;
pub mod user;

pub use commande::{
    CommandItem, Commande, CommandeStatus, CommandeWithItems, CreateCommandeInput, LineStatus,
    StockEntry,
};
pub use errors::{DomainError, FieldError};
pub use repositories::*;
pub use user::{Actor, Role, User, UserProfile};
