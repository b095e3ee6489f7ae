//! Repository implementations using SeaORM

pub mod commande_repository;
pub mod product_type_repository;
pub mod project_repository;
pub mod user_repository;

pub use commande_repository::SeaOrmCommandeRepository;
pub use product_type_repository::SeaOrmProductTypeRepository;
pub use project_repository::SeaOrmProjectRepository;
pub use user_repository::SeaOrmUserRepository;
