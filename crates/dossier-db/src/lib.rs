pub mod config;
pub mod cookie_repository;
pub mod database;
pub mod repository;

pub use config::DatabaseConfig;
pub use cookie_repository::CookieRepository;
pub use database::Database;
pub use repository::ProfileRepository;
