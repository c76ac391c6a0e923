pub mod app_config;
pub mod database;
pub mod booking_repo;
pub mod catalog_repo;
pub mod memory_ledger;
pub mod redis_repo;

pub use database::DbClient;
pub use booking_repo::PgReservationLedger;
pub use catalog_repo::PgCatalogRepository;
pub use memory_ledger::MemoryLedger;
pub use redis_repo::RedisClient;
