//! PostgreSQL adapters for the repository ports.
//!
//! Row structs and the Diesel schema stay private to this module; adapters
//! translate them into domain types and map every database failure onto
//! the port's error enum.
//!
//! ```ignore
//! use agroai::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/agroai")).await?;
//! let users = DieselUserRepository::new(pool);
//! ```

mod diesel_basic_error_mapping;
mod diesel_equipment_repository;
mod diesel_livestock_repository;
mod diesel_payment_attempt_repository;
mod diesel_rental_repository;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_equipment_repository::DieselEquipmentRepository;
pub use diesel_livestock_repository::{DieselLivestockLogRepository, DieselLivestockRepository};
pub use diesel_payment_attempt_repository::DieselPaymentAttemptRepository;
pub use diesel_rental_repository::DieselRentalRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
