//! Driven ports for the portal's hexagonal boundary.
//!
//! Services depend on these traits; persistence, gateway and hashing
//! adapters implement them. Every trait carries a `mockall` double in test
//! builds.

mod macros;
pub(crate) use macros::define_port_error;

mod advisory_assistant;
mod equipment_repository;
mod livestock_repository;
mod password_hasher;
mod payment_attempt_repository;
mod payment_gateway;
mod rental_repository;
mod user_repository;

#[cfg(test)]
pub use advisory_assistant::MockAdvisoryAssistant;
pub use advisory_assistant::{
    AdvisoryAssistant, AdvisoryAssistantError, FixtureAdvisoryAssistant,
};
#[cfg(test)]
pub use equipment_repository::MockEquipmentRepository;
pub use equipment_repository::{EquipmentRepository, EquipmentRepositoryError};
#[cfg(test)]
pub use livestock_repository::{MockLivestockLogRepository, MockLivestockRepository};
pub use livestock_repository::{
    LivestockLogRepository, LivestockRepository, LivestockRepositoryError,
};
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHasher, PasswordHasherError};
#[cfg(test)]
pub use payment_attempt_repository::MockPaymentAttemptRepository;
pub use payment_attempt_repository::{PaymentAttemptRepository, PaymentAttemptRepositoryError};
#[cfg(test)]
pub use payment_gateway::MockPaymentGateway;
pub use payment_gateway::{
    AccessToken, FixturePaymentGateway, PaymentGateway, PaymentGatewayError,
};
#[cfg(test)]
pub use rental_repository::MockRentalRepository;
pub use rental_repository::{RentalCreation, RentalRepository, RentalRepositoryError};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{StoredCredentials, UserPersistenceError, UserRepository};
