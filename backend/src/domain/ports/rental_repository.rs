//! Port for rental persistence, including the transactional create.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    MoneyError, Rental, RentalDecision, RentalId, RentalRequest, RentalSummary, UserId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by rental repository adapters.
    pub enum RentalRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "rental repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "rental repository query failed: {message}",
    }
}

/// Result of the locked lookup-then-insert performed by
/// [`RentalRepository::create`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RentalCreation {
    /// The rental was stored with status `pending`.
    Created(Rental),
    /// The referenced equipment does not exist.
    EquipmentMissing,
    /// The total cost could not be computed.
    Rejected(MoneyError),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RentalRepository: Send + Sync {
    /// Lock the equipment row, price the period against it and insert the
    /// rental, all in one transaction.
    async fn create(
        &self,
        id: RentalId,
        request: &RentalRequest,
        created_at: DateTime<Utc>,
    ) -> Result<RentalCreation, RentalRepositoryError>;

    async fn find(&self, id: &RentalId) -> Result<Option<Rental>, RentalRepositoryError>;

    /// Apply `decision` only when the rental is owned by `owner` and still
    /// pending. Returns the updated rental, or `None` when nothing matched.
    async fn decide(
        &self,
        id: &RentalId,
        owner: &UserId,
        decision: RentalDecision,
    ) -> Result<Option<Rental>, RentalRepositoryError>;

    /// Rentals of `owner`'s equipment, newest first.
    async fn list_for_owner(
        &self,
        owner: &UserId,
    ) -> Result<Vec<RentalSummary>, RentalRepositoryError>;

    /// Rentals requested by `farmer`, newest first.
    async fn list_for_farmer(
        &self,
        farmer: &UserId,
    ) -> Result<Vec<RentalSummary>, RentalRepositoryError>;
}
