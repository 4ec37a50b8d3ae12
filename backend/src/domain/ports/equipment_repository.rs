//! Port for equipment listing persistence.

use async_trait::async_trait;

use crate::domain::{Equipment, EquipmentDetails, EquipmentId, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by equipment repository adapters.
    pub enum EquipmentRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "equipment repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "equipment repository query failed: {message}",
        /// The listing is still referenced by rentals.
        InUse => "equipment is referenced by existing rentals",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EquipmentRepository: Send + Sync {
    /// Every listing, newest first.
    async fn list_all(&self) -> Result<Vec<Equipment>, EquipmentRepositoryError>;

    async fn find(&self, id: &EquipmentId) -> Result<Option<Equipment>, EquipmentRepositoryError>;

    /// Listings belonging to `owner`, newest first.
    async fn list_for_owner(
        &self,
        owner: &UserId,
    ) -> Result<Vec<Equipment>, EquipmentRepositoryError>;

    async fn insert(&self, equipment: &Equipment) -> Result<(), EquipmentRepositoryError>;

    /// Replace the listing fields when `owner` owns `id`.
    ///
    /// Returns `false` when no row matched.
    async fn update(
        &self,
        owner: &UserId,
        id: &EquipmentId,
        details: &EquipmentDetails,
    ) -> Result<bool, EquipmentRepositoryError>;

    /// Delete the listing when `owner` owns `id`.
    ///
    /// Returns `false` when no row matched.
    async fn delete(
        &self,
        owner: &UserId,
        id: &EquipmentId,
    ) -> Result<bool, EquipmentRepositoryError>;
}
