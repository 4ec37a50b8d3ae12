//! Rental workflow: farmers request equipment, owners approve or reject.

use std::sync::Arc;

use mockable::Clock;
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use crate::domain::ports::{RentalCreation, RentalRepository, RentalRepositoryError};
use crate::domain::{
    Error, Money, Rental, RentalDecision, RentalId, RentalRequest, RentalStatus, RentalSummary,
    User,
};

/// Message used whenever a rental is absent or not the caller's.
pub const RENTAL_NOT_FOUND_MESSAGE: &str = "Rental not found";

fn map_rental_error(error: RentalRepositoryError) -> Error {
    match error {
        RentalRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("rental repository unavailable: {message}"))
        }
        other => Error::internal(format!("rental repository error: {other}")),
    }
}

/// Total earned from approved rentals of an owner's equipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Earnings {
    pub total: Money,
    pub approved_rentals: usize,
}

#[derive(Clone)]
pub struct RentalService {
    rentals: Arc<dyn RentalRepository>,
    clock: Arc<dyn Clock>,
}

impl RentalService {
    pub fn new(rentals: Arc<dyn RentalRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { rentals, clock }
    }

    /// Price and store a pending rental.
    ///
    /// The repository prices the period against the locked equipment row,
    /// so a concurrent price edit cannot slip between lookup and insert.
    pub async fn create(&self, request: &RentalRequest) -> Result<Rental, Error> {
        let creation = self
            .rentals
            .create(RentalId::random(), request, self.clock.utc())
            .await
            .map_err(map_rental_error)?;
        match creation {
            RentalCreation::Created(rental) => {
                info!(
                    rental_id = %rental.id,
                    equipment_id = %rental.equipment_id,
                    total_cost = %rental.quote.total_cost,
                    "rental requested"
                );
                Ok(rental)
            }
            RentalCreation::EquipmentMissing => Err(Error::not_found("Equipment not found")),
            RentalCreation::Rejected(error) => Err(Error::invalid_request(error.to_string())),
        }
    }

    /// Approve or reject a pending rental of the owner's equipment.
    ///
    /// The guarded update only touches pending rows owned by `owner`. When
    /// nothing changed, a follow-up read tells a missing or foreign rental
    /// apart from one that already left `pending`.
    pub async fn decide(
        &self,
        owner: &User,
        id: &RentalId,
        decision: RentalDecision,
    ) -> Result<Rental, Error> {
        if let Some(rental) = self
            .rentals
            .decide(id, owner.id(), decision)
            .await
            .map_err(map_rental_error)?
        {
            info!(rental_id = %rental.id, status = %rental.status, "rental decided");
            return Ok(rental);
        }

        let current = self.rentals.find(id).await.map_err(map_rental_error)?;
        match current {
            Some(rental) if rental.owner_id == *owner.id() => {
                match rental.status.apply(decision) {
                    Err(transition) => Err(Error::conflict(transition.to_string())),
                    // Still pending: the row changed between the update and the read.
                    Ok(_) => Err(Error::conflict(format!("rental {id} changed concurrently"))),
                }
            }
            _ => Err(Error::not_found(RENTAL_NOT_FOUND_MESSAGE)),
        }
    }

    pub async fn list_for_owner(&self, owner: &User) -> Result<Vec<RentalSummary>, Error> {
        self.rentals
            .list_for_owner(owner.id())
            .await
            .map_err(map_rental_error)
    }

    pub async fn list_for_farmer(&self, farmer: &User) -> Result<Vec<RentalSummary>, Error> {
        self.rentals
            .list_for_farmer(farmer.id())
            .await
            .map_err(map_rental_error)
    }

    pub async fn earnings(&self, owner: &User) -> Result<Earnings, Error> {
        let rentals = self.list_for_owner(owner).await?;
        let approved: Vec<_> = rentals
            .iter()
            .filter(|summary| summary.rental.status == RentalStatus::Approved)
            .collect();
        let total = approved
            .iter()
            .try_fold(Money::ZERO, |sum, summary| {
                sum.checked_add(summary.rental.quote.total_cost)
            })
            .map_err(|error| Error::internal(format!("earnings overflow: {error}")))?;
        Ok(Earnings {
            total,
            approved_rentals: approved.len(),
        })
    }
}

#[cfg(test)]
#[path = "rental_service_tests.rs"]
mod tests;
