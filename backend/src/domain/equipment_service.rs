//! Equipment catalogue: public browsing and owner-managed listings.

use std::sync::Arc;

use tracing::info;

use crate::domain::ports::{EquipmentRepository, EquipmentRepositoryError};
use crate::domain::{Equipment, EquipmentDetails, EquipmentId, Error, User};

/// Message used whenever a listing is absent or not the caller's.
pub const EQUIPMENT_NOT_FOUND_MESSAGE: &str = "Equipment not found";

fn map_equipment_error(error: EquipmentRepositoryError) -> Error {
    match error {
        EquipmentRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("equipment repository unavailable: {message}"))
        }
        EquipmentRepositoryError::InUse => {
            Error::conflict("equipment has rentals and cannot be deleted")
        }
        other => Error::internal(format!("equipment repository error: {other}")),
    }
}

#[derive(Clone)]
pub struct EquipmentService {
    equipment: Arc<dyn EquipmentRepository>,
}

impl EquipmentService {
    pub fn new(equipment: Arc<dyn EquipmentRepository>) -> Self {
        Self { equipment }
    }

    pub async fn list_all(&self) -> Result<Vec<Equipment>, Error> {
        self.equipment.list_all().await.map_err(map_equipment_error)
    }

    pub async fn get(&self, id: &EquipmentId) -> Result<Equipment, Error> {
        self.equipment
            .find(id)
            .await
            .map_err(map_equipment_error)?
            .ok_or_else(|| Error::not_found(EQUIPMENT_NOT_FOUND_MESSAGE))
    }

    pub async fn list_owned(&self, owner: &User) -> Result<Vec<Equipment>, Error> {
        self.equipment
            .list_for_owner(owner.id())
            .await
            .map_err(map_equipment_error)
    }

    pub async fn create(&self, owner: &User, details: EquipmentDetails) -> Result<Equipment, Error> {
        let equipment = Equipment::from_details(EquipmentId::random(), *owner.id(), details);
        self.equipment
            .insert(&equipment)
            .await
            .map_err(map_equipment_error)?;
        info!(equipment_id = %equipment.id, owner_id = %owner.id(), "equipment listed");
        Ok(equipment)
    }

    /// Fetch a listing for editing; someone else's listing reads as absent.
    pub async fn get_owned(&self, owner: &User, id: &EquipmentId) -> Result<Equipment, Error> {
        match self.get(id).await? {
            equipment if equipment.owner_id == *owner.id() => Ok(equipment),
            _ => Err(Error::not_found(EQUIPMENT_NOT_FOUND_MESSAGE)),
        }
    }

    pub async fn update(
        &self,
        owner: &User,
        id: &EquipmentId,
        details: &EquipmentDetails,
    ) -> Result<(), Error> {
        let updated = self
            .equipment
            .update(owner.id(), id, details)
            .await
            .map_err(map_equipment_error)?;
        if !updated {
            return Err(Error::not_found(EQUIPMENT_NOT_FOUND_MESSAGE));
        }
        Ok(())
    }

    pub async fn delete(&self, owner: &User, id: &EquipmentId) -> Result<(), Error> {
        let deleted = self
            .equipment
            .delete(owner.id(), id)
            .await
            .map_err(map_equipment_error)?;
        if !deleted {
            return Err(Error::not_found(EQUIPMENT_NOT_FOUND_MESSAGE));
        }
        info!(equipment_id = %id, owner_id = %owner.id(), "equipment removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MockEquipmentRepository;
    use crate::domain::service_test_helpers::owner;
    use crate::domain::{ErrorCode, Money, UserId};
    use rstest::rstest;

    fn details() -> EquipmentDetails {
        EquipmentDetails::new(
            "Tractor",
            "45hp",
            Money::from_units(1000).expect("price"),
            None,
        )
        .expect("valid details")
    }

    fn listing(owner_id: UserId) -> Equipment {
        Equipment::from_details(EquipmentId::random(), owner_id, details())
    }

    #[rstest]
    #[tokio::test]
    async fn create_assigns_owner() {
        let owner = owner();
        let owner_id = *owner.id();
        let mut repo = MockEquipmentRepository::new();
        repo.expect_insert()
            .withf(move |equipment| equipment.owner_id == owner_id && equipment.name == "Tractor")
            .times(1)
            .return_once(|_| Ok(()));

        let equipment = EquipmentService::new(Arc::new(repo))
            .create(&owner, details())
            .await
            .expect("created");
        assert_eq!(equipment.owner_id, owner_id);
    }

    #[rstest]
    #[tokio::test]
    async fn get_owned_hides_foreign_listing() {
        let foreign = listing(UserId::random());
        let id = foreign.id;
        let mut repo = MockEquipmentRepository::new();
        repo.expect_find().return_once(move |_| Ok(Some(foreign)));

        let err = EquipmentService::new(Arc::new(repo))
            .get_owned(&owner(), &id)
            .await
            .expect_err("foreign listing");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn get_reports_missing_listing() {
        let mut repo = MockEquipmentRepository::new();
        repo.expect_find().return_once(|_| Ok(None));

        let err = EquipmentService::new(Arc::new(repo))
            .get(&EquipmentId::random())
            .await
            .expect_err("missing");
        assert_eq!(err.message(), EQUIPMENT_NOT_FOUND_MESSAGE);
    }

    #[rstest]
    #[tokio::test]
    async fn update_without_match_is_not_found() {
        let mut repo = MockEquipmentRepository::new();
        repo.expect_update().return_once(|_, _, _| Ok(false));

        let err = EquipmentService::new(Arc::new(repo))
            .update(&owner(), &EquipmentId::random(), &details())
            .await
            .expect_err("no rows");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[case::in_use(EquipmentRepositoryError::in_use(), ErrorCode::Conflict)]
    #[case::offline(EquipmentRepositoryError::connection("down"), ErrorCode::ServiceUnavailable)]
    #[case::query(EquipmentRepositoryError::query("bad"), ErrorCode::InternalError)]
    #[tokio::test]
    async fn delete_maps_repository_errors(
        #[case] failure: EquipmentRepositoryError,
        #[case] expected: ErrorCode,
    ) {
        let mut repo = MockEquipmentRepository::new();
        repo.expect_delete().return_once(move |_, _| Err(failure));

        let err = EquipmentService::new(Arc::new(repo))
            .delete(&owner(), &EquipmentId::random())
            .await
            .expect_err("delete fails");
        assert_eq!(err.code(), expected);
    }
}
