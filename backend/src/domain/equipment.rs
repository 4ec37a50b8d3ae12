//! Equipment listings offered for rent by owners.

use serde::Serialize;
use utoipa::ToSchema;

use super::{EquipmentId, Money, UserId};

/// Maximum length accepted for an equipment name.
pub const EQUIPMENT_NAME_MAX: usize = 120;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EquipmentValidationError {
    #[error("equipment name must not be empty")]
    EmptyName,
    #[error("equipment name must be at most {max} characters")]
    NameTooLong { max: usize },
}

/// Listing fields supplied by an owner when creating or editing equipment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquipmentDetails {
    name: String,
    description: String,
    price_per_day: Money,
    image: Option<String>,
}

impl EquipmentDetails {
    /// Validate listing fields. Blank image references are treated as absent.
    pub fn new(
        name: &str,
        description: &str,
        price_per_day: Money,
        image: Option<&str>,
    ) -> Result<Self, EquipmentValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EquipmentValidationError::EmptyName);
        }
        if name.chars().count() > EQUIPMENT_NAME_MAX {
            return Err(EquipmentValidationError::NameTooLong {
                max: EQUIPMENT_NAME_MAX,
            });
        }
        Ok(Self {
            name: name.to_owned(),
            description: description.trim().to_owned(),
            price_per_day,
            image: image
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_owned),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn price_per_day(&self) -> Money {
        self.price_per_day
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }
}

/// Persisted equipment listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    pub id: EquipmentId,
    pub owner_id: UserId,
    pub name: String,
    pub description: String,
    pub price_per_day: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Equipment {
    /// Assemble a listing from an identifier, owner and validated details.
    #[must_use]
    pub fn from_details(id: EquipmentId, owner_id: UserId, details: EquipmentDetails) -> Self {
        let EquipmentDetails {
            name,
            description,
            price_per_day,
            image,
        } = details;
        Self {
            id,
            owner_id,
            name,
            description,
            price_per_day,
            image,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn price() -> Money {
        Money::from_units(1000).expect("valid price")
    }

    #[rstest]
    #[case("", EquipmentValidationError::EmptyName)]
    #[case("   ", EquipmentValidationError::EmptyName)]
    fn rejects_blank_names(#[case] name: &str, #[case] expected: EquipmentValidationError) {
        assert_eq!(
            EquipmentDetails::new(name, "", price(), None).expect_err("must fail"),
            expected
        );
    }

    #[rstest]
    fn rejects_overlong_names() {
        let name = "x".repeat(EQUIPMENT_NAME_MAX + 1);
        assert_eq!(
            EquipmentDetails::new(&name, "", price(), None).expect_err("must fail"),
            EquipmentValidationError::NameTooLong {
                max: EQUIPMENT_NAME_MAX
            }
        );
    }

    #[rstest]
    fn trims_fields_and_drops_blank_image() {
        let details = EquipmentDetails::new("  Tractor ", " 60hp ", price(), Some("  "))
            .expect("valid details");
        assert_eq!(details.name(), "Tractor");
        assert_eq!(details.description(), "60hp");
        assert!(details.image().is_none());
    }
}
