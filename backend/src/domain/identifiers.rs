//! UUID-backed identifiers for portal entities.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Error returned when an identifier string is not a UUID.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    /// The input was blank.
    #[error("{kind} must not be empty")]
    Empty { kind: &'static str },
    /// The input was not a hyphenated UUID.
    #[error("{kind} must be a valid UUID")]
    Invalid { kind: &'static str },
}

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
        #[serde(transparent)]
        #[schema(value_type = String, format = Uuid)]
        pub struct $name(Uuid);

        impl $name {
            /// Parse an identifier from its string form.
            pub fn new(raw: impl AsRef<str>) -> Result<Self, IdentifierError> {
                let raw = raw.as_ref();
                if raw.trim().is_empty() {
                    return Err(IdentifierError::Empty { kind: $kind });
                }
                if raw.trim() != raw {
                    return Err(IdentifierError::Invalid { kind: $kind });
                }
                Uuid::parse_str(raw)
                    .map(Self)
                    .map_err(|_| IdentifierError::Invalid { kind: $kind })
            }

            /// Generate a fresh random identifier.
            #[must_use]
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID, typically one loaded from storage.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Access the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = IdentifierError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }
    };
}

uuid_identifier!(
    /// Stable user identifier.
    UserId,
    "user id"
);
uuid_identifier!(
    /// Equipment listing identifier.
    EquipmentId,
    "equipment id"
);
uuid_identifier!(
    /// Rental request identifier.
    RentalId,
    "rental id"
);
uuid_identifier!(
    /// Livestock animal identifier.
    LivestockId,
    "livestock id"
);
uuid_identifier!(
    /// Livestock log entry identifier.
    LogId,
    "log id"
);
uuid_identifier!(
    /// Payment attempt identifier.
    PaymentAttemptId,
    "payment attempt id"
);
