//! Translation of request fields and domain validation failures into
//! `invalid_request` errors carrying `{field, code}` details.

use std::str::FromStr;

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use crate::domain::{
    AdvisoryValidationError, EquipmentValidationError, Error, IdentifierError,
    LivestockValidationError, LoginValidationError, MoneyError, PaymentValidationError,
    RegistrationValidationError, RentalPeriodError, parse_date,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ValidationCode {
    MissingField,
    InvalidUuid,
    InvalidValue,
    InvalidDate,
}

impl ValidationCode {
    fn as_str(self) -> &'static str {
        match self {
            Self::MissingField => "missing_field",
            Self::InvalidUuid => "invalid_uuid",
            Self::InvalidValue => "invalid_value",
            Self::InvalidDate => "invalid_date",
        }
    }
}

pub(crate) fn field_error(field: &str, code: ValidationCode, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field,
        "code": code.as_str(),
    }))
}

/// Parse a required identifier field.
pub(crate) fn require_id<T>(field: &str, raw: Option<&str>) -> Result<T, Error>
where
    T: FromStr<Err = IdentifierError>,
{
    let raw = raw.map(str::trim).filter(|value| !value.is_empty());
    let Some(raw) = raw else {
        return Err(field_error(
            field,
            ValidationCode::MissingField,
            format!("{field} is required"),
        ));
    };
    raw.parse()
        .map_err(|error: IdentifierError| field_error(field, ValidationCode::InvalidUuid, error.to_string()))
}

/// Parse an identifier taken from the URL path.
pub(crate) fn path_id<T>(field: &str, raw: &str) -> Result<T, Error>
where
    T: FromStr<Err = IdentifierError>,
{
    require_id(field, Some(raw))
}

pub(crate) fn required_date(field: &'static str, raw: Option<&str>) -> Result<NaiveDate, Error> {
    let raw = raw.map(str::trim).filter(|value| !value.is_empty());
    let Some(raw) = raw else {
        return Err(field_error(
            field,
            ValidationCode::MissingField,
            format!("{field} is required"),
        ));
    };
    parse_date(field, raw)
        .map_err(|error| field_error(field, ValidationCode::InvalidDate, error.to_string()))
}

/// Numeric field that may arrive as a JSON number or as form text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NumberOrText {
    Number(f64),
    Text(String),
}

pub(crate) fn optional_number(field: &str, raw: Option<&NumberOrText>) -> Result<Option<f64>, Error> {
    match raw {
        None => Ok(None),
        Some(NumberOrText::Number(value)) => Ok(Some(*value)),
        Some(NumberOrText::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(NumberOrText::Text(text)) => text.trim().parse().map(Some).map_err(|_| {
            field_error(
                field,
                ValidationCode::InvalidValue,
                format!("{field} must be a number"),
            )
        }),
    }
}

pub(crate) fn map_login_validation_error(error: LoginValidationError) -> Error {
    let field = match error {
        LoginValidationError::EmptyUsername => "username",
        LoginValidationError::EmptyPassword => "password",
    };
    field_error(field, ValidationCode::MissingField, error.to_string())
}

pub(crate) fn map_registration_error(error: RegistrationValidationError) -> Error {
    let code = match error {
        RegistrationValidationError::EmptyPassword => ValidationCode::MissingField,
        _ => ValidationCode::InvalidValue,
    };
    field_error(error.field(), code, error.to_string())
}

pub(crate) fn map_livestock_validation_error(error: LivestockValidationError) -> Error {
    match error {
        LivestockValidationError::MissingField { field } => {
            field_error(field, ValidationCode::MissingField, error.to_string())
        }
        LivestockValidationError::InvalidDate { field } => {
            field_error(field, ValidationCode::InvalidDate, error.to_string())
        }
        LivestockValidationError::InvalidProduction => {
            field_error("production", ValidationCode::InvalidValue, error.to_string())
        }
        LivestockValidationError::InvertedRange => {
            field_error("startDate", ValidationCode::InvalidValue, error.to_string())
        }
    }
}

pub(crate) fn map_equipment_validation_error(error: EquipmentValidationError) -> Error {
    let code = match error {
        EquipmentValidationError::EmptyName => ValidationCode::MissingField,
        EquipmentValidationError::NameTooLong { .. } => ValidationCode::InvalidValue,
    };
    field_error("name", code, error.to_string())
}

pub(crate) fn map_price_error(error: MoneyError) -> Error {
    field_error("price_per_day", ValidationCode::InvalidValue, error.to_string())
}

pub(crate) fn map_rental_period_error(error: RentalPeriodError) -> Error {
    match &error {
        RentalPeriodError::Unparseable { field, .. } => {
            field_error(field, ValidationCode::InvalidDate, error.to_string())
        }
        RentalPeriodError::EndBeforeStart | RentalPeriodError::NonPositiveDuration => {
            field_error("end_date", ValidationCode::InvalidValue, error.to_string())
        }
    }
}

pub(crate) fn map_payment_validation_error(error: PaymentValidationError) -> Error {
    let (field, code) = match error {
        PaymentValidationError::MissingFields => ("phone", ValidationCode::MissingField),
        PaymentValidationError::InvalidPlan => ("plan", ValidationCode::InvalidValue),
        PaymentValidationError::InvalidPhone => ("phone", ValidationCode::InvalidValue),
    };
    field_error(field, code, error.to_string())
}

pub(crate) fn map_advisory_validation_error(error: AdvisoryValidationError) -> Error {
    let field = match error {
        AdvisoryValidationError::MissingQuestion => "question",
        AdvisoryValidationError::MissingField { field } => field,
    };
    field_error(field, ValidationCode::MissingField, error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EquipmentId, ErrorCode};
    use rstest::rstest;
    use serde_json::Value;

    fn details_code(error: &Error) -> Option<&str> {
        error.details().and_then(|d| d.get("code")).and_then(Value::as_str)
    }

    #[rstest]
    #[case(None, "missing_field")]
    #[case(Some("  "), "missing_field")]
    #[case(Some("3"), "invalid_uuid")]
    fn require_id_rejects_missing_and_malformed(#[case] raw: Option<&str>, #[case] code: &str) {
        let error = require_id::<EquipmentId>("id", raw).expect_err("rejected");
        assert_eq!(error.code(), ErrorCode::InvalidRequest);
        assert_eq!(details_code(&error), Some(code));
    }

    #[rstest]
    fn require_id_accepts_uuid() {
        let id: EquipmentId =
            require_id("id", Some("3fa85f64-5717-4562-b3fc-2c963f66afa6")).expect("parses");
        assert_eq!(id.to_string(), "3fa85f64-5717-4562-b3fc-2c963f66afa6");
    }

    #[rstest]
    #[case(None, Ok(None))]
    #[case(Some(NumberOrText::Number(2.5)), Ok(Some(2.5)))]
    #[case(Some(NumberOrText::Text(" 12 ".to_owned())), Ok(Some(12.0)))]
    #[case(Some(NumberOrText::Text(String::new())), Ok(None))]
    #[case(Some(NumberOrText::Text("lots".to_owned())), Err(()))]
    fn optional_number_accepts_numbers_and_text(
        #[case] raw: Option<NumberOrText>,
        #[case] expected: Result<Option<f64>, ()>,
    ) {
        assert_eq!(optional_number("production", raw.as_ref()).map_err(|_| ()), expected);
    }

    #[rstest]
    fn rental_period_errors_keep_their_messages() {
        let error = map_rental_period_error(RentalPeriodError::EndBeforeStart);
        assert_eq!(error.message(), "Invalid rental dates: End must be after Start.");
    }
}
