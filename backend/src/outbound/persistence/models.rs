//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Conversions into domain types re-validate
//! stored text columns and report corrupt rows as [`RowConversionError`].

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{
    EmailAddress, Equipment, EquipmentId, Livestock, LivestockId, LivestockLog, LogEntry, LogId,
    Money, PaymentAttempt, PaymentAttemptId, PhoneNumber, Rental, RentalContact, RentalId,
    RentalQuote, Subscription, User, UserDraft, UserId, Username,
};

use super::schema::{equipment, livestock, livestock_logs, payment_attempts, rentals, users};

/// A stored row could not be turned into a domain value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("corrupt {table} row {id}: {message}")]
pub(crate) struct RowConversionError {
    pub table: &'static str,
    pub id: Uuid,
    pub message: String,
}

impl RowConversionError {
    fn new(table: &'static str, id: Uuid, message: impl ToString) -> Self {
        Self {
            table,
            id,
            message: message.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Identity columns; the password hash is selected separately.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: String,
    pub plan_type: String,
    pub trial_end: Option<DateTime<Utc>>,
    pub expiry_date: Option<DateTime<Utc>>,
}

impl UserRow {
    pub(crate) fn subscription(&self) -> Result<Subscription, RowConversionError> {
        Ok(Subscription {
            plan_type: self
                .plan_type
                .parse()
                .map_err(|err| RowConversionError::new("users", self.id, err))?,
            trial_end: self.trial_end,
            expiry_date: self.expiry_date,
        })
    }
}

impl TryFrom<UserRow> for User {
    type Error = RowConversionError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let corrupt = |err: crate::domain::UserValidationError| {
            RowConversionError::new("users", row.id, err)
        };
        let subscription = row.subscription()?;
        Ok(User::new(UserDraft {
            id: UserId::from_uuid(row.id),
            username: Username::new(&row.username).map_err(corrupt)?,
            email: EmailAddress::new(&row.email).map_err(corrupt)?,
            phone: row
                .phone
                .as_deref()
                .map(PhoneNumber::new)
                .transpose()
                .map_err(corrupt)?,
            role: row.role.parse().map_err(corrupt)?,
            subscription,
        }))
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub username: &'a str,
    pub email: &'a str,
    pub phone: Option<&'a str>,
    pub password_hash: &'a str,
    pub role: &'a str,
    pub plan_type: &'a str,
    pub trial_end: Option<DateTime<Utc>>,
    pub expiry_date: Option<DateTime<Utc>>,
}

/// Subscription window changeset. `None` clears the column.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct SubscriptionUpdate<'a> {
    pub plan_type: &'a str,
    pub trial_end: Option<DateTime<Utc>>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Equipment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = equipment)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct EquipmentRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: String,
    pub price_per_day_cents: i64,
    pub image: Option<String>,
}

impl TryFrom<EquipmentRow> for Equipment {
    type Error = RowConversionError;

    fn try_from(row: EquipmentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: EquipmentId::from_uuid(row.id),
            owner_id: UserId::from_uuid(row.owner_id),
            price_per_day: Money::from_cents(row.price_per_day_cents)
                .map_err(|err| RowConversionError::new("equipment", row.id, err))?,
            name: row.name,
            description: row.description,
            image: row.image,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = equipment)]
pub(crate) struct NewEquipmentRow<'a> {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: &'a str,
    pub description: &'a str,
    pub price_per_day_cents: i64,
    pub image: Option<&'a str>,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = equipment)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct EquipmentUpdate<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub price_per_day_cents: i64,
    pub image: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Rentals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = rentals)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RentalRow {
    pub id: Uuid,
    pub equipment_id: Uuid,
    pub farmer_id: Uuid,
    pub owner_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub duration_days: i64,
    pub total_cost_cents: i64,
    pub status: String,
    pub customer_email: String,
    pub customer_address: String,
    pub rental_purpose: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<RentalRow> for Rental {
    type Error = RowConversionError;

    fn try_from(row: RentalRow) -> Result<Self, Self::Error> {
        let corrupt = |message: String| RowConversionError::new("rentals", row.id, message);
        Ok(Self {
            id: RentalId::from_uuid(row.id),
            equipment_id: EquipmentId::from_uuid(row.equipment_id),
            farmer_id: UserId::from_uuid(row.farmer_id),
            owner_id: UserId::from_uuid(row.owner_id),
            start_date: row.start_date,
            end_date: row.end_date,
            quote: RentalQuote {
                duration_days: row.duration_days,
                total_cost: Money::from_cents(row.total_cost_cents)
                    .map_err(|err| corrupt(err.to_string()))?,
            },
            status: row.status.parse().map_err(corrupt)?,
            contact: RentalContact {
                customer_email: row.customer_email,
                customer_address: row.customer_address,
                rental_purpose: row.rental_purpose,
            },
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = rentals)]
pub(crate) struct NewRentalRow<'a> {
    pub id: Uuid,
    pub equipment_id: Uuid,
    pub farmer_id: Uuid,
    pub owner_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub duration_days: i64,
    pub total_cost_cents: i64,
    pub status: &'a str,
    pub customer_email: &'a str,
    pub customer_address: &'a str,
    pub rental_purpose: &'a str,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Livestock
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = livestock)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct LivestockRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub livestock_type: String,
    pub region: String,
    pub breed: String,
    pub dob: NaiveDate,
}

impl From<LivestockRow> for Livestock {
    fn from(row: LivestockRow) -> Self {
        Self {
            id: LivestockId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            name: row.name,
            livestock_type: row.livestock_type,
            region: row.region,
            breed: row.breed,
            dob: row.dob,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = livestock)]
pub(crate) struct NewLivestockRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: &'a str,
    pub livestock_type: &'a str,
    pub region: &'a str,
    pub breed: &'a str,
    pub dob: NaiveDate,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = livestock_logs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct LivestockLogRow {
    pub id: Uuid,
    pub livestock_id: Uuid,
    pub log_date: NaiveDate,
    pub feed: Option<String>,
    pub production: Option<f64>,
    pub symptoms: Option<String>,
}

impl From<LivestockLogRow> for LivestockLog {
    fn from(row: LivestockLogRow) -> Self {
        Self {
            id: LogId::from_uuid(row.id),
            livestock_id: LivestockId::from_uuid(row.livestock_id),
            entry: LogEntry {
                log_date: row.log_date,
                feed: row.feed,
                production: row.production,
                symptoms: row.symptoms,
            },
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = livestock_logs)]
pub(crate) struct NewLivestockLogRow<'a> {
    pub id: Uuid,
    pub livestock_id: Uuid,
    pub log_date: NaiveDate,
    pub feed: Option<&'a str>,
    pub production: Option<f64>,
    pub symptoms: Option<&'a str>,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = livestock_logs)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct LivestockLogUpdate<'a> {
    pub log_date: NaiveDate,
    pub feed: Option<&'a str>,
    pub production: Option<f64>,
    pub symptoms: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Payment attempts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = payment_attempts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PaymentAttemptRow {
    pub id: Uuid,
    pub checkout_request_id: String,
    pub merchant_request_id: String,
    pub user_id: Option<Uuid>,
    pub phone: String,
    pub plan: String,
    pub amount_cents: i64,
    pub state: String,
    pub result_code: Option<i32>,
    pub result_description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl TryFrom<PaymentAttemptRow> for PaymentAttempt {
    type Error = RowConversionError;

    fn try_from(row: PaymentAttemptRow) -> Result<Self, Self::Error> {
        let corrupt = |message: String| RowConversionError::new("payment_attempts", row.id, message);
        Ok(Self {
            id: PaymentAttemptId::from_uuid(row.id),
            plan: row.plan.parse().map_err(|err| corrupt(format!("{err}")))?,
            amount: Money::from_cents(row.amount_cents).map_err(|err| corrupt(err.to_string()))?,
            state: row.state.parse().map_err(corrupt)?,
            checkout_request_id: row.checkout_request_id,
            merchant_request_id: row.merchant_request_id,
            user_id: row.user_id.map(UserId::from_uuid),
            phone: row.phone,
            result_code: row.result_code,
            result_description: row.result_description,
            created_at: row.created_at,
            resolved_at: row.resolved_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = payment_attempts)]
pub(crate) struct NewPaymentAttemptRow<'a> {
    pub id: Uuid,
    pub checkout_request_id: &'a str,
    pub merchant_request_id: &'a str,
    pub user_id: Option<Uuid>,
    pub phone: &'a str,
    pub plan: &'a str,
    pub amount_cents: i64,
    pub state: &'a str,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn user_row() -> UserRow {
        UserRow {
            id: Uuid::new_v4(),
            username: "alice".to_owned(),
            email: "alice@example.com".to_owned(),
            phone: None,
            role: "owner".to_owned(),
            plan_type: "trial".to_owned(),
            trial_end: None,
            expiry_date: None,
        }
    }

    #[rstest]
    fn user_row_converts_role_and_plan() {
        let user = User::try_from(user_row()).expect("valid row");
        assert_eq!(user.role(), crate::domain::Role::Owner);
        assert_eq!(user.subscription().plan_type, crate::domain::PlanType::Trial);
    }

    #[rstest]
    #[case::role("role")]
    #[case::plan("plan")]
    fn corrupt_enum_columns_are_reported(#[case] column: &str) {
        let mut row = user_row();
        match column {
            "role" => row.role = "superuser".to_owned(),
            _ => row.plan_type = "gold".to_owned(),
        }
        let err = User::try_from(row).expect_err("corrupt row");
        assert_eq!(err.table, "users");
    }

    #[rstest]
    fn rental_row_rejects_unknown_status() {
        let row = RentalRow {
            id: Uuid::new_v4(),
            equipment_id: Uuid::new_v4(),
            farmer_id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            start_date: Utc::now(),
            end_date: Utc::now(),
            duration_days: 1,
            total_cost_cents: 100,
            status: "cancelled".to_owned(),
            customer_email: String::new(),
            customer_address: String::new(),
            rental_purpose: String::new(),
            created_at: Utc::now(),
        };
        let err = Rental::try_from(row).expect_err("unknown status");
        assert!(err.message.contains("cancelled"));
    }
}
