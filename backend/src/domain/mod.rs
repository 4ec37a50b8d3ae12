//! Domain primitives, aggregates and use-case services.
//!
//! Purpose: Define strongly typed entities for the portal (users, equipment,
//! rentals, livestock, payments and advisory prompts) and the services that
//! orchestrate them through the driven ports in [`ports`]. Types are
//! transport agnostic; inbound adapters translate [`Error`] into HTTP
//! responses.
//!
//! Public surface:
//! - Error (alias to `error::Error`) — API error response payload.
//! - ErrorCode (alias to `error::ErrorCode`) — stable error identifier.
//! - User (alias to `user::User`) — portal identity, role and plan window.
//! - Services: AccessGate, AccountService, EquipmentService, RentalService,
//!   LivestockService, SubscriptionPaymentService, AdvisoryService.

pub mod error;
pub mod ports;
pub mod user;

mod access_gate;
mod account_service;
mod advisory;
mod advisory_service;
mod auth;
mod equipment;
mod equipment_service;
mod identifiers;
mod livestock;
mod livestock_service;
mod money;
mod payment;
mod payment_service;
mod rental;
mod rental_service;
mod subscription;
mod trace_id;

#[cfg(test)]
pub(crate) mod service_test_helpers;

pub use self::access_gate::{AccessGate, SubscriptionCheck};
pub use self::account_service::{
    AccountService, Dashboard, EMAIL_TAKEN_MESSAGE, INVALID_CREDENTIALS_MESSAGE,
    USERNAME_TAKEN_MESSAGE,
};
pub use self::advisory::{
    AdvisoryValidationError, CompletionPrompt, DIAGNOSIS_SYSTEM_PROMPT, Diagnosis,
    NO_ANSWER_MESSAGE, NO_PREDICTION_MESSAGE, OFF_TOPIC_ANSWER, Question,
    YIELD_FIELDS_REQUIRED_MESSAGE, YIELD_SYSTEM_PROMPT, YieldPrediction, YieldPredictionParts,
    YieldPredictionRequest,
};
pub use self::advisory_service::{
    AdvisoryService, DIAGNOSIS_FAILED_MESSAGE, PREDICTION_FAILED_MESSAGE,
};
pub use self::auth::{
    LoginCredentials, LoginValidationError, PasswordHash, Registration,
    RegistrationValidationError,
};
pub use self::equipment::{
    EQUIPMENT_NAME_MAX, Equipment, EquipmentDetails, EquipmentValidationError,
};
pub use self::equipment_service::{EQUIPMENT_NOT_FOUND_MESSAGE, EquipmentService};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::identifiers::{
    EquipmentId, IdentifierError, LivestockId, LogId, PaymentAttemptId, RentalId, UserId,
};
pub use self::livestock::{
    ALL_FIELDS_REQUIRED_MESSAGE, Livestock, LivestockDetails, LivestockLog,
    LivestockValidationError, LivestockWithLogs, LogDateRange, LogEntry,
};
pub(crate) use self::livestock::parse_date;
pub use self::livestock_service::{
    LIVESTOCK_NOT_FOUND_MESSAGE, LOG_NOT_FOUND_MESSAGE, LivestockService, QuickLog,
};
pub use self::money::{Money, MoneyError};
pub use self::payment::{
    AttemptResolution, CallbackOutcome, ChargeAcknowledgement, ChargeRequest, GATEWAY_UTC_OFFSET_SECONDS,
    INVALID_PHONE_MESSAGE, INVALID_PLAN_MESSAGE, NewPaymentAttempt,
    PAYMENT_INITIATION_FAILED_MESSAGE, PHONE_AND_PLAN_REQUIRED_MESSAGE, PaymentAttempt,
    PaymentPlan, PaymentState, PaymentValidationError, gateway_timestamp,
};
pub use self::payment_service::{
    ATTEMPT_NOT_FOUND_MESSAGE, CallbackDisposition, PlanOffer, SubscriptionPaymentService,
    SubscriptionStatus,
};
pub use self::rental::{
    END_BEFORE_START_MESSAGE, NON_POSITIVE_DURATION_MESSAGE, Rental, RentalContact,
    RentalDecision, RentalPeriod, RentalPeriodError, RentalQuote, RentalRequest, RentalStatus,
    RentalSummary, RentalTransitionError, UNPARSEABLE_DATES_MESSAGE,
};
pub use self::rental_service::{Earnings, RENTAL_NOT_FOUND_MESSAGE, RentalService};
pub use self::subscription::Standing;
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{
    EmailAddress, PhoneNumber, PlanType, Role, Subscription, USERNAME_MAX, USERNAME_MIN, User,
    UserDraft, UserValidationError, Username,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use agroai::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
