//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain services and remain testable without I/O.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::{
    AdvisoryAssistant, EquipmentRepository, LivestockLogRepository, LivestockRepository,
    PasswordHasher, PaymentAttemptRepository, PaymentGateway, RentalRepository, UserRepository,
};
use crate::domain::{
    AccessGate, AccountService, AdvisoryService, EquipmentService, LivestockService,
    RentalService, SubscriptionPaymentService,
};

/// Parameter object bundling every driven port the handlers need.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub users: Arc<dyn UserRepository>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub equipment: Arc<dyn EquipmentRepository>,
    pub rentals: Arc<dyn RentalRepository>,
    pub livestock: Arc<dyn LivestockRepository>,
    pub logs: Arc<dyn LivestockLogRepository>,
    pub attempts: Arc<dyn PaymentAttemptRepository>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub assistant: Arc<dyn AdvisoryAssistant>,
    pub clock: Arc<dyn Clock>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub gate: AccessGate,
    pub accounts: AccountService,
    pub equipment: EquipmentService,
    pub rentals: RentalService,
    pub livestock: LivestockService,
    pub payments: SubscriptionPaymentService,
    pub advisory: AdvisoryService,
}

impl HttpState {
    /// Wire the domain services onto a ports bundle.
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            users,
            hasher,
            equipment,
            rentals,
            livestock,
            logs,
            attempts,
            gateway,
            assistant,
            clock,
        } = ports;
        Self {
            gate: AccessGate::new(users.clone(), clock.clone()),
            accounts: AccountService::new(users, hasher, clock.clone()),
            equipment: EquipmentService::new(equipment),
            rentals: RentalService::new(rentals, clock.clone()),
            livestock: LivestockService::new(livestock, logs, clock.clone()),
            payments: SubscriptionPaymentService::new(gateway, attempts, clock),
            advisory: AdvisoryService::new(assistant),
        }
    }
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports)
    }
}
