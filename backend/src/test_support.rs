//! In-memory port implementations for HTTP and integration tests.
//!
//! [`MemoryStore`] backs every repository port with one mutex-guarded set of
//! tables, so cross-table rules (rental pricing, log ownership, premium
//! extension) behave like the PostgreSQL adapters. [`TestHarness`] wires the
//! store, a settable clock and scripted gateway/assistant doubles into an
//! [`HttpState`].

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::domain::ports::{
    AccessToken, AdvisoryAssistant, AdvisoryAssistantError, EquipmentRepository,
    EquipmentRepositoryError, LivestockLogRepository, LivestockRepository,
    LivestockRepositoryError, PasswordHasher, PasswordHasherError, PaymentAttemptRepository,
    PaymentAttemptRepositoryError, PaymentGateway, PaymentGatewayError, RentalCreation,
    RentalRepository, RentalRepositoryError, StoredCredentials, UserPersistenceError,
    UserRepository,
};
use crate::domain::{
    AttemptResolution, CallbackOutcome, ChargeAcknowledgement, ChargeRequest, CompletionPrompt, EmailAddress,
    Equipment, EquipmentDetails, EquipmentId, Livestock, LivestockId, LivestockLog,
    LogDateRange, LogEntry, LogId, NewPaymentAttempt, PasswordHash, PaymentAttempt,
    PaymentState, Rental, RentalDecision, RentalId, RentalQuote, RentalRequest, RentalStatus,
    RentalSummary, Role, Subscription, User, UserDraft, UserId, Username,
};
use crate::inbound::http::state::{HttpState, HttpStatePorts};

const PLAIN_PREFIX: &str = "plain:";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Default instant used by [`MutableClock::default`]: 2024-06-01 09:00 UTC.
pub fn fixture_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Clock that tests can move forward.
#[derive(Debug)]
pub struct MutableClock {
    now: Mutex<DateTime<Utc>>,
}

impl MutableClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *lock(&self.now) = now;
    }

    pub fn advance(&self, delta: TimeDelta) {
        let mut now = lock(&self.now);
        *now += delta;
    }
}

impl Default for MutableClock {
    fn default() -> Self {
        Self::at(fixture_now())
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *lock(&self.now)
    }
}

/// Hasher that stores passwords with a marker prefix. Never use outside tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaintextHasher;

impl PlaintextHasher {
    pub fn encode(password: &str) -> PasswordHash {
        PasswordHash::new(format!("{PLAIN_PREFIX}{password}"))
    }
}

#[async_trait]
impl PasswordHasher for PlaintextHasher {
    async fn hash(&self, password: &str) -> Result<PasswordHash, PasswordHasherError> {
        Ok(Self::encode(password))
    }

    async fn verify(
        &self,
        password: &str,
        hash: &PasswordHash,
    ) -> Result<bool, PasswordHasherError> {
        Ok(hash
            .as_str()
            .strip_prefix(PLAIN_PREFIX)
            .is_some_and(|stored| stored == password))
    }
}

#[derive(Default)]
struct Tables {
    users: Vec<(User, PasswordHash)>,
    equipment: Vec<Equipment>,
    rentals: Vec<Rental>,
    livestock: Vec<Livestock>,
    logs: Vec<LivestockLog>,
    attempts: Vec<PaymentAttempt>,
}

impl Tables {
    fn user(&self, id: &UserId) -> Option<&User> {
        self.users
            .iter()
            .map(|(user, _)| user)
            .find(|user| user.id() == id)
    }

    fn summarise(&self, rental: &Rental) -> RentalSummary {
        let equipment_name = self
            .equipment
            .iter()
            .find(|item| item.id == rental.equipment_id)
            .map(|item| item.name.clone())
            .unwrap_or_default();
        let farmer_username = self
            .user(&rental.farmer_id)
            .map(|user| user.username().as_ref().to_owned())
            .unwrap_or_default();
        RentalSummary {
            rental: rental.clone(),
            equipment_name,
            farmer_username,
        }
    }

    fn summaries(&self, keep: impl Fn(&Rental) -> bool) -> Vec<RentalSummary> {
        let mut rentals: Vec<&Rental> = self.rentals.iter().filter(|r| keep(*r)).collect();
        rentals.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rentals.into_iter().map(|r| self.summarise(r)).collect()
    }

    fn owns_livestock(&self, owner: &UserId, livestock: &LivestockId) -> bool {
        self.livestock
            .iter()
            .any(|animal| animal.id == *livestock && animal.user_id == *owner)
    }
}

fn with_user_fields(user: &User, role: Role, subscription: Subscription) -> User {
    User::new(UserDraft {
        id: *user.id(),
        username: user.username().clone(),
        email: user.email().clone(),
        phone: user.phone().cloned(),
        role,
        subscription,
    })
}

fn sort_logs(logs: &mut [LivestockLog]) {
    logs.sort_by(|a, b| b.entry.log_date.cmp(&a.entry.log_date));
}

/// Every repository port over shared in-memory tables.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    failing_extensions: Mutex<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a user whose password verifies with [`PlaintextHasher`].
    pub fn seed_user(&self, user: User, password: &str) -> User {
        lock(&self.tables)
            .users
            .push((user.clone(), PlaintextHasher::encode(password)));
        user
    }

    pub fn seed_equipment(&self, equipment: Equipment) -> Equipment {
        lock(&self.tables).equipment.push(equipment.clone());
        equipment
    }

    pub fn user(&self, id: &UserId) -> Option<User> {
        lock(&self.tables).user(id).cloned()
    }

    pub fn rental(&self, id: &RentalId) -> Option<Rental> {
        lock(&self.tables)
            .rentals
            .iter()
            .find(|rental| rental.id == *id)
            .cloned()
    }

    pub fn attempts(&self) -> Vec<PaymentAttempt> {
        lock(&self.tables).attempts.clone()
    }

    /// Make the next `count` premium extensions fail with a connection
    /// error, rolling back the attempt resolution they belong to.
    pub fn fail_premium_extensions(&self, count: usize) {
        *lock(&self.failing_extensions) = count;
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert(
        &self,
        user: &User,
        password_hash: &PasswordHash,
    ) -> Result<(), UserPersistenceError> {
        let mut tables = lock(&self.tables);
        if tables.users.iter().any(|(u, _)| u.email() == user.email()) {
            return Err(UserPersistenceError::duplicate_email());
        }
        if tables.users.iter().any(|(u, _)| u.username() == user.username()) {
            return Err(UserPersistenceError::duplicate_username());
        }
        tables.users.push((user.clone(), password_hash.clone()));
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        Ok(lock(&self.tables).user(id).cloned())
    }

    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, UserPersistenceError> {
        Ok(lock(&self.tables)
            .users
            .iter()
            .find(|(user, _)| user.username() == username)
            .map(|(user, _)| user.clone()))
    }

    async fn find_credentials(
        &self,
        username: &Username,
    ) -> Result<Option<StoredCredentials>, UserPersistenceError> {
        Ok(lock(&self.tables)
            .users
            .iter()
            .find(|(user, _)| user.username() == username)
            .map(|(user, hash)| StoredCredentials {
                user: user.clone(),
                password_hash: hash.clone(),
            }))
    }

    async fn email_exists(&self, email: &EmailAddress) -> Result<bool, UserPersistenceError> {
        Ok(lock(&self.tables)
            .users
            .iter()
            .any(|(user, _)| user.email() == email))
    }

    async fn username_exists(&self, username: &Username) -> Result<bool, UserPersistenceError> {
        Ok(lock(&self.tables)
            .users
            .iter()
            .any(|(user, _)| user.username() == username))
    }

    async fn update_role(&self, id: &UserId, role: Role) -> Result<bool, UserPersistenceError> {
        let mut tables = lock(&self.tables);
        let Some((user, _)) = tables.users.iter_mut().find(|(u, _)| u.id() == id) else {
            return Ok(false);
        };
        *user = with_user_fields(user, role, *user.subscription());
        Ok(true)
    }

    async fn update_subscription(
        &self,
        id: &UserId,
        subscription: &Subscription,
    ) -> Result<bool, UserPersistenceError> {
        let mut tables = lock(&self.tables);
        let Some((user, _)) = tables.users.iter_mut().find(|(u, _)| u.id() == id) else {
            return Ok(false);
        };
        *user = with_user_fields(user, user.role(), *subscription);
        Ok(true)
    }
}

#[async_trait]
impl EquipmentRepository for MemoryStore {
    async fn list_all(&self) -> Result<Vec<Equipment>, EquipmentRepositoryError> {
        Ok(lock(&self.tables).equipment.clone())
    }

    async fn find(&self, id: &EquipmentId) -> Result<Option<Equipment>, EquipmentRepositoryError> {
        Ok(lock(&self.tables)
            .equipment
            .iter()
            .find(|item| item.id == *id)
            .cloned())
    }

    async fn list_for_owner(
        &self,
        owner: &UserId,
    ) -> Result<Vec<Equipment>, EquipmentRepositoryError> {
        Ok(lock(&self.tables)
            .equipment
            .iter()
            .filter(|item| item.owner_id == *owner)
            .cloned()
            .collect())
    }

    async fn insert(&self, equipment: &Equipment) -> Result<(), EquipmentRepositoryError> {
        lock(&self.tables).equipment.push(equipment.clone());
        Ok(())
    }

    async fn update(
        &self,
        owner: &UserId,
        id: &EquipmentId,
        details: &EquipmentDetails,
    ) -> Result<bool, EquipmentRepositoryError> {
        let mut tables = lock(&self.tables);
        let Some(item) = tables
            .equipment
            .iter_mut()
            .find(|item| item.id == *id && item.owner_id == *owner)
        else {
            return Ok(false);
        };
        item.name = details.name().to_owned();
        item.description = details.description().to_owned();
        item.price_per_day = details.price_per_day();
        item.image = details.image().map(str::to_owned);
        Ok(true)
    }

    async fn delete(
        &self,
        owner: &UserId,
        id: &EquipmentId,
    ) -> Result<bool, EquipmentRepositoryError> {
        let mut tables = lock(&self.tables);
        let owned = tables
            .equipment
            .iter()
            .any(|item| item.id == *id && item.owner_id == *owner);
        if !owned {
            return Ok(false);
        }
        if tables.rentals.iter().any(|rental| rental.equipment_id == *id) {
            return Err(EquipmentRepositoryError::in_use());
        }
        tables.equipment.retain(|item| item.id != *id);
        Ok(true)
    }
}

#[async_trait]
impl RentalRepository for MemoryStore {
    async fn create(
        &self,
        id: RentalId,
        request: &RentalRequest,
        created_at: DateTime<Utc>,
    ) -> Result<RentalCreation, RentalRepositoryError> {
        let mut tables = lock(&self.tables);
        let Some(equipment) = tables
            .equipment
            .iter()
            .find(|item| item.id == request.equipment_id)
            .cloned()
        else {
            return Ok(RentalCreation::EquipmentMissing);
        };
        let quote = match RentalQuote::for_period(equipment.price_per_day, &request.period) {
            Ok(quote) => quote,
            Err(error) => return Ok(RentalCreation::Rejected(error)),
        };
        let rental = Rental {
            id,
            equipment_id: equipment.id,
            farmer_id: request.farmer_id,
            owner_id: equipment.owner_id,
            start_date: request.period.start(),
            end_date: request.period.end(),
            quote,
            status: RentalStatus::Pending,
            contact: request.contact.clone(),
            created_at,
        };
        tables.rentals.push(rental.clone());
        Ok(RentalCreation::Created(rental))
    }

    async fn find(&self, id: &RentalId) -> Result<Option<Rental>, RentalRepositoryError> {
        Ok(self.rental(id))
    }

    async fn decide(
        &self,
        id: &RentalId,
        owner: &UserId,
        decision: RentalDecision,
    ) -> Result<Option<Rental>, RentalRepositoryError> {
        let mut tables = lock(&self.tables);
        let Some(rental) = tables.rentals.iter_mut().find(|rental| {
            rental.id == *id && rental.owner_id == *owner && rental.status == RentalStatus::Pending
        }) else {
            return Ok(None);
        };
        rental.status = decision.target();
        Ok(Some(rental.clone()))
    }

    async fn list_for_owner(
        &self,
        owner: &UserId,
    ) -> Result<Vec<RentalSummary>, RentalRepositoryError> {
        Ok(lock(&self.tables).summaries(|rental| rental.owner_id == *owner))
    }

    async fn list_for_farmer(
        &self,
        farmer: &UserId,
    ) -> Result<Vec<RentalSummary>, RentalRepositoryError> {
        Ok(lock(&self.tables).summaries(|rental| rental.farmer_id == *farmer))
    }
}

#[async_trait]
impl LivestockRepository for MemoryStore {
    async fn insert(&self, livestock: &Livestock) -> Result<(), LivestockRepositoryError> {
        lock(&self.tables).livestock.push(livestock.clone());
        Ok(())
    }

    async fn list_for_user(
        &self,
        user: &UserId,
    ) -> Result<Vec<Livestock>, LivestockRepositoryError> {
        Ok(lock(&self.tables)
            .livestock
            .iter()
            .filter(|animal| animal.user_id == *user)
            .cloned()
            .collect())
    }

    async fn find_owned(
        &self,
        user: &UserId,
        id: &LivestockId,
    ) -> Result<Option<Livestock>, LivestockRepositoryError> {
        Ok(lock(&self.tables)
            .livestock
            .iter()
            .find(|animal| animal.id == *id && animal.user_id == *user)
            .cloned())
    }
}

#[async_trait]
impl LivestockLogRepository for MemoryStore {
    async fn insert(&self, log: &LivestockLog) -> Result<(), LivestockRepositoryError> {
        lock(&self.tables).logs.push(log.clone());
        Ok(())
    }

    async fn list(
        &self,
        livestock: &LivestockId,
        range: Option<LogDateRange>,
    ) -> Result<Vec<LivestockLog>, LivestockRepositoryError> {
        let mut logs: Vec<LivestockLog> = lock(&self.tables)
            .logs
            .iter()
            .filter(|log| log.livestock_id == *livestock)
            .filter(|log| range.is_none_or(|range| range.contains(log.entry.log_date)))
            .cloned()
            .collect();
        sort_logs(&mut logs);
        Ok(logs)
    }

    async fn list_for_livestock(
        &self,
        livestock: &[LivestockId],
    ) -> Result<Vec<LivestockLog>, LivestockRepositoryError> {
        let mut logs: Vec<LivestockLog> = lock(&self.tables)
            .logs
            .iter()
            .filter(|log| livestock.contains(&log.livestock_id))
            .cloned()
            .collect();
        sort_logs(&mut logs);
        Ok(logs)
    }

    async fn update(
        &self,
        owner: &UserId,
        id: &LogId,
        entry: &LogEntry,
    ) -> Result<bool, LivestockRepositoryError> {
        let mut tables = lock(&self.tables);
        let Some(livestock_id) = tables
            .logs
            .iter()
            .find(|log| log.id == *id)
            .map(|log| log.livestock_id)
        else {
            return Ok(false);
        };
        if !tables.owns_livestock(owner, &livestock_id) {
            return Ok(false);
        }
        let Some(log) = tables.logs.iter_mut().find(|log| log.id == *id) else {
            return Ok(false);
        };
        log.entry = entry.clone();
        Ok(true)
    }

    async fn delete(&self, owner: &UserId, id: &LogId) -> Result<bool, LivestockRepositoryError> {
        let mut tables = lock(&self.tables);
        let Some(livestock_id) = tables
            .logs
            .iter()
            .find(|log| log.id == *id)
            .map(|log| log.livestock_id)
        else {
            return Ok(false);
        };
        if !tables.owns_livestock(owner, &livestock_id) {
            return Ok(false);
        }
        tables.logs.retain(|log| log.id != *id);
        Ok(true)
    }
}

#[async_trait]
impl PaymentAttemptRepository for MemoryStore {
    async fn insert(
        &self,
        attempt: &NewPaymentAttempt,
    ) -> Result<PaymentAttempt, PaymentAttemptRepositoryError> {
        let stored = PaymentAttempt {
            id: attempt.id,
            checkout_request_id: attempt.acknowledgement.checkout_request_id.clone(),
            merchant_request_id: attempt.acknowledgement.merchant_request_id.clone(),
            user_id: attempt.user_id,
            phone: attempt.request.phone.as_ref().to_owned(),
            plan: attempt.request.plan,
            amount: attempt.request.plan.amount(),
            state: PaymentState::Requested,
            result_code: None,
            result_description: None,
            created_at: attempt.created_at,
            resolved_at: None,
        };
        lock(&self.tables).attempts.push(stored.clone());
        Ok(stored)
    }

    async fn resolve_and_extend(
        &self,
        outcome: &CallbackOutcome,
        resolved_at: DateTime<Utc>,
    ) -> Result<Option<AttemptResolution>, PaymentAttemptRepositoryError> {
        let mut tables = lock(&self.tables);
        let Some(index) = tables.attempts.iter().position(|attempt| {
            attempt.checkout_request_id == outcome.checkout_request_id
                && attempt.state == PaymentState::Requested
        }) else {
            return Ok(None);
        };
        let mut attempt = tables.attempts[index].clone();
        attempt.state = outcome.resolution();
        attempt.result_code = Some(outcome.result_code);
        attempt.result_description = Some(outcome.result_description.clone());
        attempt.resolved_at = Some(resolved_at);

        // Work on copies and write both back only once nothing can fail.
        let mut premium_until = None;
        let mut extended_user = None;
        if let (PaymentState::Acknowledged, Some(user_id)) = (attempt.state, attempt.user_id) {
            let mut failing = lock(&self.failing_extensions);
            if *failing > 0 {
                *failing -= 1;
                return Err(PaymentAttemptRepositoryError::connection(
                    "scripted premium extension failure",
                ));
            }
            if let Some(slot) = tables.users.iter().position(|(user, _)| *user.id() == user_id) {
                let user = &tables.users[slot].0;
                let extended = user
                    .subscription()
                    .extended_premium(resolved_at, attempt.plan.premium_days());
                premium_until = extended.expiry_date;
                extended_user = Some((slot, with_user_fields(user, user.role(), extended)));
            }
        }

        if let Some((slot, user)) = extended_user {
            tables.users[slot].0 = user;
        }
        tables.attempts[index] = attempt.clone();
        Ok(Some(AttemptResolution {
            attempt,
            premium_until,
        }))
    }

    async fn find_by_checkout_request_id(
        &self,
        checkout_request_id: &str,
    ) -> Result<Option<PaymentAttempt>, PaymentAttemptRepositoryError> {
        Ok(lock(&self.tables)
            .attempts
            .iter()
            .find(|attempt| attempt.checkout_request_id == checkout_request_id)
            .cloned())
    }
}

/// Gateway double answering every push with a fresh acknowledgement, or
/// failing when told to.
#[derive(Default)]
pub struct ScriptedGateway {
    fail: Mutex<bool>,
    charges: Mutex<Vec<ChargeRequest>>,
}

impl ScriptedGateway {
    pub fn fail_requests(&self) {
        *lock(&self.fail) = true;
    }

    pub fn charges(&self) -> Vec<ChargeRequest> {
        lock(&self.charges).clone()
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn authenticate(&self) -> Result<AccessToken, PaymentGatewayError> {
        Ok(AccessToken::new("test-token"))
    }

    async fn initiate_charge(
        &self,
        _token: &AccessToken,
        request: &ChargeRequest,
        _now: DateTime<Utc>,
    ) -> Result<ChargeAcknowledgement, PaymentGatewayError> {
        if *lock(&self.fail) {
            return Err(PaymentGatewayError::request("HTTP 500: scripted failure"));
        }
        let mut charges = lock(&self.charges);
        charges.push(request.clone());
        let sequence = charges.len();
        Ok(ChargeAcknowledgement {
            merchant_request_id: format!("merchant-{sequence}"),
            checkout_request_id: format!("ws_CO_{sequence}"),
            response_code: "0".to_owned(),
            response_description: "Success. Request accepted for processing".to_owned(),
            customer_message: "Success. Request accepted for processing".to_owned(),
        })
    }
}

/// Completion double replying with a fixed text.
#[derive(Default)]
pub struct ScriptedAssistant {
    reply: Mutex<Option<String>>,
    prompts: Mutex<Vec<CompletionPrompt>>,
}

impl ScriptedAssistant {
    pub fn reply_with(&self, reply: impl Into<String>) {
        *lock(&self.reply) = Some(reply.into());
    }

    pub fn prompts(&self) -> Vec<CompletionPrompt> {
        lock(&self.prompts).clone()
    }
}

#[async_trait]
impl AdvisoryAssistant for ScriptedAssistant {
    async fn complete(
        &self,
        prompt: &CompletionPrompt,
    ) -> Result<Option<String>, AdvisoryAssistantError> {
        lock(&self.prompts).push(prompt.clone());
        Ok(lock(&self.reply).clone())
    }
}

/// Store, clock and outbound doubles behind one [`HttpState`].
#[derive(Clone, Default)]
pub struct TestHarness {
    pub store: Arc<MemoryStore>,
    pub clock: Arc<MutableClock>,
    pub gateway: Arc<ScriptedGateway>,
    pub assistant: Arc<ScriptedAssistant>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }

    pub fn http_state(&self) -> HttpState {
        HttpState::new(HttpStatePorts {
            users: self.store.clone(),
            hasher: Arc::new(PlaintextHasher),
            equipment: self.store.clone(),
            rentals: self.store.clone(),
            livestock: self.store.clone(),
            logs: self.store.clone(),
            attempts: self.store.clone(),
            gateway: self.gateway.clone(),
            assistant: self.assistant.clone(),
            clock: self.clock.clone(),
        })
    }

    /// Seed a user with the given role and plan window.
    pub fn seed_user(
        &self,
        username: &str,
        role: Role,
        subscription: Subscription,
        password: &str,
    ) -> User {
        let user = User::new(UserDraft {
            id: UserId::random(),
            username: Username::new(username).unwrap_or_else(|error| {
                panic!("fixture username {username} is invalid: {error}")
            }),
            email: EmailAddress::new(format!("{username}@example.com"))
                .unwrap_or_else(|error| panic!("fixture email is invalid: {error}")),
            phone: None,
            role,
            subscription,
        });
        self.store.seed_user(user, password)
    }
}
