//! Embedded PostgreSQL for the Diesel adapter suites.
//!
//! One cluster is shared per test binary. Each test receives a database
//! cloned from a template that already carries every migration; the template
//! name includes a hash of `migrations/`, so a schema edit yields a fresh
//! template instead of a stale one.
//!
//! Set `SKIP_TEST_CLUSTER=1` where the cluster cannot start.

use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use agroai::domain::{
    EmailAddress, PasswordHash, Role, Subscription, User, UserDraft, UserId, Username,
};
use agroai::domain::ports::UserRepository;
use agroai::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig, run_pending_migrations};
use diesel_async::RunQueryDsl;
use pg_embedded_setup_unpriv::test_support::{hash_directory, shared_cluster_handle};
use pg_embedded_setup_unpriv::{ClusterHandle, TemporaryDatabase};
use tokio::runtime::Runtime;
use uuid::Uuid;

const TEMPLATE_NAME_PREFIX: &str = "agroai_template";
const SHARED_CLUSTER_RETRIES: usize = 5;
const RETRY_DELAY: Duration = Duration::from_millis(500);

static TEMPLATE_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// A migrated, throwaway database and the runtime its pool lives on.
pub struct TestDatabase {
    pub runtime: Runtime,
    pub pool: DbPool,
    _database: TemporaryDatabase,
}

impl TestDatabase {
    /// Run raw SQL against the database, for simulating schema damage.
    pub fn execute(&self, sql: &str) {
        self.runtime.block_on(async {
            let mut conn = self.pool.get().await.expect("connection checkout");
            diesel::sql_query(sql)
                .execute(&mut conn)
                .await
                .expect("raw statement succeeds");
        });
    }

    /// Store a user with a placeholder password hash.
    pub fn seed_user(&self, username: &str, role: Role) -> User {
        let user = User::new(UserDraft {
            id: UserId::random(),
            username: Username::new(username).expect("fixture username"),
            email: EmailAddress::new(format!("{username}@farm.test")).expect("fixture email"),
            phone: None,
            role,
            subscription: Subscription::default(),
        });
        let users = DieselUserRepository::new(self.pool.clone());
        self.runtime
            .block_on(users.insert(&user, &PasswordHash::new("$2b$10$fixture")))
            .expect("fixture user stored");
        user
    }
}

fn should_skip_test_cluster() -> bool {
    std::env::var("SKIP_TEST_CLUSTER")
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Skip with a marker when `SKIP_TEST_CLUSTER` is set, otherwise fail loudly
/// so CI breakage is not masked.
pub fn handle_cluster_setup_failure<T>(reason: impl std::fmt::Display) -> Option<T> {
    if should_skip_test_cluster() {
        eprintln!("SKIP-TEST-CLUSTER: {reason}");
        None
    } else {
        panic!("Test cluster setup failed: {reason}. Set SKIP_TEST_CLUSTER=1 to skip.");
    }
}

/// Keep the cluster password stable across test binaries that reuse the
/// same data directory.
fn ensure_stable_password() {
    if std::env::var_os("PG_PASSWORD").is_none() {
        // SAFETY: runs before the cluster bootstrap spawns any threads.
        unsafe {
            std::env::set_var("PG_PASSWORD", "agroai_embedded_test");
        }
    }
}

fn cluster() -> Result<&'static ClusterHandle, String> {
    ensure_stable_password();
    let mut attempt = 1;
    loop {
        match shared_cluster_handle() {
            Ok(handle) => return Ok(handle),
            Err(error) if attempt < SHARED_CLUSTER_RETRIES => {
                eprintln!("pg-embed: attempt {attempt}/{SHARED_CLUSTER_RETRIES} failed: {error}");
                std::thread::sleep(RETRY_DELAY);
                attempt += 1;
            }
            Err(error) => return Err(error.to_string()),
        }
    }
}

fn template_database_name() -> Result<String, String> {
    let migrations = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("migrations");
    let hash = hash_directory(migrations).map_err(|err| format!("hash migrations: {err}"))?;
    let short_hash = hash.get(..8).unwrap_or(&hash);
    Ok(format!("{TEMPLATE_NAME_PREFIX}_{short_hash}"))
}

/// Create the migrated template once per migration set.
fn ensure_template_database(cluster: &ClusterHandle, runtime: &Runtime) -> Result<String, String> {
    let template_name = template_database_name()?;
    let _lock = TEMPLATE_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|err| err.into_inner());

    let exists = cluster
        .database_exists(template_name.as_str())
        .map_err(|err| format!("template check: {err:?}"))?;
    if !exists {
        cluster
            .create_database(template_name.as_str())
            .map_err(|err| format!("create template: {err:?}"))?;
        let url = cluster.connection().database_url(&template_name);
        runtime
            .block_on(run_pending_migrations(&url))
            .map_err(|err| format!("migrate template: {err}"))?;
    }
    Ok(template_name)
}

fn provision() -> Result<TestDatabase, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let cluster = cluster()?;
    let template_name = ensure_template_database(cluster, &runtime)?;
    let database = cluster
        .temporary_database_from_template(
            format!("test_{}", Uuid::new_v4().simple()).as_str(),
            template_name.as_str(),
        )
        .map_err(|err| format!("create database from template: {err:?}"))?;

    let config = PoolConfig::new(database.url().to_string()).with_max_size(4);
    let pool = runtime
        .block_on(DbPool::new(config))
        .map_err(|err| err.to_string())?;

    Ok(TestDatabase {
        runtime,
        pool,
        _database: database,
    })
}

/// Fresh migrated database, or `None` when the cluster is skipped.
pub fn test_database() -> Option<TestDatabase> {
    match provision() {
        Ok(database) => Some(database),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}
