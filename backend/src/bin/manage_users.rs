//! Administrative user maintenance against the portal database.
//!
//! ```text
//! agroai-users set-role alice owner
//! agroai-users grant-trial alice --days 14
//! ```

use std::ffi::OsString;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Context, Report, Result, eyre};
use mockable::DefaultClock;
use ortho_config::OrthoConfig;

use agroai::domain::{AccountService, Role, User, Username};
use agroai::outbound::bcrypt_hasher::BcryptPasswordHasher;
use agroai::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
use agroai::settings::AppSettings;

#[derive(Debug, Parser)]
#[command(name = "agroai-users", about = "Manage portal user roles and trials")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Change a user's role (farmer, owner or admin).
    SetRole { username: String, role: Role },
    /// Start a trial that ends `days` from now.
    GrantTrial {
        username: String,
        #[arg(long, default_value_t = 3)]
        days: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    // Settings come from the environment and config files only; the
    // command line belongs to clap above.
    let settings = AppSettings::load_from_iter([OsString::from("agroai-users")])
        .map_err(|err| eyre!("failed to load settings: {err}"))?;
    let pool = DbPool::new(PoolConfig::new(settings.database_url()?).with_max_size(1))
        .await
        .wrap_err("failed to connect to the database")?;
    let accounts = AccountService::new(
        Arc::new(DieselUserRepository::new(pool)),
        Arc::new(BcryptPasswordHasher::new(settings.bcrypt_cost())),
        Arc::new(DefaultClock),
    );

    let user = run(&accounts, cli.command).await?;
    println!("{}", describe(&user));
    Ok(())
}

async fn run(accounts: &AccountService, command: Command) -> Result<User> {
    match command {
        Command::SetRole { username, role } => {
            let username = parse_username(&username)?;
            accounts.set_role(&username, role).await.map_err(Report::new)
        }
        Command::GrantTrial { username, days } => {
            if days <= 0 {
                return Err(eyre!("--days must be positive, got {days}"));
            }
            let username = parse_username(&username)?;
            accounts
                .grant_trial(&username, days)
                .await
                .map_err(Report::new)
        }
    }
}

fn parse_username(raw: &str) -> Result<Username> {
    Username::new(raw).wrap_err_with(|| format!("invalid username '{raw}'"))
}

fn describe(user: &User) -> String {
    let subscription = user.subscription();
    let window = subscription
        .trial_end
        .or(subscription.expiry_date)
        .map_or_else(|| "none".to_owned(), |end| end.to_rfc3339());
    format!(
        "{} role={} plan={} ends={window}",
        user.username().as_ref(),
        user.role(),
        subscription.plan_type.as_str(),
    )
}
