//! # seed
//!
//! Grants a role to an identity in the Postgres `user_roles` table. This is
//! the only way roles are assigned; the HTTP surface never writes them.
//!
//! ```text
//! seed admin @e0e0a1b
//! seed moderator --seed "my secret phrase"
//! ```

use anyhow::{bail, Context};
use clap::Parser;
use domains::{Identity, Role};
use secrecy::ExposeSecret;
use services::identity;
use storage_adapters::{postgres, PgRoleStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "seed")]
#[command(about = "Assign a board role to an identity", long_about = None)]
struct Cli {
    /// One of blue, speaker, manager, moderator, summit, admin.
    #[arg(value_parser = parse_role)]
    role: Role,

    /// Public identity such as `@e0e0a1b`.
    #[arg(required_unless_present = "seed", conflicts_with = "seed")]
    identity: Option<String>,

    /// Derive the identity from this secret seed instead.
    #[arg(long)]
    seed: Option<String>,
}

fn parse_role(value: &str) -> Result<Role, String> {
    Role::parse(value).ok_or_else(|| format!("unknown role `{value}`"))
}

impl Cli {
    fn target(&self) -> anyhow::Result<Identity> {
        match (&self.identity, &self.seed) {
            (_, Some(seed)) => Ok(identity::derive(seed)),
            (Some(id), None) if identity::is_well_formed(id) => Ok(Identity::new(id.as_str())),
            (Some(id), None) => bail!("`{id}` is not an identity; expected `@` and 7 hex digits"),
            (None, None) => bail!("an identity or --seed is required"),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = configs::load().context("loading configuration")?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log.filter)),
        )
        .init();

    let target = cli.target()?;
    let Some(url) = &settings.database.url else {
        bail!("database.url is not configured (set BOARD__DATABASE__URL)");
    };

    let pool = postgres::connect(url.expose_secret(), 1)
        .await
        .context("connecting to postgres")?;
    postgres::migrate(&pool).await.context("creating schema")?;

    PgRoleStore::new(pool)
        .assign(&target, cli.role)
        .await
        .context("assigning role")?;
    info!(identity = %target, role = cli.role.as_str(), "role assigned");
    println!("{target} is now {}", cli.role.as_str());
    Ok(())
}
