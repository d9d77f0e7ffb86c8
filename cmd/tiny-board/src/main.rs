//! # tiny-board
//!
//! Assembles the board from its adapters according to configuration and
//! compile-time features, then serves it over HTTP.

use std::sync::Arc;

use anyhow::Context;
use api_adapters::{build_router, AppState};
use auth_adapters::IdentityCookieCodec;
use configs::{LogFormat, LogSettings, Settings};
use domains::{PostStore, RoleStore};
use secrecy::{ExposeSecret, SecretString};
use services::{BoardService, BoardSettings, WordListFilter, MIN_POST_INTERVAL_MS};
use storage_adapters::{InMemoryPostStore, InMemoryRateLimiter, InMemoryRoleStore};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = configs::load().context("loading configuration")?;
    init_tracing(&settings.log);

    let (posts, roles) = build_stores(&settings).await?;
    let board = Arc::new(BoardService::new(
        posts,
        roles,
        Arc::new(InMemoryRateLimiter::new(MIN_POST_INTERVAL_MS)),
        Arc::new(WordListFilter::new(settings.board.banned_words.iter().cloned())),
        board_settings(&settings),
    ));

    let state = AppState::new(board, cookie_codec(&settings), settings.cookie.secure);
    let app = build_router(state);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "tiny-board listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

/// `RUST_LOG` wins over the configured filter when set.
fn init_tracing(log: &LogSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match log.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

fn board_settings(settings: &Settings) -> BoardSettings {
    BoardSettings {
        default_topic: settings.board.default_topic.clone(),
        max_name_len: settings.board.max_name_len,
        max_content_len: settings.board.max_content_len,
        max_topic_len: settings.board.max_topic_len,
    }
}

/// Without a configured secret, cookies are signed with a per-process key
/// and stop verifying after a restart.
fn cookie_codec(settings: &Settings) -> IdentityCookieCodec {
    let secret = match &settings.cookie.secret {
        Some(secret) => SecretString::from(secret.expose_secret().to_owned()),
        None => {
            warn!("cookie.secret is not set; identity cookies will not survive a restart");
            SecretString::from(uuid::Uuid::new_v4().simple().to_string())
        }
    };
    IdentityCookieCodec::new(secret)
}

#[cfg(feature = "db-postgres")]
async fn build_stores(settings: &Settings) -> anyhow::Result<(Arc<dyn PostStore>, Arc<dyn RoleStore>)> {
    use storage_adapters::{postgres, PgPostStore, PgRoleStore};

    let Some(url) = &settings.database.url else {
        warn!("database.url is not set; using in-memory stores");
        return Ok(in_memory_stores());
    };
    let pool = postgres::connect(url.expose_secret(), settings.database.max_connections)
        .await
        .context("connecting to postgres")?;
    postgres::migrate(&pool).await.context("creating schema")?;
    info!("using postgres stores");
    Ok((
        Arc::new(PgPostStore::new(pool.clone())),
        Arc::new(PgRoleStore::new(pool)),
    ))
}

#[cfg(not(feature = "db-postgres"))]
async fn build_stores(settings: &Settings) -> anyhow::Result<(Arc<dyn PostStore>, Arc<dyn RoleStore>)> {
    if settings.database.url.is_some() {
        warn!("database.url is set but this build has no db-postgres feature; using in-memory stores");
    }
    Ok(in_memory_stores())
}

fn in_memory_stores() -> (Arc<dyn PostStore>, Arc<dyn RoleStore>) {
    (
        Arc::new(InMemoryPostStore::new()),
        Arc::new(InMemoryRoleStore::new()),
    )
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
