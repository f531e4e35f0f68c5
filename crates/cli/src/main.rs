//! Demo walking the full authentication flow against the in-memory
//! collaborators: seed an identity, log in with a remember-me token,
//! auto-login after the browser session ends (token rotation), then
//! log out everywhere.

use std::sync::Arc;

use clap::Parser;
use tracing::info;

use gatehouse_auth::{
    Auth, IdentityStore, MemorySession, MemoryStorage, MemoryTransport, PasswordHasher,
    SessionStore, Settings, TokenTransport,
};
use gatehouse_common::Identity;

#[derive(Parser)]
#[command(name = "gatehouse", about = "Authentication flow demo")]
struct Args {
    /// Optional settings file (TOML)
    #[arg(long)]
    config: Option<String>,

    #[arg(long, default_value = "alice")]
    username: String,

    #[arg(long, default_value = "correct horse battery staple")]
    password: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let settings = Arc::new(match &args.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    });

    let storage = MemoryStorage::new();
    let session = MemorySession::new();
    let transport = MemoryTransport::new();

    // Seed an identity the way a signup flow would
    let hasher = PasswordHasher::new(settings.hash_cost);
    let mut identity = Identity::new(1, args.username.to_lowercase(), String::new());
    hasher.assign(&mut identity, &mut args.password.clone())?;
    storage.save(&identity).await?;
    info!(username = %identity.username, "identity seeded");

    // A new Auth per "request", sharing the collaborators
    let request = |storage: &MemoryStorage| {
        Auth::new(
            Arc::new(storage.clone()),
            Arc::new(storage.clone()),
            Arc::new(session.clone()),
            Arc::new(transport.clone()),
            settings.clone(),
        )
    };

    let mut auth = request(&storage);
    let ok = auth.login(&args.username, &args.password, true).await?;
    info!(ok, token = ?transport.remember_token(), "interactive login");

    // Browser session ends; the remember-me cookie survives
    session.destroy().await?;

    let mut auth = request(&storage);
    let user = auth.current_user(true).await?;
    info!(
        user = ?user.as_ref().map(|u| u.username.as_str()),
        rotated_token = ?transport.remember_token(),
        "auto-login from remember-me token"
    );

    let mut auth = request(&storage);
    let out = auth.logout(false, true).await?;
    info!(logged_out = out, tokens_left = storage.token_count(), "logout everywhere");

    Ok(())
}
