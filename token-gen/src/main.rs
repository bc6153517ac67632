use std::sync::Arc;

use anyhow::Result;
use auction_api::config::SigningConfig;
use auction_api::services::auth::{SigningKeys, TokenIssuer};
use clap::Parser;

/// Issue a bearer token for local development.
///
/// Reads the same signing settings as the server (AUTH_SIGNING_SECRET,
/// AUTH_ISSUER, AUTH_AUDIENCE, AUTH_TOKEN_EXPIRY_MINUTES), so the token is
/// accepted by a server started with the same environment.
#[derive(Parser, Debug)]
#[command(name = "token-gen", version, about)]
struct Args {
    /// Subject (user) id embedded in the token
    #[arg(long)]
    user_id: i64,

    /// Display name
    #[arg(long)]
    name: String,

    /// Optional email
    #[arg(long)]
    email: Option<String>,

    /// Permission to grant; repeat for more (e.g. --permission auctions.write)
    #[arg(long = "permission", value_name = "NAME")]
    permissions: Vec<String>,

    /// Print only the token (no extra lines)
    #[arg(long, default_value_t = false)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    dotenvy::dotenv().ok();

    let signing = SigningConfig::from_env()?;
    let issuer = TokenIssuer::new(Arc::new(SigningKeys::new(signing)));
    let token = issuer.issue(
        args.user_id,
        &args.name,
        args.email.as_deref(),
        &args.permissions,
    )?;

    if args.quiet {
        println!("{token}");
    } else {
        println!("Authorization: Bearer {token}");
        println!("expires in {} minutes", issuer.expiry_minutes());
    }
    Ok(())
}
