use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use secrecy::SecretString;
use services::services::{
    config::{DEFAULT_SERVICE_URL, DEFAULT_USER_ID, DirectoryConfig},
    directory_client::{UserDirectory, UserDirectoryClient},
    profile_panel::{DraftField, PanelCallbacks, ProfilePanel},
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "profile-panel", about = "View, rename or delete a directory user")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Base url of the user directory service
    #[arg(long, env = "USER_SERVICE_URL", default_value = DEFAULT_SERVICE_URL)]
    service_url: String,

    #[arg(long, env = "USER_SERVICE_USER_ID", default_value = DEFAULT_USER_ID)]
    user_id: String,

    /// Bearer token forwarded to the directory service
    #[arg(long, env = "USER_SERVICE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "USER_SERVICE_TIMEOUT_SECS", default_value_t = 10)]
    timeout_secs: u64,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
enum Command {
    /// Print the profile (default)
    Show,
    /// Change the username
    Rename { username: String },
    /// Delete the account, confirming with its email address
    Delete { email: String },
}

impl Cli {
    fn config(&self) -> DirectoryConfig {
        DirectoryConfig {
            service_url: self.service_url.clone(),
            user_id: self.user_id.clone(),
            token: self
                .token
                .as_deref()
                .filter(|t| !t.trim().is_empty())
                .map(|t| SecretString::new(t.into())),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

async fn run<D: UserDirectory>(panel: &mut ProfilePanel<D>, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Show => {}
        Command::Rename { username } => {
            panel.begin_edit()?;
            panel.update_draft_field(DraftField::Username, username)?;
            panel.save().await?;
        }
        Command::Delete { email } => {
            panel.request_delete()?;
            panel.update_delete_confirmation_email(email)?;
            panel.confirm_delete().await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "profile_panel=info,services=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = cli.config();
    let client = UserDirectoryClient::new(config.timeout)?;

    let callbacks = PanelCallbacks::new()
        .on_error(|e| tracing::error!(error = %e, "profile panel error"))
        .on_success(|message| tracing::info!("{message}"));
    let mut panel = ProfilePanel::open(
        client,
        &config.service_url,
        &config.user_id,
        config.token.clone(),
        callbacks,
    )
    .context("invalid user service configuration")?;

    // Load failures are reported through the error callback; the panel still
    // renders its empty view.
    let _ = panel.load().await;
    let result = run(&mut panel, cli.command.unwrap_or(Command::Show)).await;

    print!("{}", panel.view());
    result
}
