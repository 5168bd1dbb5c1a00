use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    load_settings, FieldName, FormController, FormState, InMemorySessionStore, Mode,
    RecordingNavigator, TransientFlag,
};
use tracing::{info, warn};

#[derive(Parser, Debug)]
struct Cli {
    /// Overrides the identity service base URL from settings.
    #[arg(long)]
    identity_url: Option<String>,
    #[arg(long)]
    team_search_url: Option<String>,
    #[arg(long)]
    team_search_api_key: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        location: String,
        #[arg(long)]
        occupation: String,
        /// Search text for the favourite team; at least three characters.
        #[arg(long)]
        team_query: String,
        /// Which search result to pick, zero-based.
        #[arg(long, default_value_t = 0)]
        team_index: usize,
        /// Profile picture (.jpg, .jpeg or .png).
        #[arg(long)]
        picture: PathBuf,
    },
    ForgotPassword {
        #[arg(long)]
        email: String,
    },
    SearchTeam {
        query: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let cli = Cli::parse();

    let mut settings = load_settings()?;
    if let Some(url) = cli.identity_url {
        settings.identity_url = url;
    }
    if let Some(url) = cli.team_search_url {
        settings.team_search_url = url;
    }
    if cli.team_search_api_key.is_some() {
        settings.team_search_api_key = cli.team_search_api_key;
    }

    let store = Arc::new(InMemorySessionStore::new());
    let navigator = Arc::new(RecordingNavigator::new());
    let controller = FormController::from_settings(&settings, store.clone(), navigator.clone())?;

    match cli.command {
        Command::Login { email, password } => {
            controller.fill(FieldName::Email, email).await;
            controller.fill(FieldName::Password, password).await;
            controller.submit().await;

            let state = controller.snapshot().await;
            report(&state);
            match store.current() {
                Some(session) => println!(
                    "logged in; token={} route={}",
                    session.token,
                    navigator.current_route().unwrap_or_default()
                ),
                None if state.flags.is_raised(TransientFlag::WrongCredentials) => {
                    bail!("wrong credentials")
                }
                None => bail!("login not submitted"),
            }
        }
        Command::Register {
            username,
            email,
            password,
            location,
            occupation,
            team_query,
            team_index,
            picture,
        } => {
            controller.switch_mode(Mode::Register).await;
            controller.fill(FieldName::Username, username).await;
            controller.fill(FieldName::Email, email).await;
            controller.fill(FieldName::Password, password).await;
            controller.fill(FieldName::Location, location).await;
            controller.fill(FieldName::Occupation, occupation).await;

            controller.search_team(team_query.as_str()).await;
            let candidate = controller
                .snapshot()
                .await
                .search
                .results()
                .get(team_index)
                .cloned()
                .with_context(|| format!("no team result #{team_index} for {team_query:?}"))?;
            println!("favourite team: {} (id {})", candidate.name, candidate.team_id.0);
            controller.select_team(candidate).await;

            controller
                .drop_path(&picture)
                .await
                .with_context(|| format!("cannot attach {}", picture.display()))?;
            if let Some(rejection) = controller.snapshot().await.attachment_rejection {
                bail!("picture rejected: {rejection}");
            }

            controller.submit().await;
            let state = controller.snapshot().await;
            report(&state);
            if state.mode == Mode::Login {
                println!("registered; switch to login to continue");
            } else {
                bail!("registration not accepted");
            }
        }
        Command::ForgotPassword { email } => {
            controller.fill(FieldName::Email, email).await;
            controller.forgot_password().await;

            let state = controller.snapshot().await;
            report(&state);
            if state.flags.is_raised(TransientFlag::ForgotPasswordClicked) {
                println!("check your email for a reset link");
            } else if state.flags.is_raised(TransientFlag::MissingEmail) {
                bail!("an email address is required");
            } else {
                bail!("password reset request failed");
            }
        }
        Command::SearchTeam { query } => {
            controller.switch_mode(Mode::Register).await;
            controller.search_team(query).await;

            let state = controller.snapshot().await;
            if controller.search_failures() > 0 {
                bail!("team search failed");
            }
            for (index, team) in state.search.results().iter().enumerate() {
                println!("{index}: {} (id {})", team.name, team.team_id.0);
            }
        }
    }

    Ok(())
}

fn report(state: &FormState) {
    for field in FieldName::ALL {
        if let Some(message) = state.visible_error(field) {
            warn!(%field, "form: {message}");
        }
    }
    for flag in TransientFlag::ALL {
        if state.flags.is_raised(flag) {
            info!(?flag, "form: notice raised");
        }
    }
}
