//! Terminal front end: one subcommand per page of the shell.
//!
//! Every run mounts the session bootstrap, waits for the persisted session
//! to load, performs the page action through the gateway, prints the
//! resulting notifications, then unmounts.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use authshell::config::AuthConfig;
use authshell::identity::supabase::SupabaseClient;
use authshell::identity::{IdentityService, ProfilePatch, SignInParams, SignUpParams};
use authshell::routes::{AppRoute, post_login_target, redirect_param};
use authshell::validate::{self, FieldError};
use authshell::{
    AuthFailure, AuthGateway, ChannelNotifier, ConfigError, GuardOutcome, IdentityError, Notification, RouteGuard,
    SessionBootstrap, SessionStore,
};
use clap::{Args, Parser, Subcommand};
use tokio::sync::mpsc::UnboundedReceiver;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("identity client setup failed: {0}")]
    Identity(#[from] IdentityError),
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("{0}")]
    Auth(#[from] AuthFailure),
    #[error("not signed in; continue at {0}")]
    Redirect(String),
}

impl From<Vec<FieldError>> for CliError {
    fn from(errors: Vec<FieldError>) -> Self {
        let joined = errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ");
        Self::Invalid(joined)
    }
}

#[derive(Parser, Debug)]
#[command(name = "authshell", about = "Sign in, register, and reach the protected dashboard")]
struct Cli {
    /// Persist the session to this file; overrides `AUTH_SESSION_FILE`.
    /// With neither set the session lives in memory for this run only.
    #[arg(long)]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Login page.
    Signin(SignInArgs),
    /// Sign-up page.
    Signup(SignUpArgs),
    /// Reset-password page.
    ResetPassword {
        #[arg(long)]
        email: String,
    },
    /// Dashboard sign-out action.
    Signout,
    /// Profile form.
    UpdateProfile(ProfileArgs),
    /// Protected dashboard page.
    Dashboard,
    /// Follow session changes until interrupted.
    Watch,
}

#[derive(Args, Debug)]
struct SignInArgs {
    #[arg(long)]
    email: String,
    #[arg(long, env = "AUTH_PASSWORD", hide_env_values = true)]
    password: String,
    /// Path to return to, or the full `/login?redirect=...` URL.
    #[arg(long)]
    redirect: Option<String>,
}

#[derive(Args, Debug)]
struct SignUpArgs {
    #[arg(long)]
    email: String,
    #[arg(long)]
    full_name: String,
    #[arg(long, env = "AUTH_PASSWORD", hide_env_values = true)]
    password: String,
    #[arg(long, env = "AUTH_PASSWORD_CONFIRM", hide_env_values = true)]
    confirm_password: String,
}

#[derive(Args, Debug)]
struct ProfileArgs {
    #[arg(long)]
    username: Option<String>,
    #[arg(long)]
    full_name: Option<String>,
    #[arg(long)]
    bio: Option<String>,
    #[arg(long)]
    website: Option<String>,
    #[arg(long)]
    avatar_url: Option<String>,
    #[arg(long)]
    location: Option<String>,
}

impl From<ProfileArgs> for ProfilePatch {
    fn from(args: ProfileArgs) -> Self {
        Self {
            email: None,
            username: args.username,
            full_name: args.full_name,
            bio: args.bio,
            website: args.website,
            avatar_url: args.avatar_url,
            location: args.location,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = AuthConfig::from_env()?.with_session_file(cli.session_file);

    let identity: Arc<dyn IdentityService> = Arc::new(SupabaseClient::from_config(&config)?);
    let store = SessionStore::new();
    let bootstrap = SessionBootstrap::mount(Arc::clone(&identity), store.clone());
    store.ready().await;

    let (notifier, mut toasts) = ChannelNotifier::channel();
    let gateway = AuthGateway::new(identity, store.clone(), Arc::new(notifier), config.reset_redirect_url());

    let result = run_page(&gateway, cli.command).await;
    show_toasts(&mut toasts);
    bootstrap.unmount().await;
    result
}

async fn run_page(gateway: &AuthGateway, command: Command) -> Result<(), CliError> {
    match command {
        Command::Signin(args) => {
            validate::validate_login(&args.email, &args.password)?;
            gateway.sign_in(SignInParams { email: args.email.trim().to_owned(), password: args.password }).await?;
            let from = args.redirect.map(|r| redirect_param(&r).unwrap_or(r));
            // Only protected routes are followed and the dashboard is the one
            // protected page the terminal renders.
            let target = post_login_target(from.as_deref());
            tracing::debug!(route = target.path(), "post-login navigation");
            show_dashboard(gateway.store()).await
        }
        Command::Signup(args) => {
            validate::validate_sign_up(&args.email, &args.full_name, &args.password, &args.confirm_password)?;
            let params = SignUpParams {
                email: args.email.trim().to_owned(),
                password: args.password,
                full_name: args.full_name.trim().to_owned(),
            };
            gateway.sign_up(params).await?;
            if gateway.store().snapshot().user.is_none() {
                println!("continue at {}", AppRoute::Login.path());
            }
            Ok(())
        }
        Command::ResetPassword { email } => {
            validate::validate_reset(&email)?;
            gateway.reset_password(email.trim()).await?;
            Ok(())
        }
        Command::Signout => {
            gateway.sign_out().await?;
            println!("continue at {}", AppRoute::Login.path());
            Ok(())
        }
        Command::UpdateProfile(args) => {
            let patch = ProfilePatch::from(args);
            if patch.is_empty() {
                return Err(CliError::Invalid("nothing to update".to_owned()));
            }
            gateway.update_profile(patch).await?;
            Ok(())
        }
        Command::Dashboard => show_dashboard(gateway.store()).await,
        Command::Watch => {
            watch(gateway.store()).await;
            Ok(())
        }
    }
}

async fn show_dashboard(store: &SessionStore) -> Result<(), CliError> {
    let mut guard = RouteGuard::new(AppRoute::Dashboard.path());
    match guard.resolve(store).await {
        GuardOutcome::Authenticated(user) => {
            println!("Dashboard");
            println!("  e-mail: {}", user.email.as_deref().unwrap_or("-"));
            if let Some(name) = user.full_name() {
                println!("  name:   {name}");
            }
            println!("  id:     {}", user.id);
            Ok(())
        }
        GuardOutcome::Redirect(target) => Err(CliError::Redirect(target)),
    }
}

async fn watch(store: &SessionStore) {
    let mut rx = store.subscribe();
    println!("watching session changes; Ctrl-C to stop");
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = rx.borrow_and_update().clone();
                match state.user {
                    Some(user) => println!("signed in as {}", user.email.as_deref().unwrap_or("-")),
                    None if state.loading => println!("loading..."),
                    None => println!("signed out"),
                }
            }
        }
    }
}

fn show_toasts(toasts: &mut UnboundedReceiver<Notification>) {
    while let Ok(toast) = toasts.try_recv() {
        if toast.is_success() {
            println!("✔ {}", toast.message);
        } else {
            eprintln!("✘ {}", toast.message);
        }
    }
}
