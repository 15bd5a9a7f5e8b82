//! `portal`: terminal front end for the WME client portal.
//!
//! Drives the same controllers a browser shell would: the booking-ID login
//! form, the verification/impersonation bootstrap and the admin screens.
//! Durable storage is a JSON file; navigation is printed.

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod admin;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use portal_client::{ClientConfig, PortalClient};
use portal_core::api::PortalApi;
use portal_core::bootstrap::{
    BootstrapAction, Bootstrapper, IMPERSONATION_TOKEN_KEY, LoginQuery, MissingImpersonation,
};
use portal_core::form::{
    BANNER_TEXT, BANNER_TITLE, ERROR_TITLE, LoginForm, SUBMIT_LABEL, SubmitOutcome,
};
use portal_core::marketing::{self, login_card};
use portal_core::navigation::Navigator;
use portal_core::session;
use portal_storage::{FileBackend, MemoryBackend, StorageBackend};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

// ── ANSI color helpers ───────────────────────────────────────────────

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const WHITE: &str = "\x1b[37m";

// ── CLI structure ────────────────────────────────────────────────────

/// WME Client Portal: booking-ID login from the terminal.
#[derive(Parser)]
#[command(
    name = "portal",
    version,
    about = "WME Client Portal CLI to log in with a booking ID and manage the portal",
    long_about = None,
    after_help = format!(
        "{DIM}Environment variables:{RESET}\n  \
         PORTAL_API_URL        API base URL (default: http://127.0.0.1:8080)\n  \
         PORTAL_ADMIN_TOKEN    Bearer token for admin commands\n  \
         PORTAL_TIMEOUT_SECS   Request timeout in seconds (default: 10)\n  \
         PORTAL_STORAGE_PATH   Local storage file (default: .portal/storage.json)\n\n\
         {DIM}Examples:{RESET}\n  \
         portal login WME1234X\n  \
         portal open 'https://portal.example/?verified=true&bookingId=WME1234X'\n  \
         portal admin dashboard"
    ),
)]
struct Cli {
    /// Portal API base URL.
    #[arg(long, env = "PORTAL_API_URL", default_value = "http://127.0.0.1:8080")]
    api_url: String,

    /// Bearer token sent with admin requests.
    #[arg(long, env = "PORTAL_ADMIN_TOKEN", hide_env_values = true)]
    admin_token: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, env = "PORTAL_TIMEOUT_SECS", default_value = "10")]
    timeout_secs: u64,

    /// File holding the locally cached client record and site settings.
    #[arg(long, env = "PORTAL_STORAGE_PATH", default_value = ".portal/storage.json")]
    storage: PathBuf,

    /// Log level used when `RUST_LOG` is unset.
    #[arg(long, env = "PORTAL_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON.
    #[arg(long, default_value = "false")]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the landing page: hero, navigation and login card.
    Landing,
    /// Log in with a booking ID.
    Login {
        /// The 8-character booking ID (case and punctuation are ignored).
        booking_id: String,
    },
    /// Open a login-page URL and react to its query (verification, impersonation).
    Open {
        /// Full URL, path with query, or bare query string.
        url: String,
        /// Impersonation token issued to an administrator for this session.
        #[arg(long, env = "PORTAL_IMPERSONATION_TOKEN", hide_env_values = true)]
        impersonation_token: Option<String>,
    },
    /// Show the cached client record.
    Whoami,
    /// Forget the cached client record.
    Logout,
    /// Administrator screens.
    Admin {
        #[command(subcommand)]
        action: admin::AdminCommands,
    },
}

/// Everything a command needs, built once from the flags.
struct App {
    api: Arc<dyn PortalApi>,
    durable: Arc<dyn StorageBackend>,
    navigator: Arc<dyn Navigator>,
}

/// Prints navigation instead of performing it.
struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn navigate(&self, path: &str) {
        println!("  {DIM}→ navigating to{RESET} {CYAN}{path}{RESET}");
    }
}

// ── Output helpers ───────────────────────────────────────────────────

pub(crate) fn header(icon: &str, title: &str) {
    println!("{BOLD}{CYAN}{icon} {title}{RESET}");
    println!("{DIM}─────────────────────────────────────────{RESET}");
}

pub(crate) fn kv_line(key: &str, value: &str) {
    println!("  {DIM}{key:<20}{RESET} {WHITE}{value}{RESET}");
}

pub(crate) fn success(msg: &str) {
    println!("{GREEN}{BOLD}✓{RESET} {msg}");
}

pub(crate) fn warning(msg: &str) {
    println!("{YELLOW}{BOLD}⚠{RESET} {YELLOW}{msg}{RESET}");
}

pub(crate) fn print_json(value: &Value) {
    if value.is_null() {
        return;
    }
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("failed to format JSON: {e}"),
    }
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

// ── Command dispatch ─────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_json);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!();
            eprintln!("  {RED}{BOLD}✗ Error:{RESET} {e:#}");
            eprintln!();
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    if matches!(cli.command, Commands::Landing) {
        cmd_landing();
        return Ok(());
    }

    let ctx = build_app(&cli).await?;
    match cli.command {
        Commands::Landing => Ok(()),
        Commands::Login { booking_id } => cmd_login(&ctx, &booking_id).await,
        Commands::Open {
            url,
            impersonation_token,
        } => cmd_open(&ctx, &url, impersonation_token).await,
        Commands::Whoami => cmd_whoami(&ctx).await,
        Commands::Logout => cmd_logout(&ctx).await,
        Commands::Admin { action } => admin::run(&ctx, action).await,
    }
}

async fn build_app(cli: &Cli) -> Result<App> {
    let api = PortalClient::from_resolved(ClientConfig {
        base_url: cli.api_url.clone(),
        admin_token: cli.admin_token.clone().unwrap_or_default(),
        timeout: Duration::from_secs(cli.timeout_secs),
    })
    .context("invalid API configuration")?;

    let durable = FileBackend::open(&cli.storage)
        .await
        .with_context(|| format!("failed to open storage at {}", cli.storage.display()))?;

    Ok(App {
        api: Arc::new(api),
        durable: Arc::new(durable),
        navigator: Arc::new(TerminalNavigator),
    })
}

impl App {
    fn login_form(&self) -> LoginForm {
        LoginForm::new(
            Arc::clone(&self.api),
            Arc::clone(&self.durable),
            Arc::clone(&self.navigator),
        )
    }
}

// ── Landing ──────────────────────────────────────────────────────────

fn cmd_landing() {
    println!();
    let nav = marketing::NAV_LINKS
        .iter()
        .map(|link| format!("{} {DIM}({}){RESET}", link.label, link.path))
        .collect::<Vec<_>>()
        .join("  ·  ");
    println!(
        "  {BOLD}{}{RESET} {} {DIM}|{RESET} {nav}  {CYAN}[{}]{RESET}",
        marketing::BRAND,
        marketing::PRODUCT,
        marketing::CLIENT_LOGIN.label
    );
    println!();

    println!("  {BOLD}{WHITE}{}{RESET}", marketing::HERO_HEADLINE);
    println!("  {DIM}{}{RESET}", marketing::HERO_TAGLINE);
    println!();
    for feature in &marketing::HERO_FEATURES {
        println!("  {GREEN}•{RESET} {BOLD}{}{RESET}", feature.title);
        println!("    {DIM}{}{RESET}", feature.description);
    }
    println!();

    println!(
        "  {CYAN}[{}]{RESET}  {DIM}{}{RESET}",
        login_card::TAB_LOGIN,
        login_card::TAB_BOOKING
    );
    header("🔐", login_card::TITLE);
    println!("  {}", login_card::DESCRIPTION);
    kv_line(login_card::FIELD_LABEL, login_card::PLACEHOLDER);
    println!("  {DIM}portal login <BOOKING_ID>   ({SUBMIT_LABEL}){RESET}");
    println!("  {DIM}{}{RESET}", login_card::FOOTER);
    println!();
}

// ── Client session ───────────────────────────────────────────────────

async fn cmd_login(ctx: &App, raw: &str) -> Result<()> {
    let form = ctx.login_form();
    if !form.input(raw) {
        warning("Booking ID longer than 8 characters was ignored");
    }

    println!();
    header("🔐", login_card::TITLE);
    kv_line(login_card::FIELD_LABEL, &form.booking_id());
    println!();

    let outcome = form.submit().await;
    form.teardown();
    report_outcome(ctx, outcome).await
}

async fn cmd_open(ctx: &App, url: &str, impersonation_token: Option<String>) -> Result<()> {
    let ephemeral: Arc<dyn StorageBackend> = Arc::new(match impersonation_token {
        Some(token) => MemoryBackend::with_entries([(IMPERSONATION_TOKEN_KEY, token)]),
        None => MemoryBackend::new(),
    });
    let form = ctx.login_form();
    let query = LoginQuery::parse(url);

    let action = Bootstrapper::new(ephemeral).run(&form, &query).await;
    let result = match action {
        BootstrapAction::Impersonated(outcome) => {
            println!();
            header("🕵", "Impersonated login");
            report_outcome(ctx, outcome).await
        }
        BootstrapAction::ImpersonationSkipped { missing } => {
            let what = match missing {
                MissingImpersonation::Token => "no impersonation token",
                MissingImpersonation::BookingId => "no bookingId in the URL",
                MissingImpersonation::Both => "no impersonation token or bookingId",
            };
            warning(&format!("Impersonation skipped: {what}"));
            Ok(())
        }
        BootstrapAction::VerifiedBanner { .. } => {
            let view = form.view();
            println!();
            success(&format!("{BOLD}{BANNER_TITLE}{RESET}"));
            println!("  {BANNER_TEXT}");
            println!();
            kv_line(login_card::FIELD_LABEL, &view.booking_id);
            println!("  {DIM}portal login {}{RESET}", view.booking_id);
            Ok(())
        }
        BootstrapAction::Nothing | BootstrapAction::AlreadyRan => {
            println!("  {DIM}Nothing to do for this URL.{RESET}");
            Ok(())
        }
    };
    form.teardown();
    result
}

async fn report_outcome(ctx: &App, outcome: SubmitOutcome) -> Result<()> {
    match outcome {
        SubmitOutcome::Redirected => {
            success("Logged in.");
            if let Ok(Some(client)) = session::load_client(ctx.durable.as_ref()).await {
                print_json(&client);
            }
            Ok(())
        }
        SubmitOutcome::Rejected(err) => bail!("{ERROR_TITLE}: {err}"),
        SubmitOutcome::Busy => bail!("a login is already in progress"),
        SubmitOutcome::Abandoned => bail!("login abandoned"),
    }
}

async fn cmd_whoami(ctx: &App) -> Result<()> {
    let client = session::load_client(ctx.durable.as_ref())
        .await
        .context("failed to read cached client record")?;
    match client {
        Some(client) => {
            println!();
            header("👤", "Cached client");
            print_json(&client);
        }
        None => warning("Not logged in."),
    }
    Ok(())
}

async fn cmd_logout(ctx: &App) -> Result<()> {
    session::clear_client(ctx.durable.as_ref())
        .await
        .context("failed to clear cached client record")?;
    success("Cached client record cleared.");
    Ok(())
}
