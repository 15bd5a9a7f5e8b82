//! `portal admin`: dashboard, logout, health check and site settings.

use std::sync::Arc;

use anyhow::{Result, bail};
use clap::Subcommand;
use portal_core::admin::AdminDashboard;
use portal_core::settings::{AdminSettings, SiteSettings};

use super::{App, BOLD, DIM, RESET, header, kv_line, print_json, success};

#[derive(Subcommand)]
pub(crate) enum AdminCommands {
    /// Show the summary cards and the client list.
    Dashboard,
    /// End the admin session.
    Logout {
        /// Leave for the admin login even if the API call fails.
        #[arg(long, default_value = "false")]
        ignore_errors: bool,
    },
    /// Ask the backend for its health report.
    Health,
    /// Show or change the locally kept site settings.
    Settings {
        /// New site title.
        #[arg(long)]
        title: Option<String>,
        /// New support email.
        #[arg(long)]
        email: Option<String>,
    },
}

pub(crate) async fn run(app: &App, action: AdminCommands) -> Result<()> {
    match action {
        AdminCommands::Dashboard => cmd_dashboard(app).await,
        AdminCommands::Logout { ignore_errors } => cmd_logout(app, ignore_errors).await,
        AdminCommands::Health => cmd_health(app).await,
        AdminCommands::Settings { title, email } => cmd_settings(app, title, email).await,
    }
}

fn dashboard(app: &App) -> AdminDashboard {
    AdminDashboard::new(Arc::clone(&app.api), Arc::clone(&app.navigator))
}

fn settings(app: &App) -> AdminSettings {
    AdminSettings::new(
        Arc::clone(&app.api),
        Arc::clone(&app.navigator),
        Arc::clone(&app.durable),
    )
}

async fn cmd_dashboard(app: &App) -> Result<()> {
    let dash = dashboard(app);
    dash.load().await;
    if let Some(err) = dash.error() {
        bail!("{err}");
    }

    let summary = dash.summary();
    println!();
    header("📊", "Admin Dashboard");
    kv_line("Total Clients", &summary.total_clients.to_string());
    kv_line("Active Bookings", &summary.active_bookings.to_string());
    kv_line("Total Revenue", &summary.total_revenue);
    println!();

    let clients = dash.clients();
    if clients.is_empty() {
        println!("  {DIM}No clients.{RESET}");
    } else {
        println!(
            "  {BOLD}{:<10} {:<24} {:<24} {}{RESET}",
            "Booking", "Name", "Artist", "Status"
        );
        for c in &clients {
            println!(
                "  {:<10} {:<24} {:<24} {DIM}{}{RESET}",
                c.booking_id, c.name, c.artist, c.status
            );
        }
    }
    println!();
    Ok(())
}

async fn cmd_logout(app: &App, ignore_errors: bool) -> Result<()> {
    if ignore_errors {
        settings(app).sign_out().await;
    } else {
        dashboard(app).logout().await?;
    }
    success("Signed out.");
    Ok(())
}

async fn cmd_health(app: &App) -> Result<()> {
    let report = settings(app).check_system_health().await?;
    println!();
    header("🩺", "System Health");
    print_json(&report);
    Ok(())
}

async fn cmd_settings(app: &App, title: Option<String>, email: Option<String>) -> Result<()> {
    let screen = settings(app);
    let mut site: SiteSettings = screen.site_settings().await;

    if title.is_some() || email.is_some() {
        if let Some(title) = title {
            site.site_title = title;
        }
        if let Some(email) = email {
            site.support_email = email;
        }
        if !screen.save(&site).await? {
            bail!("a save is already in progress");
        }
        success("Site settings saved.");
    }

    println!();
    header("⚙", "Site Settings");
    kv_line("Site Title", &site.site_title);
    kv_line("Support Email", &site.support_email);
    println!();
    Ok(())
}
