// OpenAuthCert Badge Registry - CLI
// Build gate (`validate`) and read-only queries over the record store

use anyhow::{Context, Result};
use badge_registry::{
    gate, Badge, BadgeStatus, BadgeType, Enumerated, Registry, RegistryConfig, RegistryError,
    SearchParams,
};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

/// Exit status when the corpus cannot be loaded at all
const EXIT_LOAD_FAILURE: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "badge-registry")]
#[command(about = "Validate and query the OpenAuthCert badge registry", version)]
struct Cli {
    /// Root of the badge record store (default: $OAC_REGISTRY_DIR or registry/badge-registry)
    #[arg(short, long, global = true, value_name = "DIR")]
    registry: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check every invariant; exit 1 if any badge violates one
    Validate,
    /// List all badges, newest first
    List {
        #[arg(long)]
        json: bool,
    },
    /// Filter and sort badges
    Search {
        #[command(flatten)]
        filters: Filters,
        #[arg(long)]
        json: bool,
    },
    /// Distinct vendors, applications, types and statuses
    Facets {
        #[arg(long)]
        json: bool,
    },
    /// Show one badge by slug (vendor/application/version)
    Show {
        slug: String,
        #[arg(long)]
        json: bool,
    },
    /// Write matching badges as CSV to stdout
    Export {
        #[command(flatten)]
        filters: Filters,
    },
}

#[derive(Args, Debug, Default)]
struct Filters {
    /// Case-insensitive text search
    #[arg(long)]
    q: Option<String>,
    #[arg(long)]
    vendor: Option<String>,
    #[arg(long)]
    app: Option<String>,
    #[arg(long = "type", value_name = "BADGE_TYPE")]
    badge_type: Option<String>,
    #[arg(long)]
    status: Option<String>,
    /// newest (default), vendor, app, version
    #[arg(long)]
    sort: Option<String>,
}

impl From<Filters> for SearchParams {
    fn from(filters: Filters) -> Self {
        SearchParams {
            q: filters.q,
            vendor: filters.vendor,
            app: filters.app,
            badge_type: filters.badge_type,
            status: filters.status,
            sort: filters.sort,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = RegistryConfig::from_env();
    if let Some(dir) = cli.registry.clone() {
        config = config.with_registry_dir(dir);
    }

    match run(cli.command, &config) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("❌ {:#}", e);
            if e.downcast_ref::<RegistryError>().is_some() {
                ExitCode::from(EXIT_LOAD_FAILURE)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn init_tracing(verbose: bool) {
    // stdout carries command output; logs go to stderr
    let _ = tracing_subscriber::fmt()
        .with_max_level(if verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .with_writer(io::stderr)
        .try_init();
}

fn run(command: Command, config: &RegistryConfig) -> Result<ExitCode> {
    match command {
        Command::Validate => return run_validate(config),
        Command::List { json } => {
            let registry = load(config)?;
            print_badges(&registry.all_badges(), json)?;
        }
        Command::Search { filters, json } => {
            let registry = load(config)?;
            let results = registry.search(&SearchParams::from(filters));
            print_badges(&results, json)?;
        }
        Command::Facets { json } => {
            let facets = load(config)?.facets();
            if json {
                println!("{}", serde_json::to_string_pretty(&facets)?);
            } else {
                println!("Vendors:  {}", facets.vendors.join(", "));
                println!("Apps:     {}", facets.apps.join(", "));
                println!("Types:    {}", facets.types.join(", "));
                println!("Statuses: {}", facets.statuses.join(", "));
            }
        }
        Command::Show { slug, json } => {
            let registry = load(config)?;
            let Some(badge) = registry.get(&slug) else {
                eprintln!("❌ No badge found for {}", slug);
                return Ok(ExitCode::FAILURE);
            };
            if json {
                println!("{}", serde_json::to_string_pretty(badge)?);
            } else {
                print_detail(badge);
            }
        }
        Command::Export { filters } => {
            let registry = load(config)?;
            write_csv(&registry.search(&SearchParams::from(filters)))?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn load(config: &RegistryConfig) -> Result<Registry> {
    Registry::load(&config.registry_dir).with_context(|| {
        format!(
            "Failed to load badge registry from {}",
            config.registry_dir.display()
        )
    })
}

fn run_validate(config: &RegistryConfig) -> Result<ExitCode> {
    let outcome = gate::run(&config.registry_dir).with_context(|| {
        format!(
            "Failed to load badge registry from {}",
            config.registry_dir.display()
        )
    })?;

    if outcome.passed() {
        for line in outcome.report_lines() {
            println!("{}", line);
        }
        Ok(ExitCode::SUCCESS)
    } else {
        for line in outcome.report_lines() {
            eprintln!("{}", line);
        }
        Ok(ExitCode::FAILURE)
    }
}

// ============================================================================
// Output
// ============================================================================

fn type_label(badge_type: &Enumerated<BadgeType>) -> String {
    match badge_type {
        Enumerated::Known(known) => known.label().to_string(),
        Enumerated::Unknown(raw) => format!("{} (unrecognized)", raw),
    }
}

fn status_label(status: &Enumerated<BadgeStatus>) -> String {
    match status {
        Enumerated::Known(known) => known.label().to_string(),
        Enumerated::Unknown(raw) => format!("{} (unrecognized)", raw),
    }
}

fn print_badges(badges: &[Badge], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(badges)?);
        return Ok(());
    }

    if badges.is_empty() {
        println!("No badges found.");
        return Ok(());
    }

    for badge in badges {
        println!(
            "{:<45} {:<20} {:<16} {}",
            badge.slug,
            type_label(&badge.badge_type),
            status_label(&badge.status),
            badge.issued_at
        );
    }
    println!("\n{} badge(s)", badges.len());
    Ok(())
}

fn print_detail(badge: &Badge) {
    println!("{}", badge.slug);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Vendor:      {}", badge.vendor);
    println!("Application: {}", badge.application);
    println!("Version:     {}", badge.version);
    println!("Type:        {}", type_label(&badge.badge_type));
    println!("Status:      {}", status_label(&badge.status));
    println!("Issued:      {}", badge.issued_at);
    if let Some(revoked_at) = &badge.revoked_at {
        println!("Revoked:     {}", revoked_at);
    }
    if let Some(notes) = &badge.notes {
        println!("Notes:       {}", notes);
    }
    for url in badge.evidence_urls.iter().flatten() {
        println!("Evidence:    {}", url);
    }
    println!("Record:      {}", badge.path);
}

#[derive(Serialize)]
struct ExportRow<'a> {
    slug: &'a str,
    vendor: &'a str,
    application: &'a str,
    version: &'a str,
    badge_type: &'a str,
    status: &'a str,
    issued_at: &'a str,
    revoked_at: &'a str,
    evidence_urls: String,
    notes: &'a str,
    path: &'a str,
}

impl<'a> From<&'a Badge> for ExportRow<'a> {
    fn from(badge: &'a Badge) -> Self {
        ExportRow {
            slug: &badge.slug,
            vendor: &badge.vendor,
            application: &badge.application,
            version: &badge.version,
            badge_type: badge.badge_type.as_str(),
            status: badge.status.as_str(),
            issued_at: &badge.issued_at,
            revoked_at: badge.revoked_at.as_deref().unwrap_or(""),
            evidence_urls: badge
                .evidence_urls
                .as_ref()
                .map(|urls| urls.join(" "))
                .unwrap_or_default(),
            notes: badge.notes.as_deref().unwrap_or(""),
            path: &badge.path,
        }
    }
}

fn write_csv(badges: &[Badge]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    for badge in badges {
        writer
            .serialize(ExportRow::from(badge))
            .context("Failed to write CSV row")?;
    }
    writer.flush().context("Failed to flush CSV output")?;
    Ok(())
}
