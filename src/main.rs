use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use registrar::{
    api::{self, SecurityConfig},
    client::RegistrarClient,
    db, engine, render,
};

#[derive(Parser)]
#[command(name = "registrar")]
#[command(about = "Course registration server with schedule-conflict detection")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the registrar server
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
    /// Parse a schedule string and print its meetings (offline)
    Parse {
        /// e.g. "MWF 9:00-9:50 AM"
        schedule: String,
    },
    /// Scan active courses for conflicts (requires a running server)
    Conflicts,
    /// Print a student's weekly schedule grid (requires a running server)
    Schedule {
        /// Student UUID
        student_id: Uuid,
    },
    /// Check server status
    Status,
}

/// Initialize tracing to stderr so command output on stdout stays clean.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "registrar=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn serve(port: u16) -> anyhow::Result<()> {
    tracing::info!("Starting registrar server on port {}", port);

    let db = db::Database::open_default()?;
    db.migrate()?;

    let security = SecurityConfig::from_env();
    if security.admin_key.is_none() {
        tracing::warn!("No admin key configured; administrator routes are open");
    }
    let app = api::create_router_with_config(db, security);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("Registrar server listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Some(Commands::Serve { port }) => serve(port).await?,
        Some(Commands::Parse { schedule }) => {
            let meetings = engine::parse_schedule(&schedule);
            if meetings.is_empty() {
                println!("No meetings: \"{}\" is not a valid schedule", schedule);
            }
            for meeting in &meetings {
                println!("{}", meeting);
            }
            if let Some(first) = meetings.first() {
                let days: Vec<engine::Day> = meetings.iter().map(|m| m.day).collect();
                if let Some(normalized) =
                    engine::format_schedule(&days, first.start_minute, first.end_minute)
                {
                    println!("Normalized: {}", normalized);
                }
            }
        }
        Some(Commands::Conflicts) => {
            let client = RegistrarClient::from_env();
            let scan = client.list_conflicts().await?;
            println!(
                "{} conflict(s): {} high, {} medium, {} low",
                scan.total, scan.high, scan.medium, scan.low
            );
            print!("{}", render::render_conflicts(&scan.conflicts));
        }
        Some(Commands::Schedule { student_id }) => {
            let client = RegistrarClient::from_env();
            let student = client.get_student(student_id).await?;
            let week = client.student_schedule(student_id).await?;
            println!("{} ({})", student.name, student.email);
            print!("{}", render::render_week(&week));
        }
        Some(Commands::Status) => {
            let client = RegistrarClient::from_env();
            match client.health().await {
                Ok(_) => println!("Registrar server is running at {}", client.base_url()),
                Err(e) => println!("Registrar server is not reachable at {}: {}", client.base_url(), e),
            }
        }
        None => serve(3000).await?,
    }

    Ok(())
}
