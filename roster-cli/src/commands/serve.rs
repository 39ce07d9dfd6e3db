//! HTTP server command
//!
//! Builds the store handles once, then hands them to the server.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, warn};

use roster_server::server::DEFAULT_PORT;
use roster_server::{run_server, AppState, CorsPolicy, ServerConfig};
use roster_store::{
    FirestoreClient, FirestoreSettings, MemoryStore, SharedStore, PROBE_COLLECTION,
    STUDENTS_COLLECTION,
};

/// Backing store for records
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// Google Cloud Firestore (FIREBASE_* credentials or FIRESTORE_EMULATOR_HOST)
    Firestore,
    /// Process-local map; everything is lost on exit
    Memory,
}

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Interface to bind to
    #[arg(long, env = "ROSTER_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(long, short = 'p', env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Record store backend
    #[arg(long, value_enum, default_value_t = StoreKind::Firestore)]
    pub store: StoreKind,

    /// Collection holding student records
    #[arg(long, default_value = STUDENTS_COLLECTION)]
    pub collection: String,

    /// Collection counted by GET /test
    #[arg(long, default_value = PROBE_COLLECTION)]
    pub probe_collection: String,

    /// Allowed CORS origin (repeatable; default allows any origin)
    #[arg(long = "cors-origin", value_name = "URL")]
    pub cors_origins: Vec<String>,
}

/// Open the student and probe collections on the selected backend
fn open_stores(args: &ServeArgs) -> Result<(SharedStore, SharedStore)> {
    match args.store {
        StoreKind::Firestore => {
            let settings = FirestoreSettings::from_env().context(
                "Firestore settings incomplete. Set FIREBASE_PROJECT_ID, FIREBASE_CLIENT_EMAIL \
                 and FIREBASE_PRIVATE_KEY via environment, ./.env or ~/.roster/.env",
            )?;
            info!(project = %settings.project_id, "Connecting to Firestore");

            let client =
                FirestoreClient::new(settings).context("Failed to create Firestore client")?;
            let students: SharedStore = Arc::new(client.collection(args.collection.as_str()));
            let probe: SharedStore = Arc::new(client.collection(args.probe_collection.as_str()));
            Ok((students, probe))
        }
        StoreKind::Memory => {
            warn!("Using in-memory store - records are lost on exit");
            let store = MemoryStore::new();
            let students: SharedStore = Arc::new(store.collection(args.collection.as_str()));
            let probe: SharedStore = Arc::new(store.collection(args.probe_collection.as_str()));
            Ok((students, probe))
        }
    }
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let (students, probe) = open_stores(&args)?;

    let config = ServerConfig {
        bind_addr: SocketAddr::new(args.host, args.port),
        cors: CorsPolicy::from_origins(&args.cors_origins)?,
    };

    info!("Starting roster server on {}", config.bind_addr);

    run_server(AppState::new(students, probe), config)
        .await
        .context("Server error")?;

    Ok(())
}
