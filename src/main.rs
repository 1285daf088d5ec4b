// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Yes API Server
//!
//! Serves the daily phrase state machine for the Yes mobile client and
//! runs the hourly midnight scan that triggers silent refresh pushes.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use yes_api::{
    config::Config,
    db::FirestoreDb,
    services::{
        DailyUpdateEngine, FcmClient, MidnightScanner, PhraseCatalog, RerollPolicy,
        SelectionStore, SessionRegistry,
    },
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Yes API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    // Load the phrase catalog
    tracing::info!(path = %config.phrases_path, "Loading phrase catalog");
    let catalog = Arc::new(
        PhraseCatalog::load_from_file(&config.phrases_path)
            .expect("Failed to load phrase catalog"),
    );
    tracing::info!(count = catalog.len(), "Phrase catalog loaded");

    // Initialize the FCM push client
    let fcm = FcmClient::new(&config.gcp_project_id)
        .await
        .expect("Failed to initialize FCM client");
    tracing::info!(project = %config.gcp_project_id, "FCM client initialized");

    // Per-instance caches for today's selections and session watchers
    let selections = Arc::new(SelectionStore::new());
    let sessions = Arc::new(SessionRegistry::new());

    let engine = DailyUpdateEngine::new(
        db.clone(),
        catalog.clone(),
        selections.clone(),
        config.streak_increment_on_rollover,
    );
    let reroll = RerollPolicy::new(db.clone(), catalog.clone(), selections.clone());
    let scanner = MidnightScanner::new(db.clone(), fcm);

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        catalog,
        selections,
        sessions,
        engine,
        reroll,
        scanner,
    });

    // Build router
    let app = yes_api::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("yes_api=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
