// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use chrono::{Duration, Utc};
use std::sync::Arc;
use yes_api::config::Config;
use yes_api::db::FirestoreDb;
use yes_api::models::User;
use yes_api::routes::create_router;
use yes_api::services::{
    DailyUpdateEngine, FcmClient, MidnightScanner, PhraseCatalog, RerollPolicy, SelectionStore,
    SessionRegistry,
};
use yes_api::AppState;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Small in-memory catalog used across tests.
#[allow(dead_code)]
pub fn test_catalog() -> Arc<PhraseCatalog> {
    Arc::new(PhraseCatalog::from_phrases(vec![
        "yes you can".to_string(),
        "keep showing up".to_string(),
        "one step at a time".to_string(),
        "trust the process".to_string(),
    ]))
}

/// A user record in a plausible steady state: signed in yesterday,
/// phrase dated yesterday, not yet done today.
#[allow(dead_code)]
pub fn test_user(id: &str) -> User {
    let now = Utc::now();
    User {
        id: id.to_string(),
        full_name: Some("Test User".to_string()),
        streak: 3,
        phrases: vec![0],
        rerolls: 1,
        reroll_date: now - Duration::days(2),
        last_sign_in: now - Duration::days(1),
        updated_phrase_date: now - Duration::days(1),
        done: false,
        fcm_token: Some("token-abc".to_string()),
        timezone: Some("America/Los_Angeles".to_string()),
        last_refresh_push_date: None,
    }
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let db = test_db_offline();
    let catalog = test_catalog();
    let selections = Arc::new(SelectionStore::new());
    let sessions = Arc::new(SessionRegistry::new());

    let engine = DailyUpdateEngine::new(
        db.clone(),
        catalog.clone(),
        selections.clone(),
        config.streak_increment_on_rollover,
    );
    let reroll = RerollPolicy::new(db.clone(), catalog.clone(), selections.clone());
    let scanner = MidnightScanner::new(db.clone(), FcmClient::new_mock());

    let state = Arc::new(AppState {
        config,
        db,
        catalog,
        selections,
        sessions,
        engine,
        reroll,
        scanner,
    });

    (create_router(state.clone()), state)
}
