// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Yes API: daily motivational phrase backend
//!
//! This crate provides the backend for the Yes mobile client: the daily
//! phrase/streak state machine, reroll credits, and the hourly scanner
//! that sends silent refresh pushes at each user's local midnight.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{
    DailyUpdateEngine, MidnightScanner, PhraseCatalog, RerollPolicy, SelectionStore,
    SessionRegistry,
};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub catalog: Arc<PhraseCatalog>,
    pub selections: Arc<SelectionStore>,
    pub sessions: Arc<SessionRegistry>,
    pub engine: DailyUpdateEngine,
    pub reroll: RerollPolicy,
    pub scanner: MidnightScanner,
}
