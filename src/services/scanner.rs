// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Midnight push scanner.
//!
//! Runs once per hour (Cloud Scheduler): reads every user record and sends
//! a silent refresh push to exactly the users for whom it is currently
//! local midnight. Per-user failures are isolated; one bad token never
//! aborts the scan. A per-(user, local day) key recorded in the store
//! keeps overlapping runs from double-sending.

use crate::db::FirestoreDb;
use crate::error::Result;
use crate::models::User;
use crate::services::push::FcmClient;
use crate::time_utils::{local_date_key, local_hour, resolve_tz};
use chrono::{DateTime, Utc};
use futures_util::{stream, StreamExt};
use serde::Serialize;

const MAX_CONCURRENT_DISPATCHES: usize = 25;

/// Aggregate result of one scanner run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ScanOutcome {
    /// Total records examined.
    pub scanned: u32,
    /// Silent pushes dispatched.
    pub dispatched: u32,
    /// Users without a usable token or timezone (skip, not an error).
    pub skipped_missing_credentials: u32,
    /// Users not currently at local hour 0.
    pub skipped_not_midnight: u32,
    /// Users already served today (idempotency key matched).
    pub skipped_already_pushed: u32,
    /// Dispatch attempts that failed.
    pub failed: u32,
}

impl ScanOutcome {
    /// No dispatch failures occurred.
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

enum DispatchDecision {
    Dispatch { date_key: String },
    MissingCredentials,
    NotMidnight,
    AlreadyPushed,
}

enum DispatchResult {
    Dispatched,
    SkippedMissingCredentials,
    SkippedNotMidnight,
    SkippedAlreadyPushed,
    Failed,
}

/// Classify a record for the current scan instant.
fn decide(user: &User, now: DateTime<Utc>) -> DispatchDecision {
    if !user.has_push_credentials() {
        return DispatchDecision::MissingCredentials;
    }

    let tz = resolve_tz(user.timezone.as_deref());
    if local_hour(now, tz) != 0 {
        return DispatchDecision::NotMidnight;
    }

    let date_key = local_date_key(now, tz);
    if user.last_refresh_push_date.as_deref() == Some(date_key.as_str()) {
        return DispatchDecision::AlreadyPushed;
    }

    DispatchDecision::Dispatch { date_key }
}

/// The hourly scan over all user records.
pub struct MidnightScanner {
    db: FirestoreDb,
    fcm: FcmClient,
}

impl MidnightScanner {
    pub fn new(db: FirestoreDb, fcm: FcmClient) -> Self {
        Self { db, fcm }
    }

    /// The push client (mock introspection in tests).
    pub fn fcm(&self) -> &FcmClient {
        &self.fcm
    }

    /// Run a full scan at instant `now`.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<ScanOutcome> {
        let users = self.db.list_users().await?;
        tracing::info!(count = users.len(), "Running midnight push scan");
        Ok(self.dispatch_all(users, now).await)
    }

    /// Evaluate and dispatch for a given set of records.
    ///
    /// Per-user evaluation is independent; dispatches run with bounded
    /// concurrency and individual failures only increment `failed`.
    pub async fn dispatch_all(&self, users: Vec<User>, now: DateTime<Utc>) -> ScanOutcome {
        let mut outcome = ScanOutcome {
            scanned: users.len() as u32,
            ..ScanOutcome::default()
        };

        let results: Vec<DispatchResult> = stream::iter(users)
            .map(|user| async move { self.dispatch_one(user, now).await })
            .buffer_unordered(MAX_CONCURRENT_DISPATCHES)
            .collect()
            .await;

        for result in results {
            match result {
                DispatchResult::Dispatched => outcome.dispatched += 1,
                DispatchResult::SkippedMissingCredentials => {
                    outcome.skipped_missing_credentials += 1
                }
                DispatchResult::SkippedNotMidnight => outcome.skipped_not_midnight += 1,
                DispatchResult::SkippedAlreadyPushed => outcome.skipped_already_pushed += 1,
                DispatchResult::Failed => outcome.failed += 1,
            }
        }

        tracing::info!(
            scanned = outcome.scanned,
            dispatched = outcome.dispatched,
            failed = outcome.failed,
            "Midnight push scan complete"
        );

        outcome
    }

    async fn dispatch_one(&self, mut user: User, now: DateTime<Utc>) -> DispatchResult {
        let date_key = match decide(&user, now) {
            DispatchDecision::MissingCredentials => {
                tracing::debug!(user_id = %user.id, "Skipping: missing token or timezone");
                return DispatchResult::SkippedMissingCredentials;
            }
            DispatchDecision::NotMidnight => return DispatchResult::SkippedNotMidnight,
            DispatchDecision::AlreadyPushed => {
                tracing::debug!(user_id = %user.id, "Skipping: already pushed today");
                return DispatchResult::SkippedAlreadyPushed;
            }
            DispatchDecision::Dispatch { date_key } => date_key,
        };

        let token = user.fcm_token.clone().unwrap_or_default();
        match self.fcm.send_daily_refresh(&token).await {
            Ok(()) => {
                tracing::info!(user_id = %user.id, "Sent silent refresh push");

                // Record the idempotency key so an overlapping run skips
                // this user. A failed mark is only a warning: the worst
                // case is one duplicate silent push.
                user.last_refresh_push_date = Some(date_key);
                if let Err(e) = self.db.mark_refresh_pushed(&user).await {
                    tracing::warn!(
                        user_id = %user.id,
                        error = %e,
                        "Failed to record refresh-push date"
                    );
                }
                DispatchResult::Dispatched
            }
            Err(e) => {
                tracing::error!(user_id = %user.id, error = %e, "Failed to send refresh push");
                DispatchResult::Failed
            }
        }
    }
}
