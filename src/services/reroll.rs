// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reroll policy: weekly credit replenishment and credit consumption.
//!
//! A reroll trades one credit for an immediate out-of-cycle phrase
//! selection. Consuming a credit does not advance `updatedPhraseDate`,
//! so the regular midnight rollover still happens afterwards.

use crate::db::FirestoreDb;
use crate::error::Result;
use crate::models::{PhraseSelection, User};
use crate::services::catalog::{letter_variants, PhraseCatalog};
use crate::services::selection::SelectionStore;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Result of a reroll consumption attempt.
#[derive(Debug)]
pub enum RerollOutcome {
    /// No credits available; the record is unchanged.
    Rejected,
    /// Credit consumed and a new phrase selected.
    Applied {
        user: User,
        selection: PhraseSelection,
        persisted: bool,
    },
}

impl RerollOutcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, RerollOutcome::Rejected)
    }
}

/// Whether a weekly reroll credit is due at `now`.
pub fn weekly_grant_due(reroll_date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now >= reroll_date + Duration::days(7)
}

/// Decision logic for reroll credits.
pub struct RerollPolicy {
    db: FirestoreDb,
    catalog: Arc<PhraseCatalog>,
    selections: Arc<SelectionStore>,
}

impl RerollPolicy {
    pub fn new(
        db: FirestoreDb,
        catalog: Arc<PhraseCatalog>,
        selections: Arc<SelectionStore>,
    ) -> Self {
        Self {
            db,
            catalog,
            selections,
        }
    }

    /// Grant one reroll credit if a full week has passed since the last
    /// grant. Idempotent within the window: a second call before the next
    /// week boundary is a no-op.
    ///
    /// Returns the record and whether a credit was granted.
    pub async fn check_weekly_grant(
        &self,
        mut user: User,
        now: DateTime<Utc>,
    ) -> Result<(User, bool)> {
        if !weekly_grant_due(user.reroll_date, now) {
            return Ok((user, false));
        }

        user.rerolls += 1;
        user.reroll_date = now;

        if let Err(e) = self.db.update_reroll_grant(&user).await {
            tracing::warn!(
                user_id = %user.id,
                error = %e,
                "Failed to persist reroll grant, keeping local state"
            );
        } else {
            tracing::info!(user_id = %user.id, rerolls = user.rerolls, "Weekly reroll granted");
        }

        Ok((user, true))
    }

    /// Consume one reroll credit for an immediate new phrase.
    ///
    /// Rejected when no credits remain; the record is left untouched.
    pub async fn consume_reroll(&self, mut user: User) -> Result<RerollOutcome> {
        if user.rerolls == 0 {
            return Ok(RerollOutcome::Rejected);
        }

        user.rerolls -= 1;
        user.done = false;

        // Out-of-cycle selection: the once-per-day guard does not apply.
        // The RNG is thread-local and must not live across the await below.
        let selection = {
            let mut rng = rand::thread_rng();
            let phrase_index = self
                .catalog
                .choose_index(&user.phrases, &mut rng)
                .unwrap_or(0);
            let phrase = self.catalog.get(phrase_index).unwrap_or_default();
            PhraseSelection {
                phrase_index,
                letter_variants: letter_variants(phrase, &mut rng),
            }
        };
        self.selections.put(&user.id, selection.clone());

        let persisted = match self.db.update_daily_state(&user).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    user_id = %user.id,
                    error = %e,
                    "Failed to persist reroll, keeping local state"
                );
                false
            }
        };

        Ok(RerollOutcome::Applied {
            user,
            selection,
            persisted,
        })
    }
}
