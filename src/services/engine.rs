// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Daily update engine.
//!
//! Decides, once per local calendar day per user:
//! 1. whether the streak must roll over (a skipped day breaks the chain),
//! 2. whether a new phrase must be selected,
//! and performs the selection and persistence.
//!
//! Persistence is optimistic: the engine computes the next state, attempts
//! the write, and on failure keeps the in-memory state while reporting the
//! write as not persisted. The client surfaces the error and may retry;
//! local state is authoritative until the store catches up.

use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::models::{PhraseSelection, User};
use crate::services::catalog::{letter_variants, PhraseCatalog};
use crate::services::selection::SelectionStore;
use crate::time_utils::{is_local_yesterday, resolve_tz, same_local_day};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::sync::Arc;

/// Result of a daily evaluation.
#[derive(Debug)]
pub struct EvaluateOutcome {
    /// Record after the evaluation (authoritative even when not persisted).
    pub user: User,
    /// Today's selection (fresh or reused from the cache).
    pub selection: PhraseSelection,
    /// Whether a new phrase was selected by this call.
    pub selection_changed: bool,
    /// Whether the store reflects `user`. `false` means the write failed
    /// and the caller should surface a retryable, non-fatal error.
    pub persisted: bool,
}

/// Result of toggling the "done" flag.
#[derive(Debug)]
pub struct ToggleOutcome {
    pub user: User,
    pub persisted: bool,
}

/// The once-per-day phrase/streak state machine.
pub struct DailyUpdateEngine {
    db: FirestoreDb,
    catalog: Arc<PhraseCatalog>,
    selections: Arc<SelectionStore>,
    increment_streak_on_rollover: bool,
}

impl DailyUpdateEngine {
    pub fn new(
        db: FirestoreDb,
        catalog: Arc<PhraseCatalog>,
        selections: Arc<SelectionStore>,
        increment_streak_on_rollover: bool,
    ) -> Self {
        Self {
            db,
            catalog,
            selections,
            increment_streak_on_rollover,
        }
    }

    /// Run the daily evaluation for a record at instant `now`.
    ///
    /// If the record was already rolled over today this reuses the cached
    /// selection and leaves `updatedPhraseDate` untouched. Otherwise it
    /// clears `done`, selects a new phrase and commits the rollover with a
    /// conditional write so concurrent evaluations cannot double-select.
    pub async fn evaluate(&self, mut user: User, now: DateTime<Utc>) -> Result<EvaluateOutcome> {
        let tz = resolve_tz(user.timezone.as_deref());
        let streak_changed =
            apply_streak_rollover(&mut user, now, tz, self.increment_streak_on_rollover);

        if same_local_day(user.updated_phrase_date, now, tz) {
            // Already updated today: reuse the cached selection.
            let selection = self.current_selection(&user);
            let mut persisted = true;
            if streak_changed {
                if let Err(e) = self.db.update_daily_state(&user).await {
                    tracing::warn!(
                        user_id = %user.id,
                        error = %e,
                        "Failed to persist streak rollover, keeping local state"
                    );
                    persisted = false;
                }
            }
            return Ok(EvaluateOutcome {
                user,
                selection,
                selection_changed: false,
                persisted,
            });
        }

        // New local day: clear the done flag and select a new phrase.
        let previous_update = user.updated_phrase_date;
        user.done = false;
        let selection = self.select_new(&user);
        user.updated_phrase_date = now;

        match self.db.commit_rollover(&user, previous_update).await {
            Ok(true) => {
                self.selections.put(&user.id, selection.clone());
                tracing::info!(
                    user_id = %user.id,
                    phrase_index = selection.phrase_index,
                    "Daily rollover committed"
                );
                Ok(EvaluateOutcome {
                    user,
                    selection,
                    selection_changed: true,
                    persisted: true,
                })
            }
            Ok(false) => {
                // A concurrent evaluation won the rollover; adopt its state.
                let stored = self
                    .db
                    .get_user(&user.id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.id)))?;
                let selection = self.current_selection(&stored);
                Ok(EvaluateOutcome {
                    user: stored,
                    selection,
                    selection_changed: false,
                    persisted: true,
                })
            }
            Err(e) => {
                tracing::warn!(
                    user_id = %user.id,
                    error = %e,
                    "Failed to persist rollover, keeping local state"
                );
                self.selections.put(&user.id, selection.clone());
                Ok(EvaluateOutcome {
                    user,
                    selection,
                    selection_changed: true,
                    persisted: false,
                })
            }
        }
    }

    /// Flip the "done" flag: the only path that moves the streak upward.
    ///
    /// Toggling on credits the streak day and appends the current phrase
    /// index; toggling off undoes both. A double toggle is an exact round
    /// trip by design.
    pub async fn toggle_done(&self, mut user: User, now: DateTime<Utc>) -> Result<ToggleOutcome> {
        let selection = self.current_selection(&user);
        let index = selection.phrase_index;

        user.done = !user.done;
        if user.done {
            user.streak += 1;
            user.last_sign_in = now;
            if user.phrases.last() != Some(&index) {
                user.phrases.push(index);
            }
        } else {
            user.streak = user.streak.saturating_sub(1).max(1);
            user.last_sign_in = now - chrono::Duration::days(1);
            if user.phrases.last() == Some(&index) {
                user.phrases.pop();
            }
        }

        let persisted = match self.db.update_daily_state(&user).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    user_id = %user.id,
                    error = %e,
                    "Failed to persist done toggle, keeping local state"
                );
                false
            }
        };

        Ok(ToggleOutcome { user, persisted })
    }

    /// Today's selection for a record, deriving and caching one if the
    /// process has none (e.g. after a cold start).
    ///
    /// When the record is already marked done, today's index is by
    /// construction the last history entry; it must be reconstructed from
    /// there, not re-derived, or a later toggle-off would fail to pop it.
    pub fn current_selection(&self, user: &User) -> PhraseSelection {
        if let Some(selection) = self.selections.get(&user.id) {
            return selection;
        }
        let selection = match user.phrases.last() {
            Some(&index) if user.done => {
                let mut rng = rand::thread_rng();
                let phrase = self.catalog.get(index).unwrap_or_default();
                PhraseSelection {
                    phrase_index: index,
                    letter_variants: letter_variants(phrase, &mut rng),
                }
            }
            _ => self.select_new(user),
        };
        self.selections.put(&user.id, selection.clone());
        selection
    }

    /// Select a new phrase for a record, bypassing the once-per-day guard.
    ///
    /// Used by the rollover and by reroll consumption.
    pub fn select_new(&self, user: &User) -> PhraseSelection {
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
    }

    /// Store a freshly made selection in the cache.
    pub fn store_selection(&self, user_id: &str, selection: PhraseSelection) {
        self.selections.put(user_id, selection);
    }
}

/// Apply the streak part of the daily rollover in place.
///
/// A sign-in gap of more than one local day resets the streak to 1. A
/// gap of exactly one day leaves the increment to the explicit done
/// toggle, unless the compatibility flag asks for increment-on-rollover.
/// Returns whether the record changed.
pub fn apply_streak_rollover(
    user: &mut User,
    now: DateTime<Utc>,
    tz: Tz,
    increment_on_rollover: bool,
) -> bool {
    if same_local_day(user.last_sign_in, now, tz) {
        return false;
    }

    if is_local_yesterday(user.last_sign_in, now, tz) {
        if increment_on_rollover {
            user.streak += 1;
            user.last_sign_in = now;
            return true;
        }
        return false;
    }

    // Missed at least one day: the chain is broken.
    let changed = user.streak != 1;
    user.streak = 1;
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, 0, 0).unwrap()
    }

    fn user_at(last_sign_in: DateTime<Utc>, updated: DateTime<Utc>) -> User {
        User {
            id: "u1".to_string(),
            full_name: None,
            streak: 4,
            phrases: vec![0, 1],
            rerolls: 1,
            reroll_date: utc(2025, 6, 1, 0),
            last_sign_in,
            done: false,
            fcm_token: None,
            timezone: None,
            updated_phrase_date: updated,
            last_refresh_push_date: None,
        }
    }

    fn engine_with(phrases: &[&str]) -> DailyUpdateEngine {
        let catalog = Arc::new(PhraseCatalog::from_phrases(
            phrases.iter().map(|s| s.to_string()).collect(),
        ));
        DailyUpdateEngine::new(
            FirestoreDb::new_mock(),
            catalog,
            Arc::new(SelectionStore::new()),
            false,
        )
    }

    // ─── Streak rollover (pure) ──────────────────────────────────

    #[test]
    fn same_day_signin_is_a_noop() {
        let now = utc(2025, 6, 10, 18);
        let mut user = user_at(utc(2025, 6, 10, 8), now);
        assert!(!apply_streak_rollover(&mut user, now, Tz::UTC, false));
        assert_eq!(user.streak, 4);
    }

    #[test]
    fn yesterday_signin_defers_increment_to_toggle() {
        let now = utc(2025, 6, 10, 8);
        let mut user = user_at(utc(2025, 6, 9, 20), now);
        assert!(!apply_streak_rollover(&mut user, now, Tz::UTC, false));
        assert_eq!(user.streak, 4);
    }

    #[test]
    fn yesterday_signin_increments_under_compat_flag() {
        let now = utc(2025, 6, 10, 8);
        let mut user = user_at(utc(2025, 6, 9, 20), now);
        assert!(apply_streak_rollover(&mut user, now, Tz::UTC, true));
        assert_eq!(user.streak, 5);
        assert_eq!(user.last_sign_in, now);
    }

    #[test]
    fn missed_day_resets_streak() {
        let now = utc(2025, 6, 10, 8);
        let mut user = user_at(utc(2025, 6, 7, 20), now);
        assert!(apply_streak_rollover(&mut user, now, Tz::UTC, false));
        assert_eq!(user.streak, 1);
    }

    #[test]
    fn rollover_respects_user_timezone() {
        // 2025-06-10 05:00 UTC is still June 9 in Los Angeles: no reset.
        let now = utc(2025, 6, 10, 5);
        let mut user = user_at(utc(2025, 6, 9, 20), now);
        assert!(!apply_streak_rollover(
            &mut user,
            now,
            chrono_tz::America::Los_Angeles,
            false
        ));
        assert_eq!(user.streak, 4);
    }

    // ─── Evaluate (optimistic persistence against the mock db) ───

    #[tokio::test]
    async fn already_today_reuses_cached_selection() {
        let engine = engine_with(&["a", "b", "c"]);
        let now = utc(2025, 6, 10, 18);
        let user = user_at(utc(2025, 6, 10, 8), utc(2025, 6, 10, 8));

        let cached = PhraseSelection {
            phrase_index: 2,
            letter_variants: vec![1],
        };
        engine.store_selection("u1", cached.clone());

        let outcome = engine.evaluate(user, now).await.unwrap();

        assert!(!outcome.selection_changed);
        assert!(outcome.persisted);
        assert_eq!(outcome.selection, cached);
        assert_eq!(outcome.user.updated_phrase_date, utc(2025, 6, 10, 8));
    }

    #[tokio::test]
    async fn new_day_selects_unused_and_clears_done() {
        let engine = engine_with(&["a", "b", "c"]);
        let now = utc(2025, 6, 10, 0);
        let mut user = user_at(utc(2025, 6, 9, 8), utc(2025, 6, 9, 8));
        user.done = true;

        let outcome = engine.evaluate(user, now).await.unwrap();

        assert!(outcome.selection_changed);
        // Mock db: the write fails, local state is kept.
        assert!(!outcome.persisted);
        assert!(!outcome.user.done);
        assert_eq!(outcome.user.updated_phrase_date, now);
        // phrases = [0, 1], so index 2 is the only candidate.
        assert_eq!(outcome.selection.phrase_index, 2);
        assert_eq!(outcome.selection.letter_variants.len(), 1);
    }

    #[tokio::test]
    async fn exhausted_catalog_falls_back_to_full_range() {
        let engine = engine_with(&["a", "b"]);
        let now = utc(2025, 6, 10, 0);
        let user = user_at(utc(2025, 6, 9, 8), utc(2025, 6, 9, 8));

        let outcome = engine.evaluate(user, now).await.unwrap();

        assert!(outcome.selection_changed);
        assert!(outcome.selection.phrase_index < 2);
    }

    // ─── Toggle done ─────────────────────────────────────────────

    #[tokio::test]
    async fn toggle_on_credits_the_day() {
        let engine = engine_with(&["a", "b", "c"]);
        let now = utc(2025, 6, 10, 9);
        let user = user_at(now - chrono::Duration::days(1), now);
        engine.store_selection(
            "u1",
            PhraseSelection {
                phrase_index: 2,
                letter_variants: vec![1],
            },
        );

        let outcome = engine.toggle_done(user, now).await.unwrap();

        assert!(outcome.user.done);
        assert_eq!(outcome.user.streak, 5);
        assert_eq!(outcome.user.last_sign_in, now);
        assert_eq!(outcome.user.phrases, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn double_toggle_is_an_exact_round_trip() {
        let engine = engine_with(&["a", "b", "c"]);
        let now = utc(2025, 6, 10, 9);
        let original = user_at(now - chrono::Duration::days(1), now);
        engine.store_selection(
            "u1",
            PhraseSelection {
                phrase_index: 2,
                letter_variants: vec![1],
            },
        );

        let once = engine.toggle_done(original.clone(), now).await.unwrap();
        let twice = engine.toggle_done(once.user, now).await.unwrap();

        assert_eq!(twice.user.streak, original.streak);
        assert_eq!(twice.user.last_sign_in, original.last_sign_in);
        assert_eq!(twice.user.phrases, original.phrases);
        assert!(!twice.user.done);
    }

    #[test]
    fn cold_cache_selection_for_done_record_comes_from_history() {
        let engine = engine_with(&["a", "b", "c"]);
        let mut user = user_at(utc(2025, 6, 10, 8), utc(2025, 6, 10, 8));
        user.done = true;
        user.phrases = vec![0, 2];

        let selection = engine.current_selection(&user);

        assert_eq!(selection.phrase_index, 2);
        // "c" has one alphanumeric character.
        assert_eq!(selection.letter_variants.len(), 1);
    }

    #[tokio::test]
    async fn cold_cache_toggle_off_pops_the_last_phrase() {
        // Fresh SelectionStore, as after a process restart.
        let engine = engine_with(&["a", "b", "c"]);
        let now = utc(2025, 6, 10, 9);
        let mut user = user_at(now, now);
        user.done = true;
        user.streak = 2;
        user.phrases = vec![0, 2];

        let outcome = engine.toggle_done(user, now).await.unwrap();

        assert!(!outcome.user.done);
        assert_eq!(outcome.user.phrases, vec![0]);
        assert_eq!(outcome.user.streak, 1);
    }

    #[tokio::test]
    async fn toggle_off_never_drops_streak_below_one() {
        let engine = engine_with(&["a", "b", "c"]);
        let now = utc(2025, 6, 10, 9);
        let mut user = user_at(now, now);
        user.streak = 1;
        user.done = true;
        user.phrases = vec![2];
        engine.store_selection(
            "u1",
            PhraseSelection {
                phrase_index: 2,
                letter_variants: vec![1],
            },
        );

        let outcome = engine.toggle_done(user, now).await.unwrap();

        assert!(!outcome.user.done);
        assert_eq!(outcome.user.streak, 1);
        assert!(outcome.user.phrases.is_empty());
    }
}
