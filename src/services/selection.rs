// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process store for each user's current phrase selection.
//!
//! The server-side counterpart of the app-group cache the client shares
//! with its widget: written whenever a selection is made, readable without
//! re-deriving it. Entries survive for the process lifetime only; a cold
//! start re-derives the selection from the user record on first read.

use crate::models::PhraseSelection;
use dashmap::DashMap;

/// Per-user selection cache.
#[derive(Default)]
pub struct SelectionStore {
    entries: DashMap<String, PhraseSelection>,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, user_id: &str) -> Option<PhraseSelection> {
        self.entries.get(user_id).map(|e| e.clone())
    }

    pub fn put(&self, user_id: &str, selection: PhraseSelection) {
        self.entries.insert(user_id.to_string(), selection);
    }

    pub fn remove(&self, user_id: &str) {
        self.entries.remove(user_id);
    }
}
