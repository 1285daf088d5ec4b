// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Phrase catalog loading and daily selection.

use rand::seq::SliceRandom;
use rand::Rng;
use std::fs;
use std::path::Path;

/// The fixed, ordered list of candidate daily phrases.
///
/// Loaded once at startup and immutable for the process lifetime.
#[derive(Default, Clone)]
pub struct PhraseCatalog {
    phrases: Vec<String>,
}

impl PhraseCatalog {
    /// Load the catalog from a JSON file (an array of strings).
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let json_data =
            fs::read_to_string(path.as_ref()).map_err(|e| CatalogError::IoError(e.to_string()))?;
        Self::load_from_json(&json_data)
    }

    /// Load the catalog from a JSON string.
    pub fn load_from_json(json_data: &str) -> Result<Self, CatalogError> {
        let phrases: Vec<String> = serde_json::from_str(json_data)
            .map_err(|e| CatalogError::ParseError(e.to_string()))?;

        if phrases.is_empty() {
            return Err(CatalogError::Empty);
        }

        tracing::info!(count = phrases.len(), "Loaded phrase catalog");
        Ok(Self { phrases })
    }

    /// Build a catalog from an in-memory list (tests and benches).
    pub fn from_phrases(phrases: Vec<String>) -> Self {
        Self { phrases }
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    /// Get the phrase at a catalog index.
    pub fn get(&self, index: u32) -> Option<&str> {
        self.phrases.get(index as usize).map(String::as_str)
    }

    /// Pick a phrase index uniformly from the indices not in `used`.
    ///
    /// When every index has been used the history "resets": the choice is
    /// uniform over the full catalog instead. Returns `None` only for an
    /// empty catalog.
    pub fn choose_index<R: Rng + ?Sized>(&self, used: &[u32], rng: &mut R) -> Option<u32> {
        if self.phrases.is_empty() {
            return None;
        }

        let available: Vec<u32> = (0..self.phrases.len() as u32)
            .filter(|i| !used.contains(i))
            .collect();

        if available.is_empty() {
            Some(rng.gen_range(0..self.phrases.len() as u32))
        } else {
            available.choose(rng).copied()
        }
    }
}

/// Generate glyph variants for a phrase: one value in `{1,2,3}` per
/// alphanumeric character of the lowercased phrase, in order, skipping
/// punctuation and whitespace.
pub fn letter_variants<R: Rng + ?Sized>(phrase: &str, rng: &mut R) -> Vec<u8> {
    phrase
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .map(|_| rng.gen_range(1..=3))
        .collect()
}

/// Errors from catalog operations.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read file: {0}")]
    IoError(String),

    #[error("Failed to parse catalog JSON: {0}")]
    ParseError(String),

    #[error("Catalog contains no phrases")]
    Empty,
}
