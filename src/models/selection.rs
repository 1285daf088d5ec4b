//! Phrase-selection artifacts shared between the app and its widget.

use serde::{Deserialize, Serialize};

/// The currently selected daily phrase for one user.
///
/// `letter_variants` holds one value in `{1,2,3}` per alphanumeric
/// character of the phrase, picking between hand-drawn glyph variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhraseSelection {
    pub phrase_index: u32,
    pub letter_variants: Vec<u8>,
}
