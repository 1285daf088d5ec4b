//! User record stored in Firestore.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One document per authenticated identity in the `users` collection.
///
/// Field names match what the mobile client writes (`fullName`,
/// `rerollDate`, ...), so this struct serializes as camelCase. Date fields
/// are Firestore timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Document ID; never written back as a field.
    #[serde(alias = "_firestore_id", default, skip_serializing)]
    pub id: String,
    /// Display name
    #[serde(default)]
    pub full_name: Option<String>,
    /// Consecutive-day completion counter
    pub streak: u32,
    /// Catalog indices of phrases the user has completed (append-only;
    /// the last element is popped when "done" is un-toggled)
    pub phrases: Vec<u32>,
    /// Remaining free reroll credits
    pub rerolls: u32,
    /// When the last reroll credit was granted
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub reroll_date: DateTime<Utc>,
    /// Last day the user was credited with a completed streak day
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub last_sign_in: DateTime<Utc>,
    /// Whether today's phrase has been marked complete
    pub done: bool,
    /// FCM push address. The client stores `""` when unset.
    #[serde(default)]
    pub fcm_token: Option<String>,
    /// IANA timezone name, refreshed at login. The client stores `""` when unset.
    #[serde(default)]
    pub timezone: Option<String>,
    /// When a daily phrase was last selected for this user
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub updated_phrase_date: DateTime<Utc>,
    /// Local calendar-day key (`YYYY-MM-DD`) of the last silent refresh
    /// push, so overlapping scanner runs never double-send
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_refresh_push_date: Option<String>,
}

impl User {
    /// Whether the record carries a usable push token and timezone.
    ///
    /// Empty strings count as missing (see the client's `""` convention).
    pub fn has_push_credentials(&self) -> bool {
        let has = |f: &Option<String>| f.as_deref().is_some_and(|v| !v.is_empty());
        has(&self.fcm_token) && has(&self.timezone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_user() -> User {
        User {
            id: "uid-1".to_string(),
            full_name: Some("Test User".to_string()),
            streak: 1,
            phrases: vec![],
            rerolls: 0,
            reroll_date: Utc::now(),
            last_sign_in: Utc::now(),
            done: false,
            fcm_token: None,
            timezone: None,
            updated_phrase_date: Utc::now(),
            last_refresh_push_date: None,
        }
    }

    #[test]
    fn empty_strings_are_not_credentials() {
        let mut user = base_user();
        assert!(!user.has_push_credentials());

        user.fcm_token = Some("".to_string());
        user.timezone = Some("".to_string());
        assert!(!user.has_push_credentials());

        user.fcm_token = Some("token-abc".to_string());
        assert!(!user.has_push_credentials());

        user.timezone = Some("UTC".to_string());
        assert!(user.has_push_credentials());
    }
}
