// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User session registry with a subscribe/notify contract.
//!
//! Every mutating operation publishes the updated record here; any
//! component that needs the current user subscribes instead of reaching
//! for shared globals.

use crate::models::User;
use dashmap::DashMap;
use tokio::sync::watch;

/// Per-user publish/subscribe registry for the current record.
#[derive(Default)]
pub struct SessionRegistry {
    channels: DashMap<String, watch::Sender<Option<User>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish the latest record for a user to all subscribers.
    pub fn publish(&self, user: &User) {
        let sender = self
            .channels
            .entry(user.id.clone())
            .or_insert_with(|| watch::channel(None).0);
        let _ = sender.send_replace(Some(user.clone()));
    }

    /// Mark a user's session as ended (account deleted).
    pub fn clear(&self, user_id: &str) {
        if let Some(sender) = self.channels.get(user_id) {
            let _ = sender.send_replace(None);
        }
    }

    /// Subscribe to record changes for a user.
    ///
    /// The receiver starts with the most recently published record, or
    /// `None` if nothing has been published yet.
    pub fn subscribe(&self, user_id: &str) -> watch::Receiver<Option<User>> {
        self.channels
            .entry(user_id.to_string())
            .or_insert_with(|| watch::channel(None).0)
            .subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(id: &str, streak: u32) -> User {
        User {
            id: id.to_string(),
            full_name: None,
            streak,
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

    #[tokio::test]
    async fn subscriber_sees_published_record() {
        let registry = SessionRegistry::new();
        let mut rx = registry.subscribe("u1");
        assert!(rx.borrow().is_none());

        registry.publish(&user("u1", 3));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().as_ref().unwrap().streak, 3);
    }

    #[tokio::test]
    async fn publish_before_subscribe_is_visible() {
        let registry = SessionRegistry::new();
        registry.publish(&user("u1", 5));

        let rx = registry.subscribe("u1");
        assert_eq!(rx.borrow().as_ref().unwrap().streak, 5);
    }

    #[tokio::test]
    async fn clear_resets_to_none() {
        let registry = SessionRegistry::new();
        registry.publish(&user("u1", 2));
        registry.clear("u1");

        let rx = registry.subscribe("u1");
        assert!(rx.borrow().is_none());
    }

    #[tokio::test]
    async fn sessions_are_isolated_per_user() {
        let registry = SessionRegistry::new();
        registry.publish(&user("u1", 1));

        let rx = registry.subscribe("u2");
        assert!(rx.borrow().is_none());
    }
}
