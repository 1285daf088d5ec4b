// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! FCM client for silent daily-refresh pushes.
//!
//! Sends background-priority data messages through the FCM HTTP v1 API.
//! The message carries only the `dailyRefresh` marker: no user-visible
//! alert, just an instruction to run the daily update.

use crate::error::AppError;
use std::collections::HashSet;
use std::sync::Mutex;

const FCM_ENDPOINT: &str = "https://fcm.googleapis.com/v1";

/// FCM client wrapper. Supports a mock mode that records sends in memory
/// (offline tests) and can be told to fail specific tokens.
pub struct FcmClient {
    inner: FcmInner,
}

enum FcmInner {
    Real {
        http: reqwest::Client,
        project_id: String,
        token_generator: gcloud_sdk::GoogleAuthTokenGenerator,
    },
    Mock {
        sent: Mutex<Vec<String>>,
        fail_tokens: Mutex<HashSet<String>>,
    },
}

impl FcmClient {
    /// Create a client authenticated via application default credentials.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        let token_generator = gcloud_sdk::GoogleAuthTokenGenerator::new(
            gcloud_sdk::TokenSourceType::Default,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
        )
        .await
        .map_err(|e| AppError::Push(format!("Failed to initialize FCM credentials: {}", e)))?;

        Ok(Self {
            inner: FcmInner::Real {
                http: reqwest::Client::new(),
                project_id: project_id.to_string(),
                token_generator,
            },
        })
    }

    /// Create a mock client for testing (no network).
    pub fn new_mock() -> Self {
        Self {
            inner: FcmInner::Mock {
                sent: Mutex::new(Vec::new()),
                fail_tokens: Mutex::new(HashSet::new()),
            },
        }
    }

    /// Tokens the mock client should fail to deliver to (test builds).
    pub fn set_mock_fail_tokens<I, S>(&self, tokens: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let FcmInner::Mock { fail_tokens, .. } = &self.inner {
            let mut guard = fail_tokens.lock().unwrap();
            guard.clear();
            guard.extend(tokens.into_iter().map(Into::into));
        }
    }

    /// Tokens the mock client has recorded sends for (test builds).
    pub fn mock_sent(&self) -> Vec<String> {
        match &self.inner {
            FcmInner::Mock { sent, .. } => sent.lock().unwrap().clone(),
            FcmInner::Real { .. } => Vec::new(),
        }
    }

    /// Send the silent `dailyRefresh` signal to one device token.
    ///
    /// Best-effort: delivery is not acknowledged beyond the HTTP status.
    pub async fn send_daily_refresh(&self, device_token: &str) -> Result<(), AppError> {
        match &self.inner {
            FcmInner::Mock { sent, fail_tokens } => {
                if fail_tokens.lock().unwrap().contains(device_token) {
                    return Err(AppError::Push(format!(
                        "Mock delivery failure for token {}",
                        device_token
                    )));
                }
                sent.lock().unwrap().push(device_token.to_string());
                Ok(())
            }
            FcmInner::Real {
                http,
                project_id,
                token_generator,
            } => {
                let auth = token_generator
                    .create_token()
                    .await
                    .map_err(|e| AppError::Push(format!("Failed to mint FCM token: {}", e)))?;

                // Background push: content-available with no alert payload.
                let body = serde_json::json!({
                    "message": {
                        "token": device_token,
                        "data": { "dailyRefresh": "true" },
                        "apns": {
                            "headers": {
                                "apns-push-type": "background",
                                "apns-priority": "5"
                            },
                            "payload": {
                                "aps": { "content-available": 1 }
                            }
                        }
                    }
                });

                let url = format!("{}/projects/{}/messages:send", FCM_ENDPOINT, project_id);
                let response = http
                    .post(&url)
                    .header(reqwest::header::AUTHORIZATION, auth.header_value())
                    .json(&body)
                    .send()
                    .await
                    .map_err(|e| AppError::Push(format!("FCM request failed: {}", e)))?;

                let status = response.status();
                if !status.is_success() {
                    let detail = response.text().await.unwrap_or_default();
                    return Err(AppError::Push(format!(
                        "FCM send failed ({}): {}",
                        status, detail
                    )));
                }

                Ok(())
            }
        }
    }
}
