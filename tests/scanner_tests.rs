// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Midnight scanner dispatch tests.
//!
//! Runs the scanner's dispatch pass over in-memory records with the mock
//! push client, checking who gets the silent refresh push and who is
//! skipped, plus failure isolation across users.

use chrono::{TimeZone, Utc};
use yes_api::services::{FcmClient, MidnightScanner};

mod common;

fn scanner() -> MidnightScanner {
    MidnightScanner::new(common::test_db_offline(), FcmClient::new_mock())
}

/// 2025-06-10 00:30 UTC: local midnight for UTC users.
fn utc_midnight() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 10, 0, 30, 0).unwrap()
}

#[tokio::test]
async fn test_dispatches_exactly_at_local_midnight() {
    let scanner = scanner();
    let mut user = common::test_user("u1");
    user.fcm_token = Some("tok-1".to_string());
    user.timezone = Some("UTC".to_string());

    let outcome = scanner.dispatch_all(vec![user], utc_midnight()).await;

    assert_eq!(outcome.scanned, 1);
    assert_eq!(outcome.dispatched, 1);
    assert!(outcome.is_clean());
    assert_eq!(scanner.fcm().mock_sent(), vec!["tok-1"]);
}

#[tokio::test]
async fn test_skips_users_outside_midnight_hour() {
    let scanner = scanner();
    let mut user = common::test_user("u1");
    user.fcm_token = Some("tok-1".to_string());
    user.timezone = Some("UTC".to_string());

    let five_am = Utc.with_ymd_and_hms(2025, 6, 10, 5, 30, 0).unwrap();
    let outcome = scanner.dispatch_all(vec![user], five_am).await;

    assert_eq!(outcome.dispatched, 0);
    assert_eq!(outcome.skipped_not_midnight, 1);
    assert!(scanner.fcm().mock_sent().is_empty());
}

#[tokio::test]
async fn test_timezones_select_different_users() {
    let scanner = scanner();

    let mut utc_user = common::test_user("u-utc");
    utc_user.fcm_token = Some("tok-utc".to_string());
    utc_user.timezone = Some("UTC".to_string());

    // 00:30 UTC is 17:30 the previous day in Los Angeles.
    let mut la_user = common::test_user("u-la");
    la_user.fcm_token = Some("tok-la".to_string());
    la_user.timezone = Some("America/Los_Angeles".to_string());

    let outcome = scanner
        .dispatch_all(vec![utc_user, la_user], utc_midnight())
        .await;

    assert_eq!(outcome.dispatched, 1);
    assert_eq!(outcome.skipped_not_midnight, 1);
    assert_eq!(scanner.fcm().mock_sent(), vec!["tok-utc"]);
}

#[tokio::test]
async fn test_skips_users_without_credentials() {
    let scanner = scanner();

    let mut no_token = common::test_user("u1");
    no_token.fcm_token = None;
    no_token.timezone = Some("UTC".to_string());

    // The client writes "" when unset.
    let mut empty_token = common::test_user("u2");
    empty_token.fcm_token = Some("".to_string());
    empty_token.timezone = Some("UTC".to_string());

    let mut no_timezone = common::test_user("u3");
    no_timezone.fcm_token = Some("tok-3".to_string());
    no_timezone.timezone = None;

    let outcome = scanner
        .dispatch_all(vec![no_token, empty_token, no_timezone], utc_midnight())
        .await;

    assert_eq!(outcome.scanned, 3);
    assert_eq!(outcome.dispatched, 0);
    assert_eq!(outcome.skipped_missing_credentials, 3);
    assert!(scanner.fcm().mock_sent().is_empty());
}

#[tokio::test]
async fn test_skips_users_already_pushed_today() {
    let scanner = scanner();

    let mut user = common::test_user("u1");
    user.fcm_token = Some("tok-1".to_string());
    user.timezone = Some("UTC".to_string());
    user.last_refresh_push_date = Some("2025-06-10".to_string());

    let outcome = scanner.dispatch_all(vec![user], utc_midnight()).await;

    assert_eq!(outcome.dispatched, 0);
    assert_eq!(outcome.skipped_already_pushed, 1);
}

#[tokio::test]
async fn test_one_bad_token_does_not_abort_the_scan() {
    let scanner = scanner();
    scanner.fcm().set_mock_fail_tokens(["tok-bad"]);

    let mut good = common::test_user("u-good");
    good.fcm_token = Some("tok-good".to_string());
    good.timezone = Some("UTC".to_string());

    let mut bad = common::test_user("u-bad");
    bad.fcm_token = Some("tok-bad".to_string());
    bad.timezone = Some("UTC".to_string());

    let outcome = scanner.dispatch_all(vec![bad, good], utc_midnight()).await;

    assert_eq!(outcome.scanned, 2);
    assert_eq!(outcome.dispatched, 1);
    assert_eq!(outcome.failed, 1);
    assert!(!outcome.is_clean());
    assert_eq!(scanner.fcm().mock_sent(), vec!["tok-good"]);
}
